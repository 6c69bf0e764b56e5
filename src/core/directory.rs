//! Thread-safe in-memory user and payee directories
//!
//! These are the collaborators the ledger consults for account holders and
//! payee approval. Both use `DashMap` so lookups from concurrent requests only
//! contend when they touch the same entry.
//!
//! # Uniqueness
//!
//! Usernames and payee account numbers are unique. Each directory keeps a
//! secondary `DashMap` index keyed by the unique field and claims the key
//! through the entry API, so two concurrent registrations of the same key
//! cannot both succeed.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::info;

use super::traits::{PayeeDirectory, UserDirectory};
use crate::types::{
    AccountId, LedgerError, NewPayee, NewUser, Payee, PayeeId, PayeeStatus, User, UserUpdate,
};

fn require(field: &str, value: &str) -> Result<(), LedgerError> {
    if value.trim().is_empty() {
        Err(LedgerError::invalid_request(format!("{} is required", field)))
    } else {
        Ok(())
    }
}

/// In-memory account holder directory
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: DashMap<AccountId, User>,
    usernames: DashMap<String, AccountId>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn register(&self, mut new: NewUser) -> Result<User, LedgerError> {
        require("name", &new.name)?;
        require("email", &new.email)?;
        require("username", &new.username)?;
        new.username = new.username.trim().to_string();

        let user = User::register(new);
        match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => {
                return Err(LedgerError::invalid_request(format!(
                    "username '{}' already exists",
                    user.username
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id);
            }
        }
        self.users.insert(user.id, user.clone());

        info!(user = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    fn find_by_id(&self, id: AccountId) -> Option<User> {
        self.users.get(&id).map(|entry| entry.value().clone())
    }

    fn update(&self, id: AccountId, mut update: UserUpdate) -> Result<User, LedgerError> {
        let mut entry = self
            .users
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("User", id))?;
        let user = entry.value_mut();

        update.username = update.username.map(|u| u.trim().to_string());
        if let Some(username) = update.username.as_deref() {
            require("username", username)?;
            if username != user.username {
                match self.usernames.entry(username.to_string()) {
                    Entry::Occupied(_) => {
                        return Err(LedgerError::invalid_request(format!(
                            "username '{}' already exists",
                            username
                        )))
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(id);
                    }
                }
                self.usernames.remove(&user.username);
            }
        }

        user.apply(update);
        Ok(user.clone())
    }

    fn all(&self) -> Vec<User> {
        let mut users: Vec<User> = self
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        users.sort_by_key(|user| (user.created_at, user.id));
        users
    }
}

/// In-memory payee directory
#[derive(Debug, Default)]
pub struct InMemoryPayeeDirectory {
    payees: DashMap<PayeeId, Payee>,
    account_numbers: DashMap<String, PayeeId>,
}

impl InMemoryPayeeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect<F>(&self, keep: F) -> Vec<Payee>
    where
        F: Fn(&Payee) -> bool,
    {
        let mut payees: Vec<Payee> = self
            .payees
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        payees.sort_by_key(|payee| (payee.created_at, payee.id));
        payees
    }
}

impl PayeeDirectory for InMemoryPayeeDirectory {
    fn register(&self, new: NewPayee) -> Result<Payee, LedgerError> {
        require("customerName", &new.customer_name)?;
        require("bankName", &new.bank_name)?;
        require("accountNumber", &new.account_number)?;
        require("ifscCode", &new.ifsc_code)?;

        let payee = Payee::register(new);
        match self.account_numbers.entry(payee.account_number.clone()) {
            Entry::Occupied(_) => {
                return Err(LedgerError::invalid_request(format!(
                    "a payee with account number '{}' already exists",
                    payee.account_number
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(payee.id);
            }
        }
        self.payees.insert(payee.id, payee.clone());

        info!(payee = %payee.id, owner = %payee.user_id, "payee registered, pending approval");
        Ok(payee)
    }

    fn find_by_id(&self, id: PayeeId) -> Option<Payee> {
        self.payees.get(&id).map(|entry| entry.value().clone())
    }

    fn owned_by(&self, owner: AccountId) -> Vec<Payee> {
        self.collect(|payee| payee.user_id == owner)
    }

    fn with_status(&self, status: PayeeStatus) -> Vec<Payee> {
        self.collect(|payee| payee.status == status)
    }

    fn set_status(&self, id: PayeeId, status: PayeeStatus) -> Result<Payee, LedgerError> {
        let mut entry = self
            .payees
            .get_mut(&id)
            .ok_or_else(|| LedgerError::not_found("Payee", id))?;
        let payee = entry.value_mut();

        if !payee.status.can_become(status) {
            return Err(LedgerError::invalid_request(format!(
                "payee {} is {} and cannot become {}",
                id, payee.status, status
            )));
        }
        payee.status = status;

        info!(payee = %id, status = %status, "payee status changed");
        Ok(payee.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;
    use std::thread;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            phone: "555-0100".to_string(),
            username: username.to_string(),
        }
    }

    fn new_payee(owner: AccountId, account_number: &str) -> NewPayee {
        NewPayee {
            user_id: owner,
            customer_name: "Bob".to_string(),
            bank_name: "First Bank".to_string(),
            account_number: account_number.to_string(),
            ifsc_code: "FBNK0001".to_string(),
        }
    }

    #[test]
    fn test_register_and_find_user() {
        let users = InMemoryUserDirectory::new();
        let user = users.register(new_user("alice")).unwrap();

        assert_eq!(users.find_by_id(user.id), Some(user));
        assert!(users.find_by_id(AccountId::new()).is_none());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let users = InMemoryUserDirectory::new();
        users.register(new_user("alice")).unwrap();

        let result = users.register(new_user("alice"));
        assert!(matches!(result, Err(LedgerError::InvalidRequest { .. })));
        assert_eq!(users.all().len(), 1);
    }

    #[test]
    fn test_missing_username_rejected() {
        let users = InMemoryUserDirectory::new();
        let result = users.register(new_user("  "));
        assert!(matches!(result, Err(LedgerError::InvalidRequest { .. })));
    }

    #[test]
    fn test_update_renames_and_frees_old_username() {
        let users = InMemoryUserDirectory::new();
        let user = users.register(new_user("alice")).unwrap();

        let updated = users
            .update(
                user.id,
                UserUpdate {
                    username: Some("alice2".to_string()),
                    ..UserUpdate::default()
                },
            )
            .unwrap();

        assert_eq!(updated.username, "alice2");
        assert!(users.register(new_user("alice")).is_ok());
        assert!(users.register(new_user("alice2")).is_err());
    }

    #[test]
    fn test_update_trims_username() {
        let users = InMemoryUserDirectory::new();
        let user = users.register(new_user("alice")).unwrap();

        let updated = users
            .update(
                user.id,
                UserUpdate {
                    username: Some("  alice2  ".to_string()),
                    ..UserUpdate::default()
                },
            )
            .unwrap();

        assert_eq!(updated.username, "alice2");
        assert!(users.register(new_user("alice2")).is_err());

        let unchanged = users
            .update(
                user.id,
                UserUpdate {
                    username: Some(" alice2".to_string()),
                    ..UserUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(unchanged.username, "alice2");
        assert!(users.register(new_user(" alice2 ")).is_err());
    }

    #[test]
    fn test_update_unknown_user() {
        let users = InMemoryUserDirectory::new();
        let result = users.update(AccountId::new(), UserUpdate::default());
        assert!(matches!(result, Err(LedgerError::NotFound { .. })));
    }

    #[test]
    fn test_concurrent_same_username_only_one_wins() {
        let users = Arc::new(InMemoryUserDirectory::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let users = Arc::clone(&users);
                thread::spawn(move || users.register(new_user("race")).is_ok())
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn test_payee_lifecycle() {
        let payees = InMemoryPayeeDirectory::new();
        let owner = AccountId::new();
        let payee = payees.register(new_payee(owner, "0001")).unwrap();

        assert_eq!(payee.status, PayeeStatus::Pending);
        assert!(payees.find_approved(payee.id).is_none());
        assert_eq!(payees.with_status(PayeeStatus::Pending).len(), 1);

        let approved = payees.set_status(payee.id, PayeeStatus::Approved).unwrap();
        assert!(approved.is_approved());
        assert_eq!(payees.find_approved(payee.id), Some(approved));
        assert!(payees.with_status(PayeeStatus::Pending).is_empty());
        assert_eq!(payees.owned_by(owner).len(), 1);
    }

    #[rstest]
    #[case::approve_twice(PayeeStatus::Approved, PayeeStatus::Approved)]
    #[case::approve_rejected(PayeeStatus::Rejected, PayeeStatus::Approved)]
    fn test_final_states_cannot_change(#[case] first: PayeeStatus, #[case] second: PayeeStatus) {
        let payees = InMemoryPayeeDirectory::new();
        let payee = payees.register(new_payee(AccountId::new(), "0001")).unwrap();
        payees.set_status(payee.id, first).unwrap();

        let result = payees.set_status(payee.id, second);
        assert!(matches!(result, Err(LedgerError::InvalidRequest { .. })));
    }

    #[test]
    fn test_duplicate_account_number_rejected() {
        let payees = InMemoryPayeeDirectory::new();
        payees.register(new_payee(AccountId::new(), "0001")).unwrap();

        let result = payees.register(new_payee(AccountId::new(), "0001"));
        assert!(matches!(result, Err(LedgerError::InvalidRequest { .. })));
    }

    #[test]
    fn test_set_status_unknown_payee() {
        let payees = InMemoryPayeeDirectory::new();
        let result = payees.set_status(PayeeId::new(), PayeeStatus::Approved);
        assert!(matches!(result, Err(LedgerError::NotFound { .. })));
    }
}
