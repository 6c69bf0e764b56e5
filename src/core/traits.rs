//! Core traits for ledger storage and the account/payee collaborators
//!
//! The ledger only needs three capabilities from the outside world: a store that
//! can append records atomically, a way to look up account holders, and a way
//! to look up payees and their approval state. Each is a trait so the service can
//! be handed any implementation at construction time.

use std::future::Future;

use crate::types::{
    AccountId, LedgerError, NewPayee, NewUser, Payee, PayeeId, PayeeStatus, TransactionRecord,
    User, UserUpdate,
};

/// Append-only ledger storage
///
/// Implementations must give read-committed isolation: a read observes every
/// unit committed before it started and nothing from a unit still being written.
pub trait LedgerStore: Send + Sync + 'static {
    /// Append a group of records as one all-or-nothing unit
    ///
    /// Either every record becomes visible to readers, or none does. On error
    /// the store is left exactly as it was.
    fn atomic_append(
        &self,
        records: Vec<TransactionRecord>,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Append a single record
    fn append(
        &self,
        record: TransactionRecord,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send {
        self.atomic_append(vec![record])
    }

    /// All records owned by an account, in append order
    fn records_for(
        &self,
        account: AccountId,
    ) -> impl Future<Output = Result<Vec<TransactionRecord>, LedgerError>> + Send;

    /// Every record in the ledger, in append order
    fn all_records(&self) -> impl Future<Output = Result<Vec<TransactionRecord>, LedgerError>> + Send;
}

/// Account holder lookup and registration
pub trait UserDirectory: Send + Sync {
    /// Register a new user; usernames are unique
    fn register(&self, new: NewUser) -> Result<User, LedgerError>;

    /// Look up a user by account id
    fn find_by_id(&self, id: AccountId) -> Option<User>;

    /// Apply a partial profile update
    fn update(&self, id: AccountId, update: UserUpdate) -> Result<User, LedgerError>;

    /// All users, oldest registration first
    fn all(&self) -> Vec<User>;
}

/// Payee lookup and approval
pub trait PayeeDirectory: Send + Sync {
    /// Register a new `Pending` payee; account numbers are unique
    fn register(&self, new: NewPayee) -> Result<Payee, LedgerError>;

    /// Look up a payee regardless of status
    fn find_by_id(&self, id: PayeeId) -> Option<Payee>;

    /// Look up a payee only if it is approved
    fn find_approved(&self, id: PayeeId) -> Option<Payee> {
        self.find_by_id(id).filter(Payee::is_approved)
    }

    /// Payees owned by an account
    fn owned_by(&self, owner: AccountId) -> Vec<Payee>;

    /// Payees in the given state
    fn with_status(&self, status: PayeeStatus) -> Vec<Payee>;

    /// Move a payee to a new approval state
    fn set_status(&self, id: PayeeId, status: PayeeStatus) -> Result<Payee, LedgerError>;
}
