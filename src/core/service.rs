//! Ledger service: deposits, withdrawals, transfers and ledger queries
//!
//! This module provides `LedgerService`, which validates money movements and
//! appends them to a `LedgerStore`, and answers balance and history queries.
//!
//! # Architecture
//!
//! ```text
//! LedgerService
//!     ├── Arc<S: LedgerStore>         (append-only records, the only shared state)
//!     ├── BalanceCalculator<S>        (read-only balance fold)
//!     ├── AccountLocks                (per-account check-then-append exclusion)
//!     ├── Arc<dyn UserDirectory>      (account holder lookup)
//!     └── Arc<dyn PayeeDirectory>     (payee approval lookup)
//! ```
//!
//! # Consistency
//!
//! - Every mutation either appends all of its records or none.
//! - A withdrawal or transfer holds the debited account's lock from the balance
//!   check until its records are appended, so concurrent debits cannot overdraw.
//! - Every store call and lock wait is bounded by `ServiceConfig::store_timeout`.
//!
//! # Logging
//!
//! Validation failures are expected and logged at `debug`. Storage failures,
//! timeouts and failed transfers are logged at `error` with the account, amount
//! and (for transfers) the attempt id.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::account_locks::AccountLocks;
use super::balance::{BalanceCalculator, BalancePolicy};
use super::traits::{LedgerStore, PayeeDirectory, UserDirectory};
use crate::types::{
    validate_amount, AccountId, HistoryFilter, LedgerError, NewPayee, Payee, PayeeId,
    PayeeStatus, TransactionId, TransactionKind, TransactionRecord, User,
};

/// Service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Upper bound for every store call and account lock wait
    pub store_timeout: Duration,
    /// Whether received transfers count toward balance
    pub balance_policy: BalancePolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(5000),
            balance_policy: BalancePolicy::CreditInbound,
        }
    }
}

impl ServiceConfig {
    /// Create a ServiceConfig, replacing a zero timeout with the default
    pub fn new(store_timeout: Duration, balance_policy: BalancePolicy) -> Self {
        let default = Self::default();

        let store_timeout = if store_timeout.is_zero() {
            warn!(
                default_ms = default.store_timeout.as_millis() as u64,
                "invalid store timeout 0ms, using default"
            );
            default.store_timeout
        } else {
            store_timeout
        };

        Self {
            store_timeout,
            balance_policy,
        }
    }
}

/// Steps of a single transfer attempt
///
/// `Started → PayeeValidated → FundsValidated → BothRecordsWritten → Committed`,
/// or `RolledBack` from any step before `Committed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStage {
    Started,
    PayeeValidated,
    FundsValidated,
    BothRecordsWritten,
    Committed,
    RolledBack,
}

/// Result of a successful withdrawal
#[derive(Debug, Clone, PartialEq)]
pub struct WithdrawalReceipt {
    pub transaction: TransactionRecord,
    pub balance: Decimal,
}

/// Result of a successful transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    /// Id of the sender's `transfer-out` record
    pub transaction_id: TransactionId,
    pub amount: Decimal,
    /// Sender's balance after the transfer
    pub balance: Decimal,
}

/// Payee fields shown next to a record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayeeSummary {
    pub id: PayeeId,
    pub customer_name: String,
    pub account_number: String,
}

impl From<&Payee> for PayeeSummary {
    fn from(payee: &Payee) -> Self {
        PayeeSummary {
            id: payee.id,
            customer_name: payee.customer_name.clone(),
            account_number: payee.account_number.clone(),
        }
    }
}

/// User fields shown next to a record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: AccountId,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Record with its payee reference expanded
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub record: TransactionRecord,
    pub payee: Option<PayeeSummary>,
}

/// Record with its owner and payee references expanded
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub record: TransactionRecord,
    pub user: Option<UserSummary>,
    pub payee: Option<PayeeSummary>,
}

/// Count and summed amount of one record kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KindStats {
    pub count: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub volume: Decimal,
}

/// Aggregate figures for the admin dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub users: usize,
    pub pending_payees: usize,
    pub transactions: u64,
    pub by_kind: BTreeMap<TransactionKind, KindStats>,
}

/// Ledger operations over an injected store and collaborators
pub struct LedgerService<S> {
    store: Arc<S>,
    balances: BalanceCalculator<S>,
    locks: AccountLocks,
    users: Arc<dyn UserDirectory>,
    payees: Arc<dyn PayeeDirectory>,
    config: ServiceConfig,
}

impl<S> std::fmt::Debug for LedgerService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: LedgerStore> LedgerService<S> {
    /// Create a service over the given store and collaborators
    pub fn new(
        store: Arc<S>,
        users: Arc<dyn UserDirectory>,
        payees: Arc<dyn PayeeDirectory>,
        config: ServiceConfig,
    ) -> Self {
        let balances = BalanceCalculator::new(
            Arc::clone(&store),
            config.balance_policy,
            config.store_timeout,
        );
        Self {
            store,
            balances,
            locks: AccountLocks::new(),
            users,
            payees,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn users(&self) -> &dyn UserDirectory {
        self.users.as_ref()
    }

    pub fn payees(&self) -> &dyn PayeeDirectory {
        self.payees.as_ref()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Run a store call under the configured timeout
    async fn timed<T, F>(&self, operation: &str, call: F) -> Result<T, LedgerError>
    where
        F: Future<Output = Result<T, LedgerError>>,
    {
        tokio::time::timeout(self.config.store_timeout, call)
            .await
            .map_err(|_| {
                LedgerError::timeout(operation, self.config.store_timeout.as_millis() as u64)
            })?
    }

    fn require_account(&self, account: AccountId) -> Result<User, LedgerError> {
        self.users
            .find_by_id(account)
            .ok_or_else(|| LedgerError::not_found("User", account))
    }

    /// Current balance of `account`
    ///
    /// Unknown accounts and accounts without history have balance zero.
    pub async fn balance(&self, account: AccountId) -> Result<Decimal, LedgerError> {
        self.balances.compute_balance(account).await
    }

    /// Credit `amount` to `account`
    ///
    /// # Returns
    ///
    /// * `Ok(Decimal)` - The recomputed balance after the deposit
    /// * `Err(LedgerError::InvalidAmount)` - If the amount is not positive or too precise
    /// * `Err(LedgerError::NotFound)` - If the account does not exist
    /// * `Err(LedgerError::ArithmeticOverflow)` - If the new balance is not representable
    /// * `Err(LedgerError::StorageError | Timeout)` - If the record was not written
    pub async fn deposit(&self, account: AccountId, amount: Decimal) -> Result<Decimal, LedgerError> {
        let result = self.try_deposit(account, amount).await;
        self.report("deposit", account, amount, &result);
        result
    }

    async fn try_deposit(&self, account: AccountId, amount: Decimal) -> Result<Decimal, LedgerError> {
        let amount = validate_amount(amount)?;
        self.require_account(account)?;

        let expected = self
            .balance(account)
            .await?
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("deposit", account))?;

        let record = TransactionRecord::deposit(account, amount);
        let id = record.id;
        self.timed("ledger append", self.store.append(record)).await?;
        info!(account = %account, transaction = %id, amount = %amount, "deposit recorded");

        Ok(self.balance_after_commit(account, expected).await)
    }

    /// Debit `amount` from `account` if the current balance covers it
    ///
    /// # Returns
    ///
    /// * `Ok(WithdrawalReceipt)` - The new record and the recomputed balance
    /// * `Err(LedgerError::InvalidAmount)` - If the amount is not positive or too precise
    /// * `Err(LedgerError::NotFound)` - If the account does not exist
    /// * `Err(LedgerError::InsufficientFunds)` - If the balance is below `amount`
    /// * `Err(LedgerError::StorageError | Timeout)` - If the record was not written
    pub async fn withdraw(
        &self,
        account: AccountId,
        amount: Decimal,
        reason: Option<String>,
    ) -> Result<WithdrawalReceipt, LedgerError> {
        let result = self.try_withdraw(account, amount, reason).await;
        self.report("withdrawal", account, amount, &result);
        result
    }

    async fn try_withdraw(
        &self,
        account: AccountId,
        amount: Decimal,
        reason: Option<String>,
    ) -> Result<WithdrawalReceipt, LedgerError> {
        let amount = validate_amount(amount)?;
        self.require_account(account)?;
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let guard = self
            .locks
            .acquire(account, self.config.store_timeout)
            .await?;

        let balance = self.balance(account).await?;
        if balance < amount {
            return Err(LedgerError::insufficient_funds(account, balance, amount));
        }

        let record = TransactionRecord::withdrawal(account, amount, reason);
        self.timed("ledger append", self.store.append(record.clone()))
            .await?;
        drop(guard);
        info!(account = %account, transaction = %record.id, amount = %amount, "withdrawal recorded");

        let balance = self
            .balance_after_commit(account, balance - amount)
            .await;
        Ok(WithdrawalReceipt {
            transaction: record,
            balance,
        })
    }

    /// Move `amount` from `sender` to the account behind an approved payee
    ///
    /// Writes a `transfer-out` on the sender and a `transfer-in` on the payee's
    /// account as one atomic unit.
    ///
    /// # Returns
    ///
    /// * `Ok(TransferReceipt)` - The `transfer-out` id and the sender's new balance
    /// * `Err(LedgerError::InvalidAmount)` - If the amount is not positive or too precise
    /// * `Err(LedgerError::NotFound)` - If the sender does not exist
    /// * `Err(LedgerError::PayeeNotApproved)` - If the payee is unknown or not approved
    /// * `Err(LedgerError::InvalidRequest)` - If the payee pays into the sender's own
    ///   account and inbound transfers are credited
    /// * `Err(LedgerError::InsufficientFunds)` - If the sender's balance is below `amount`
    /// * `Err(LedgerError::TransferFailed)` - If the write failed; neither record exists
    pub async fn transfer(
        &self,
        sender: AccountId,
        payee: PayeeId,
        amount: Decimal,
    ) -> Result<TransferReceipt, LedgerError> {
        let attempt = Uuid::new_v4();
        let result = self.try_transfer(attempt, sender, payee, amount).await;
        self.report("transfer", sender, amount, &result);
        result
    }

    async fn try_transfer(
        &self,
        attempt: Uuid,
        sender: AccountId,
        payee_id: PayeeId,
        amount: Decimal,
    ) -> Result<TransferReceipt, LedgerError> {
        let mark = |stage: TransferStage| {
            debug!(attempt = %attempt, sender = %sender, payee = %payee_id, ?stage, "transfer stage");
        };
        mark(TransferStage::Started);

        let validated = async {
            let amount = validate_amount(amount)?;
            self.require_account(sender)?;

            let payee = self
                .payees
                .find_approved(payee_id)
                .ok_or_else(|| LedgerError::payee_not_approved(payee_id))?;
            // A credited transfer-in on the sender's own account cancels the debit.
            if payee.user_id == sender && self.config.balance_policy == BalancePolicy::CreditInbound
            {
                return Err(LedgerError::invalid_request(
                    "cannot transfer to a payee that pays into the sender's own account",
                ));
            }
            mark(TransferStage::PayeeValidated);

            let guard = self
                .locks
                .acquire(sender, self.config.store_timeout)
                .await?;
            let balance = self.balance(sender).await?;
            if balance < amount {
                return Err(LedgerError::insufficient_funds(sender, balance, amount));
            }
            mark(TransferStage::FundsValidated);

            Ok::<_, LedgerError>((amount, payee, balance, guard))
        }
        .await;

        let (amount, payee, before, guard) = match validated {
            Ok(validated) => validated,
            Err(e) => {
                mark(TransferStage::RolledBack);
                return Err(e);
            }
        };

        let (out, inbound) = TransactionRecord::transfer_pair(sender, &payee, amount);
        let out_id = out.id;
        let in_id = inbound.id;

        if let Err(cause) = self
            .timed("transfer append", self.store.atomic_append(vec![out, inbound]))
            .await
        {
            mark(TransferStage::RolledBack);
            return Err(LedgerError::transfer_failed(attempt, cause));
        }
        mark(TransferStage::BothRecordsWritten);
        drop(guard);
        mark(TransferStage::Committed);

        info!(
            attempt = %attempt,
            sender = %sender,
            receiver = %payee.user_id,
            transfer_out = %out_id,
            transfer_in = %in_id,
            amount = %amount,
            "transfer committed"
        );

        let balance = self.balance_after_commit(sender, before - amount).await;
        Ok(TransferReceipt {
            transaction_id: out_id,
            amount,
            balance,
        })
    }

    /// Balance of `account` once its write is committed
    ///
    /// The write already happened, so a failed recompute is retried once and
    /// then answered with `expected` instead of an error.
    async fn balance_after_commit(&self, account: AccountId, expected: Decimal) -> Decimal {
        match self.balance(account).await {
            Ok(balance) => return balance,
            Err(e) => {
                warn!(account = %account, error = %e, "balance recompute after commit failed, retrying");
            }
        }
        match self.balance(account).await {
            Ok(balance) => balance,
            Err(e) => {
                error!(
                    account = %account,
                    expected = %expected,
                    error = %e,
                    "balance recompute after commit failed, reporting expected balance"
                );
                expected
            }
        }
    }

    /// Log the outcome of a mutation
    ///
    /// Expected failures stay at `debug`; anything else is an incident.
    fn report<T>(
        &self,
        operation: &str,
        account: AccountId,
        amount: Decimal,
        result: &Result<T, LedgerError>,
    ) {
        match result {
            Ok(_) => {}
            Err(e) if e.is_user_facing() => {
                debug!(operation, account = %account, amount = %amount, error = %e, "rejected");
            }
            Err(LedgerError::TransferFailed { attempt, cause }) => {
                error!(
                    operation,
                    account = %account,
                    amount = %amount,
                    attempt = %attempt,
                    error = %cause,
                    "transfer rolled back"
                );
            }
            Err(e) => {
                error!(operation, account = %account, amount = %amount, error = %e, "ledger operation failed");
            }
        }
    }

    /// Register a payee owned by an existing account
    pub fn register_payee(&self, new: NewPayee) -> Result<Payee, LedgerError> {
        if self.users.find_by_id(new.user_id).is_none() {
            return Err(LedgerError::invalid_request(format!(
                "user {} does not exist",
                new.user_id
            )));
        }
        self.payees.register(new)
    }

    /// Completed records of `account` that pass `filter`, newest first
    ///
    /// `transfer-out` records carry the paid payee's name and account number.
    pub async fn history(
        &self,
        account: AccountId,
        filter: &HistoryFilter,
    ) -> Result<Vec<HistoryEntry>, LedgerError> {
        let records = self
            .timed("history read", self.store.records_for(account))
            .await?;

        Ok(newest_first(records)
            .into_iter()
            .filter(|record| filter.matches(record))
            .map(|record| {
                let payee = self.payee_summary(&record);
                HistoryEntry { record, payee }
            })
            .collect())
    }

    /// Every record in the ledger, newest first, with owner and payee expanded
    pub async fn all_transactions(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let records = self.timed("ledger read", self.store.all_records()).await?;

        Ok(newest_first(records)
            .into_iter()
            .map(|record| {
                let user = self
                    .users
                    .find_by_id(record.owner)
                    .as_ref()
                    .map(UserSummary::from);
                let payee = self.payee_summary(&record);
                LedgerEntry {
                    record,
                    user,
                    payee,
                }
            })
            .collect())
    }

    /// Aggregate counts and volumes across the whole ledger
    pub async fn stats(&self) -> Result<LedgerStats, LedgerError> {
        let records = self.timed("ledger read", self.store.all_records()).await?;

        let mut by_kind: BTreeMap<TransactionKind, KindStats> = TransactionKind::ALL
            .into_iter()
            .map(|kind| (kind, KindStats::default()))
            .collect();
        let mut transactions = 0u64;

        for record in records.iter().filter(|record| record.is_completed()) {
            let stats = by_kind.entry(record.kind).or_default();
            stats.count += 1;
            stats.volume = stats
                .volume
                .checked_add(record.amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("stats", record.owner))?;
            transactions += 1;
        }

        Ok(LedgerStats {
            users: self.users.all().len(),
            pending_payees: self.payees.with_status(PayeeStatus::Pending).len(),
            transactions,
            by_kind,
        })
    }

    fn payee_summary(&self, record: &TransactionRecord) -> Option<PayeeSummary> {
        record
            .payee_id
            .and_then(|id| self.payees.find_by_id(id))
            .as_ref()
            .map(PayeeSummary::from)
    }
}

/// Sort newest first; records with equal timestamps keep reverse append order
fn newest_first(mut records: Vec<TransactionRecord>) -> Vec<TransactionRecord> {
    records.reverse();
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records
}
