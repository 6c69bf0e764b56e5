//! In-memory ledger store with an optional journal
//!
//! This module provides `InMemoryLedgerStore`, the append-only record store the
//! ledger service reads balances from and writes money movements to.
//!
//! # Design
//!
//! All records live in one `Vec` guarded by a `tokio::sync::RwLock`, with a
//! per-account index of positions. Readers share the lock; an append takes it
//! exclusively for the whole unit. Records of a unit are staged first and only
//! pushed once every staged write (and the journal line, if a journal is open)
//! has succeeded, so readers observe a unit entirely or not at all.
//!
//! # Durability
//!
//! When opened with a journal path, every unit is written to the journal before
//! it becomes visible in memory, and the journal is replayed on the next open.
//!
//! # Fault injection
//!
//! A `WriteHook` sees every staged record with its position in the unit and may
//! fail it. Failing the second record of a transfer exercises the rollback path
//! exactly as a failed second insert would.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::RwLock;
use tracing::debug;

use super::journal::Journal;
use super::traits::LedgerStore;
use crate::types::{AccountId, LedgerError, TransactionId, TransactionRecord};

/// Run blocking journal I/O from async code
///
/// On a multi-thread runtime the worker hands its other tasks off for the
/// duration of the call. A current-thread runtime cannot do that, so the call
/// runs inline there.
fn blocking_io<T>(io: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(io)
        }
        _ => io(),
    }
}

/// Per-record write interceptor
///
/// Called with the record's index inside its unit. Returning an error aborts
/// the whole unit.
pub type WriteHook = Arc<dyn Fn(usize, &TransactionRecord) -> Result<(), LedgerError> + Send + Sync>;

#[derive(Debug, Default)]
struct LedgerState {
    /// Every committed record in append order
    records: Vec<TransactionRecord>,

    /// Positions in `records` per owning account
    by_account: HashMap<AccountId, Vec<usize>>,

    /// Ids of every committed record
    ids: HashSet<TransactionId>,

    journal: Option<Journal>,
}

impl LedgerState {
    fn push(&mut self, record: TransactionRecord) {
        let position = self.records.len();
        self.by_account.entry(record.owner).or_default().push(position);
        self.ids.insert(record.id);
        self.records.push(record);
    }
}

/// Append-only ledger store
///
/// # Thread Safety
///
/// All methods take `&self` and are safe to call from many tasks at once.
/// Reads run in parallel with each other and wait only for a unit currently
/// being committed.
pub struct InMemoryLedgerStore {
    state: RwLock<LedgerState>,
    write_hook: Option<WriteHook>,
}

impl InMemoryLedgerStore {
    /// Create an empty store with no journal
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            write_hook: None,
        }
    }

    /// Open a store, replaying the journal at `journal` if one is given
    ///
    /// # Returns
    ///
    /// * `Ok(InMemoryLedgerStore)` - With every journaled record loaded
    /// * `Err(LedgerError::StorageError)` - If the journal cannot be opened or
    ///   replayed
    pub fn open(journal: Option<&Path>) -> Result<Self, LedgerError> {
        let mut state = LedgerState::default();

        if let Some(path) = journal {
            let (journal, records) = Journal::open(path)?;
            for record in records {
                state.push(record);
            }
            state.journal = Some(journal);
        }

        Ok(Self {
            state: RwLock::new(state),
            write_hook: None,
        })
    }

    /// Install a write hook
    pub fn with_write_hook(mut self, hook: WriteHook) -> Self {
        self.write_hook = Some(hook);
        self
    }

    /// Flush and sync the journal
    ///
    /// The store stays usable afterwards; closing only guarantees that
    /// everything committed so far is on disk.
    pub async fn close(&self) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        if let Some(journal) = state.journal.as_mut() {
            blocking_io(|| journal.sync())?;
            debug!(path = %journal.path().display(), "journal synced");
        }
        Ok(())
    }

    /// Number of committed records
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Validate and stage a unit without touching committed state
    fn stage(
        &self,
        state: &LedgerState,
        records: Vec<TransactionRecord>,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        let mut staged: Vec<TransactionRecord> = Vec::with_capacity(records.len());

        for (index, record) in records.into_iter().enumerate() {
            if state.ids.contains(&record.id) || staged.iter().any(|r| r.id == record.id) {
                return Err(LedgerError::storage(format!(
                    "duplicate transaction id {}",
                    record.id
                )));
            }
            if !record.is_completed() {
                return Err(LedgerError::storage(format!(
                    "refusing to persist non-completed record {}",
                    record.id
                )));
            }
            if let Some(hook) = &self.write_hook {
                hook(index, &record)?;
            }
            staged.push(record);
        }

        Ok(staged)
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryLedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedgerStore")
            .field("write_hook", &self.write_hook.is_some())
            .finish_non_exhaustive()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    async fn atomic_append(&self, records: Vec<TransactionRecord>) -> Result<(), LedgerError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write().await;
        let staged = self.stage(&state, records)?;

        if let Some(journal) = state.journal.as_mut() {
            blocking_io(|| journal.write_unit(&staged))?;
        }

        let count = staged.len();
        for record in staged {
            state.push(record);
        }
        debug!(records = count, total = state.records.len(), "unit committed");

        Ok(())
    }

    async fn records_for(&self, account: AccountId) -> Result<Vec<TransactionRecord>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .by_account
            .get(&account)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&position| state.records[position].clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn all_records(&self) -> Result<Vec<TransactionRecord>, LedgerError> {
        Ok(self.state.read().await.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewPayee, Payee, PayeeStatus, TransactionKind, TransactionStatus};
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    fn payee_for(owner: AccountId) -> Payee {
        let mut payee = Payee::register(NewPayee {
            user_id: owner,
            customer_name: "Bob".to_string(),
            bank_name: "First Bank".to_string(),
            account_number: "0001".to_string(),
            ifsc_code: "FBNK0001".to_string(),
        });
        payee.status = PayeeStatus::Approved;
        payee
    }

    fn fail_at(position: usize) -> WriteHook {
        Arc::new(move |index, _record| {
            if index == position {
                Err(LedgerError::storage("injected write failure"))
            } else {
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn test_append_and_read_back() {
        let store = InMemoryLedgerStore::new();
        let account = AccountId::new();
        let record = TransactionRecord::deposit(account, Decimal::new(10000, 2));

        store.append(record.clone()).await.unwrap();

        assert_eq!(store.records_for(account).await.unwrap(), vec![record]);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_account_has_no_records() {
        let store = InMemoryLedgerStore::new();
        assert!(store.records_for(AccountId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_records_are_indexed_per_account() {
        let store = InMemoryLedgerStore::new();
        let a = AccountId::new();
        let b = AccountId::new();
        let (out, inbound) = TransactionRecord::transfer_pair(a, &payee_for(b), Decimal::new(100, 2));

        store.atomic_append(vec![out.clone(), inbound.clone()]).await.unwrap();

        assert_eq!(store.records_for(a).await.unwrap(), vec![out]);
        assert_eq!(store.records_for(b).await.unwrap(), vec![inbound]);
        assert_eq!(store.all_records().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_second_write_rolls_back_unit() {
        let store = InMemoryLedgerStore::new().with_write_hook(fail_at(1));
        let a = AccountId::new();
        let b = AccountId::new();
        let (out, inbound) = TransactionRecord::transfer_pair(a, &payee_for(b), Decimal::new(100, 2));

        let result = store.atomic_append(vec![out, inbound]).await;

        assert!(matches!(result, Err(LedgerError::StorageError { .. })));
        assert!(store.is_empty().await);
        assert!(store.records_for(a).await.unwrap().is_empty());
        assert!(store.records_for(b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let store = InMemoryLedgerStore::new();
        let record = TransactionRecord::deposit(AccountId::new(), Decimal::new(100, 2));

        store.append(record.clone()).await.unwrap();
        let result = store.append(record).await;

        assert!(matches!(result, Err(LedgerError::StorageError { .. })));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_non_completed_record_is_rejected() {
        let store = InMemoryLedgerStore::new();
        let mut record = TransactionRecord::deposit(AccountId::new(), Decimal::new(100, 2));
        record.status = TransactionStatus::Failed;

        assert!(store.append(record).await.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_journal_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.journal");
        let account = AccountId::new();

        {
            let store = InMemoryLedgerStore::open(Some(&path)).unwrap();
            store
                .append(TransactionRecord::deposit(account, Decimal::new(10000, 2)))
                .await
                .unwrap();
            store
                .append(TransactionRecord::withdrawal(account, Decimal::new(4000, 2), Some("rent".into())))
                .await
                .unwrap();
            store.close().await.unwrap();
        }

        let reopened = InMemoryLedgerStore::open(Some(&path)).unwrap();
        let records = reopened.records_for(account).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, TransactionKind::Deposit);
        assert_eq!(records[1].reason.as_deref(), Some("rent"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_journaled_appends_on_worker_pool() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.journal");
        let account = AccountId::new();
        let n = 16;

        {
            let store = Arc::new(InMemoryLedgerStore::open(Some(&path)).unwrap());
            let tasks: Vec<_> = (0..n)
                .map(|_| {
                    let store = Arc::clone(&store);
                    tokio::spawn(async move {
                        store
                            .append(TransactionRecord::deposit(account, Decimal::new(100, 2)))
                            .await
                    })
                })
                .collect();
            for task in tasks {
                task.await.unwrap().unwrap();
            }
            assert_eq!(store.len().await, n);
            store.close().await.unwrap();
        }

        let reopened = InMemoryLedgerStore::open(Some(&path)).unwrap();
        assert_eq!(reopened.records_for(account).await.unwrap().len(), n);
    }

    #[tokio::test]
    async fn test_rolled_back_unit_is_not_journaled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.journal");
        let a = AccountId::new();

        {
            let store = InMemoryLedgerStore::open(Some(&path))
                .unwrap()
                .with_write_hook(fail_at(1));
            let (out, inbound) =
                TransactionRecord::transfer_pair(a, &payee_for(AccountId::new()), Decimal::new(100, 2));
            assert!(store.atomic_append(vec![out, inbound]).await.is_err());
            store.close().await.unwrap();
        }

        let reopened = InMemoryLedgerStore::open(Some(&path)).unwrap();
        assert!(reopened.is_empty().await);
    }
}
