//! Per-account mutual exclusion
//!
//! Withdrawals and transfers read the current balance and then append a debit.
//! Two such sequences racing on the same account could each see enough funds and
//! together overdraw it. Holding the account's lock across the check and the
//! append serializes them while leaving other accounts unaffected.
//!
//! Credits (deposits, received transfers) never take the lock: they can only
//! raise a balance, so they cannot invalidate a check already made.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::types::{AccountId, LedgerError};

/// Held while an account's debit is checked and written
pub type AccountGuard = OwnedMutexGuard<()>;

/// Lazily created lock per account
#[derive(Debug, Default)]
pub struct AccountLocks {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `account`
    ///
    /// Fails with `LedgerError::Timeout` instead of waiting longer than
    /// `timeout`.
    pub async fn acquire(
        &self,
        account: AccountId,
        timeout: Duration,
    ) -> Result<AccountGuard, LedgerError> {
        // Clone the Arc out so the shard lock is released before awaiting.
        let lock = Arc::clone(&*self.locks.entry(account).or_default());

        tokio::time::timeout(timeout, lock.lock_owned())
            .await
            .map_err(|_| LedgerError::timeout("account lock", timeout.as_millis() as u64))
    }

    /// Number of accounts that have been locked at least once
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
