//! Core ledger logic
//!
//! This module contains the components behind every money movement:
//! - `traits` - Store and directory abstractions
//! - `journal` - Append-only on-disk journal of committed units
//! - `ledger_store` - In-memory ledger store with optional journal
//! - `directory` - In-memory user and payee directories
//! - `balance` - Balance derivation from ledger records
//! - `account_locks` - Per-account exclusion for debits
//! - `service` - Deposits, withdrawals, transfers and queries

pub mod account_locks;
pub mod balance;
pub mod directory;
pub mod journal;
pub mod ledger_store;
pub mod service;
pub mod traits;

pub use account_locks::{AccountGuard, AccountLocks};
pub use balance::{fold_balance, BalanceCalculator, BalancePolicy};
pub use directory::{InMemoryPayeeDirectory, InMemoryUserDirectory};
pub use journal::Journal;
pub use ledger_store::{InMemoryLedgerStore, WriteHook};
pub use service::{
    HistoryEntry, KindStats, LedgerEntry, LedgerService, LedgerStats, PayeeSummary,
    ServiceConfig, TransferReceipt, TransferStage, UserSummary, WithdrawalReceipt,
};
pub use traits::{LedgerStore, PayeeDirectory, UserDirectory};
