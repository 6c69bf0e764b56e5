//! Bank Ledger Library
//! # Overview
//!
//! This library provides the ledger behind a small digital bank: an append-only
//! record of money movements, balances derived from it, and an HTTP API.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (users, payees, ledger records, errors)
//! - [`cli`] - Server argument parsing
//! - [`core`] - Business logic components:
//!   - [`core::ledger_store`] - Append-only record storage with an optional journal
//!   - [`core::balance`] - Balance derivation
//!   - [`core::service`] - Deposits, withdrawals, transfers and queries
//!   - [`core::directory`] - User and payee collaborators
//! - [`api`] - HTTP routes and error mapping
//! - [`io`] - CSV export
//!
//! # Transaction Kinds
//!
//! - **Deposit**: Credit money paid in from outside
//! - **Withdrawal**: Debit money paid out, requires sufficient balance
//! - **Transfer-out**: Sender side of a transfer to an approved payee
//! - **Transfer-in**: Receiver side of the same transfer, written atomically with it
//!
//! # Balance
//!
//! Balance is never stored. It is the fold of an account's completed records,
//! recomputed on every read, so it can never drift from the ledger.

pub mod api;
pub mod cli;
pub mod core;
pub mod io;
pub mod types;

pub use core::{InMemoryLedgerStore, LedgerService, LedgerStore, ServiceConfig};
pub use io::write_history_csv;
pub use types::{
    AccountId, LedgerError, PayeeId, TransactionId, TransactionKind, TransactionRecord,
    TransactionStatus,
};
