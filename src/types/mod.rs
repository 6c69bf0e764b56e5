//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `ids`: UUID newtypes for accounts, payees and records
//! - `account`: Account holder types
//! - `payee`: Payee types and approval lifecycle
//! - `transaction`: Ledger record types
//! - `amount`: Currency amount validation
//! - `filter`: History query filter
//! - `error`: Error types for the ledger

pub mod account;
pub mod amount;
pub mod error;
pub mod filter;
pub mod ids;
pub mod payee;
pub mod transaction;

pub use account::{NewUser, User, UserUpdate};
pub use amount::{parse_amount, validate_amount, CURRENCY_SCALE};
pub use error::LedgerError;
pub use filter::HistoryFilter;
pub use ids::{AccountId, PayeeId, TransactionId};
pub use payee::{NewPayee, Payee, PayeeStatus};
pub use transaction::{TransactionKind, TransactionRecord, TransactionStatus};
