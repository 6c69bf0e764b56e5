//! I/O module
//!
//! Handles CSV output of ledger data.
//!
//! # Components
//!
//! - `csv_format` - CSV export of transaction history

pub mod csv_format;

pub use csv_format::{write_history_csv, HISTORY_CSV_HEADER};
