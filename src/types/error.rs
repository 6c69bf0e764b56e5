//! Error types for the ledger
//!
//! This module defines every error a ledger operation can produce.
//!
//! # Error Categories
//!
//! - **Validation errors**: invalid amount, insufficient funds, payee not
//!   approved, unknown account or payee, malformed request. These are expected,
//!   user-facing and never logged as incidents.
//! - **Storage errors**: persistence failures, timeouts and failed transfers.
//!   These are unexpected; the caller must assume no side effect occurred.

use super::ids::{AccountId, PayeeId};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Main error type for the ledger
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Amount is non-numeric, not positive, or too precise
    #[error("Invalid amount '{amount}': {reason}")]
    InvalidAmount {
        /// The rejected amount as supplied
        amount: String,
        /// Why it was rejected
        reason: String,
    },

    /// Current balance cannot cover the requested debit
    #[error("Insufficient funds for account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        balance: Decimal,
        requested: Decimal,
    },

    /// Payee does not exist or is not approved
    #[error("Payee {payee} not found or not approved")]
    PayeeNotApproved { payee: PayeeId },

    /// Unknown account, payee or record
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of thing that was looked up
        entity: String,
        /// Identifier that was looked up
        id: String,
    },

    /// Missing field, malformed id, bad filter or duplicate key
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Sum of ledger amounts left the representable range
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow { operation: String, account: AccountId },

    /// Underlying persistence failed; nothing was written
    #[error("Storage error: {message}")]
    StorageError { message: String },

    /// A store or lock call did not finish in time; nothing was written
    #[error("Timed out after {millis}ms during {operation}")]
    Timeout { operation: String, millis: u64 },

    /// The two-record write of a transfer failed and was rolled back
    #[error("Transfer {attempt} failed: {cause}")]
    TransferFailed {
        /// Attempt id, also present in the logs
        attempt: Uuid,
        cause: Box<LedgerError>,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::StorageError {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(error: serde_json::Error) -> Self {
        LedgerError::StorageError {
            message: format!("journal encoding: {}", error),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        LedgerError::StorageError {
            message: format!("CSV output: {}", error),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: impl ToString, reason: &str) -> Self {
        LedgerError::InvalidAmount {
            amount: amount.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: AccountId, balance: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            account,
            balance,
            requested,
        }
    }

    /// Create a PayeeNotApproved error
    pub fn payee_not_approved(payee: PayeeId) -> Self {
        LedgerError::PayeeNotApproved { payee }
    }

    /// Create a NotFound error
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        LedgerError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Create an InvalidRequest error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        LedgerError::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }

    /// Create a StorageError
    pub fn storage(message: impl Into<String>) -> Self {
        LedgerError::StorageError {
            message: message.into(),
        }
    }

    /// Create a Timeout error
    pub fn timeout(operation: &str, millis: u64) -> Self {
        LedgerError::Timeout {
            operation: operation.to_string(),
            millis,
        }
    }

    /// Wrap the cause of a failed transfer write
    pub fn transfer_failed(attempt: Uuid, cause: LedgerError) -> Self {
        LedgerError::TransferFailed {
            attempt,
            cause: Box::new(cause),
        }
    }

    /// Expected, user-facing errors
    ///
    /// These are reported back to the caller as-is and are not incidents.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount { .. }
                | LedgerError::InsufficientFunds { .. }
                | LedgerError::PayeeNotApproved { .. }
                | LedgerError::NotFound { .. }
                | LedgerError::InvalidRequest { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::invalid_amount(
        LedgerError::invalid_amount("-5", "must be greater than zero"),
        "Invalid amount '-5': must be greater than zero"
    )]
    #[case::invalid_request(
        LedgerError::invalid_request("payeeId is required"),
        "Invalid request: payeeId is required"
    )]
    #[case::not_found(LedgerError::not_found("User", "abc"), "User abc not found")]
    #[case::storage(LedgerError::storage("disk full"), "Storage error: disk full")]
    #[case::timeout(
        LedgerError::timeout("ledger append", 250),
        "Timed out after 250ms during ledger append"
    )]
    fn test_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_insufficient_funds_display() {
        let account = AccountId::new();
        let error = LedgerError::insufficient_funds(
            account,
            Decimal::new(10000, 2),
            Decimal::new(15000, 2),
        );
        assert_eq!(
            error.to_string(),
            format!(
                "Insufficient funds for account {}: balance 100.00, requested 150.00",
                account
            )
        );
    }

    #[test]
    fn test_transfer_failed_wraps_cause() {
        let attempt = Uuid::new_v4();
        let error = LedgerError::transfer_failed(attempt, LedgerError::storage("boom"));
        assert_eq!(
            error.to_string(),
            format!("Transfer {} failed: Storage error: boom", attempt)
        );
    }

    #[rstest]
    #[case::invalid_amount(LedgerError::invalid_amount("0", "zero"), true)]
    #[case::payee(LedgerError::payee_not_approved(PayeeId::new()), true)]
    #[case::not_found(LedgerError::not_found("Payee", "x"), true)]
    #[case::request(LedgerError::invalid_request("bad"), true)]
    #[case::storage(LedgerError::storage("boom"), false)]
    #[case::timeout(LedgerError::timeout("lock", 1), false)]
    #[case::transfer(LedgerError::transfer_failed(Uuid::nil(), LedgerError::storage("boom")), false)]
    fn test_user_facing_split(#[case] error: LedgerError, #[case] user_facing: bool) {
        assert_eq!(error.is_user_facing(), user_facing);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: LedgerError = io_error.into();
        assert!(matches!(error, LedgerError::StorageError { .. }));
        assert_eq!(error.to_string(), "Storage error: Permission denied");
    }
}
