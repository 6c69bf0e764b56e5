//! Mapping of ledger errors onto HTTP responses
//!
//! | Error                                                  | Status |
//! |--------------------------------------------------------|--------|
//! | `InvalidAmount`, `InsufficientFunds`, `InvalidRequest` | 400    |
//! | `PayeeNotApproved`, `NotFound`                         | 404    |
//! | `Timeout`                                              | 503    |
//! | `StorageError`, `ArithmeticOverflow`, `TransferFailed` | 500    |
//!
//! Every error body is `{"success": false, "message": ...}`. Validation errors
//! carry their own message; server-side failures get a generic one so storage
//! details stay in the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::types::LedgerError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

/// HTTP status for an error
pub fn status_for(error: &LedgerError) -> StatusCode {
    match error {
        LedgerError::InvalidAmount { .. }
        | LedgerError::InsufficientFunds { .. }
        | LedgerError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        LedgerError::PayeeNotApproved { .. } | LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
        LedgerError::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
        LedgerError::StorageError { .. }
        | LedgerError::ArithmeticOverflow { .. }
        | LedgerError::TransferFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Message shown to the client for an error
pub fn client_message(error: &LedgerError) -> String {
    match error {
        e if e.is_user_facing() => e.to_string(),
        LedgerError::TransferFailed { attempt, .. } => format!(
            "Transfer failed and was rolled back, no money was moved (reference {})",
            attempt
        ),
        LedgerError::Timeout { .. } => "The ledger is busy, please retry".to_string(),
        _ => "Internal server error".to_string(),
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            message: client_message(&self),
        };
        (status_for(&self), Json(body)).into_response()
    }
}
