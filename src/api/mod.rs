//! HTTP surface of the ledger
//!
//! # Routes
//!
//! ```text
//! POST /api/transactions/deposit            deposit
//! POST /api/transactions/withdraw           withdrawal
//! POST /api/transactions/transfer           transfer to an approved payee
//! GET  /api/transactions/balance/{userId}   current balance, never cached
//! GET  /api/transactions/history/{userId}   filtered history, newest first
//! GET  /api/transactions/export/{userId}    the same history as CSV
//! GET  /api/transactions                    every record (admin)
//!
//! POST /api/users/register                  register an account holder
//! GET  /api/users                           all users (admin)
//! GET  /api/users/{id}                      one user
//! PUT  /api/users/update/{id}               profile update
//!
//! POST /api/payees                          register a payee (pending)
//! GET  /api/payees/user/{userId}            payees of a user
//! GET  /api/payees/pending                  payees awaiting approval (admin)
//! PUT  /api/payees/approve/{payeeId}        approve (admin)
//! PUT  /api/payees/reject/{payeeId}         reject (admin)
//!
//! GET  /api/admin/stats                     dashboard figures (admin)
//! ```

pub mod dto;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::core::{InMemoryLedgerStore, LedgerService};

/// Shared state of every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<LedgerService<InMemoryLedgerStore>>,
}

impl AppState {
    pub fn new(service: Arc<LedgerService<InMemoryLedgerStore>>) -> Self {
        Self { service }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let transactions = Router::new()
        .route("/", get(handlers::all_transactions))
        .route("/deposit", post(handlers::deposit))
        .route("/withdraw", post(handlers::withdraw))
        .route("/transfer", post(handlers::transfer))
        .route("/balance/{user_id}", get(handlers::balance))
        .route("/history/{user_id}", get(handlers::history))
        .route("/export/{user_id}", get(handlers::export));

    let users = Router::new()
        .route("/", get(handlers::list_users))
        .route("/register", post(handlers::register_user))
        .route("/update/{id}", put(handlers::update_user))
        .route("/{id}", get(handlers::get_user));

    let payees = Router::new()
        .route("/", post(handlers::register_payee))
        .route("/pending", get(handlers::pending_payees))
        .route("/user/{user_id}", get(handlers::payees_for_user))
        .route("/approve/{payee_id}", put(handlers::approve_payee))
        .route("/reject/{payee_id}", put(handlers::reject_payee));

    Router::new()
        .nest("/api/transactions", transactions)
        .nest("/api/users", users)
        .nest("/api/payees", payees)
        .route("/api/admin/stats", get(handlers::stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
