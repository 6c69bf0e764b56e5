//! Bank ledger server
//!
//! Serves the ledger's HTTP API.
//!
//! # Usage
//!
//! ```bash
//! cargo run
//! cargo run -- --bind 0.0.0.0:5000 --journal ledger.journal
//! cargo run -- --inbound-transfers ignore --store-timeout-ms 2000
//! RUST_LOG=bank_ledger=debug,tower_http=debug cargo run
//! ```
//!
//! On Ctrl-C the server stops accepting connections, finishes in-flight
//! requests and syncs the journal before exiting.
//!
//! # Exit Codes
//!
//! - 0: Clean shutdown
//! - 1: Error (bad journal, address in use, runtime failure, etc.)

use bank_ledger::api::{self, AppState};
use bank_ledger::cli::{self, ServerArgs};
use bank_ledger::core::{InMemoryLedgerStore, InMemoryPayeeDirectory, InMemoryUserDirectory, LedgerService};
use std::process;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = cli::parse_args();
    init_logging(&args.log_filter);

    if let Err(e) = run(args) {
        error!(error = %e, "server stopped");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the tracing subscriber; `RUST_LOG` wins over `--log-filter`
fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(args: ServerArgs) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(args.worker_threads())
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

    runtime.block_on(serve(args))
}

async fn serve(args: ServerArgs) -> Result<(), String> {
    let config = args.to_service_config();
    let store = Arc::new(
        InMemoryLedgerStore::open(args.journal.as_deref())
            .map_err(|e| format!("Failed to open ledger: {}", e))?,
    );

    let service = Arc::new(LedgerService::new(
        Arc::clone(&store),
        Arc::new(InMemoryUserDirectory::new()),
        Arc::new(InMemoryPayeeDirectory::new()),
        config,
    ));
    let app = api::router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", args.bind, e))?;
    info!(
        addr = %args.bind,
        journal = ?args.journal,
        workers = args.worker_threads(),
        "bank ledger listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    store
        .close()
        .await
        .map_err(|e| format!("Failed to close ledger: {}", e))?;
    info!("ledger closed");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
