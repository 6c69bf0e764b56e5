use crate::core::{BalancePolicy, ServiceConfig};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Serve the bank ledger over HTTP
#[derive(Parser, Debug)]
#[command(name = "bank-ledger")]
#[command(about = "Serve the bank ledger over HTTP", long_about = None)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(
        long = "bind",
        value_name = "ADDR",
        default_value = "127.0.0.1:5000",
        help = "Socket address to listen on"
    )]
    pub bind: SocketAddr,

    /// Journal file for durable storage
    #[arg(
        long = "journal",
        value_name = "PATH",
        help = "Append-only journal file; the ledger is in-memory only when omitted"
    )]
    pub journal: Option<PathBuf>,

    /// Upper bound on every store call and lock wait
    #[arg(
        long = "store-timeout-ms",
        value_name = "MILLIS",
        help = "Timeout for store calls and account locks in milliseconds (default: 5000)"
    )]
    pub store_timeout_ms: Option<u64>,

    /// Whether received transfers count toward balance
    #[arg(
        long = "inbound-transfers",
        value_name = "POLICY",
        default_value = "credit",
        help = "'credit' to add received transfers to balance, 'ignore' to keep them as history only"
    )]
    pub inbound_transfers: InboundTransfers,

    /// Number of runtime worker threads
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Number of runtime worker threads (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// Log filter used when RUST_LOG is unset
    #[arg(
        long = "log-filter",
        value_name = "FILTER",
        default_value = "info",
        help = "tracing filter directive, overridden by RUST_LOG"
    )]
    pub log_filter: String,
}

/// Treatment of received transfers
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum InboundTransfers {
    Credit,
    Ignore,
}

impl From<InboundTransfers> for BalancePolicy {
    fn from(value: InboundTransfers) -> Self {
        match value {
            InboundTransfers::Credit => BalancePolicy::CreditInbound,
            InboundTransfers::Ignore => BalancePolicy::ExcludeInbound,
        }
    }
}

impl ServerArgs {
    /// Create a ServiceConfig from CLI arguments
    ///
    /// Missing values fall back to `ServiceConfig::default()`; a zero timeout
    /// is replaced by the default with a warning.
    pub fn to_service_config(&self) -> ServiceConfig {
        let default = ServiceConfig::default();
        let store_timeout = self
            .store_timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(default.store_timeout);

        ServiceConfig::new(store_timeout, self.inbound_transfers.into())
    }

    /// Worker thread count, falling back to the number of CPU cores
    pub fn worker_threads(&self) -> usize {
        match self.workers {
            Some(0) | None => num_cpus::get(),
            Some(n) => n,
        }
    }
}
