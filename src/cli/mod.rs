// CLI module
// Server arguments and their conversion into service configuration

mod args;

pub use args::{InboundTransfers, ServerArgs};

use clap::Parser;

/// Parse command-line arguments using clap
///
/// If parsing fails (invalid arguments or `--help`), clap prints an error or
/// help text and exits the process.
pub fn parse_args() -> ServerArgs {
    ServerArgs::parse()
}
