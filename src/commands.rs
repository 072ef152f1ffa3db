//! CLI command definitions
//!
//! Defines the clap commands for the harness CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scenario file against the service
    Run {
        /// Path to the YAML scenario file
        path: PathBuf,

        /// WebSocket endpoint (overrides scenario file and config)
        #[arg(long)]
        endpoint: Option<String>,

        /// Requester id stamped on outbound messages
        #[arg(long)]
        user_id: Option<String>,

        /// Per-receive timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Show answer details (intent, timing, suggestions)
        #[arg(long, short)]
        verbose: bool,
    },

    /// Probe the connection handshake and print the session greeting
    Check {
        /// WebSocket endpoint (overrides config)
        #[arg(long)]
        endpoint: Option<String>,

        /// Connect timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}
