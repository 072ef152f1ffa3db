//! CLI command handling
//!
//! Dispatches CLI commands and formats output.

use std::time::Duration;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::{Config, Result};
use crate::scenario::{run_scenario, RunOverrides};
use crate::session::ChatSession;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            path,
            endpoint,
            user_id,
            timeout,
            verbose,
        } => {
            let overrides = RunOverrides {
                endpoint,
                user_id,
                receive_timeout_secs: timeout,
            };

            let report = run_scenario(&path, &overrides, verbose).await?;
            if !report.passed() {
                std::process::exit(1);
            }
            Ok(())
        }

        Commands::Check { endpoint, timeout } => {
            let config = Config::load()?;
            let endpoint = endpoint.unwrap_or(config.endpoint);
            let connect_timeout =
                Duration::from_secs(timeout.unwrap_or(config.timeouts.connect_secs));

            let mut session = ChatSession::connect(&endpoint, connect_timeout).await?;

            println!("{} Connected to {}", "✓".green(), endpoint);
            println!("  session: {}", session.session_id());
            if !session.greeting().is_empty() {
                println!("  greeting: {}", session.greeting());
            }

            session.close().await;
            Ok(())
        }
    }
}
