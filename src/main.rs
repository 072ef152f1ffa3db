//! chatprobe - scenario-driven conformance harness for chat WebSocket services

use clap::Parser;

use chatprobe::commands::Commands;
use chatprobe::{cli, common};

#[derive(Parser)]
#[command(name = "chatprobe", about = "Conformance harness for chat WebSocket services")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    common::logging::init();

    let cli = Cli::parse();

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
