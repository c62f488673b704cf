//! Command-line driver for the resource ledger and inventory.
//!
//! Loads item content, builds a session, and runs line-oriented scripts
//! against it.
//!
//! ```bash
//! cargo run -p ledger-cli -- run crates/cli/scripts/demo.ledger --events
//! cargo run -p ledger-cli -- items --type weapon
//! ```

mod commands;
mod logging;
mod script;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use commands::{Items, Run};

/// Resource ledger and inventory driver
#[derive(Parser)]
#[command(name = "ledger")]
#[command(about = "Drive the resource ledger and inventory from scripts", long_about = None)]
#[command(version)]
struct Cli {
    /// Default log level when RUST_LOG is unset
    #[arg(long, global = true, env = "LEDGER_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true, env = "LEDGER_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Run a script against a fresh session
    Run(Run),

    /// List item definitions
    Items(Items),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = logging::setup_logging(&cli.log_level, cli.log_dir.as_deref())?;

    match cli.command {
        Command::Run(cmd) => cmd.execute().await,
        Command::Items(cmd) => cmd.execute(),
    }
}
