//! chat-mirror - mirror conversation exports into a local message store
//!
//! Parses raw branching-conversation export files down to their canonical
//! threads and diff-syncs the result into a SQLite-backed item store.

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            cli::run_pipeline()?;
        }
        Commands::Parse { input_dir, output_dir } => {
            cli::parse_exports(input_dir, output_dir)?;
        }
        Commands::Sync { input_dir, table, db } => {
            cli::sync_parsed(input_dir, table, db)?;
        }
        Commands::Status => {
            cli::show_status()?;
        }
        Commands::Clear { yes } => {
            cli::clear_collection(yes)?;
        }
        Commands::Config { key, value } => {
            cli::manage_config(key, value)?;
        }
    }

    Ok(())
}
