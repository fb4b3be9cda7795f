//! CLI command definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::{style, Emoji};
use std::path::PathBuf;

use chat_mirror::config::Config;
use chat_mirror::extract::process_export_dir;
use chat_mirror::pipeline;
use chat_mirror::sync::{process_parsed_dir, ItemStore};

static CHECK: Emoji = Emoji("✓ ", "* ");
static CROSS: Emoji = Emoji("✗ ", "x ");
static ARROW: Emoji = Emoji("→ ", "-> ");
static INFO: Emoji = Emoji("ℹ ", "i ");

#[derive(Parser)]
#[command(name = "chat-mirror")]
#[command(author, version, about = "Mirror conversation exports into a local message store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: archive, parse, sync
    Run,

    /// Parse raw export files into canonical-thread JSON
    Parse {
        /// Directory of raw export files (default from config)
        #[arg(short, long)]
        input_dir: Option<PathBuf>,

        /// Directory that receives parsed output (default from config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Sync parsed output into the message store
    Sync {
        /// Directory of parsed files (default from config)
        #[arg(short, long)]
        input_dir: Option<PathBuf>,

        /// Collection to sync into (default from config)
        #[arg(short, long)]
        table: Option<String>,

        /// Database path (default from config)
        #[arg(short, long)]
        db: Option<PathBuf>,
    },

    /// Show store and directory status
    Status,

    /// Remove every item from the configured collection
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage configuration
    Config {
        /// Configuration key
        key: Option<String>,

        /// Configuration value (omit to show current)
        value: Option<String>,
    },
}

/// Run the full archive-parse-sync pipeline.
pub fn run_pipeline() -> Result<()> {
    let config = Config::load()?;
    let mut store = ItemStore::open(&config.db_path)?;

    println!("{}", style("Running export pipeline").bold());
    println!("  {} export:  {}", ARROW, config.export_dir.display());
    println!("  {} parsed:  {}", ARROW, config.parsed_dir.display());
    println!("  {} store:   {}", ARROW, config.db_path.display());
    println!();

    let report = pipeline::run(&config, &mut store)?;

    println!("  {} {} parsed file(s) archived", CHECK, report.archived);
    println!(
        "  {} {} export(s) parsed, {} file(s) written, {} message(s)",
        CHECK, report.parse.processed, report.parse.written, report.parse.messages
    );
    println!(
        "  {} {} conversation(s) synced: {} put(s), {} delete(s)",
        CHECK, report.sync.conversations, report.sync.puts, report.sync.deletes
    );
    let failed = report.parse.failed + report.sync.failed;
    if failed > 0 {
        println!("  {} {} failure(s), see log output", CROSS, failed);
    }
    println!(
        "  {} finished in {}s",
        INFO,
        (report.finished - report.started).num_seconds()
    );

    Ok(())
}

/// Parse raw exports without touching the store.
pub fn parse_exports(input_dir: Option<PathBuf>, output_dir: Option<PathBuf>) -> Result<()> {
    let config = Config::load()?;
    let input = input_dir.unwrap_or(config.export_dir);
    let output = output_dir.unwrap_or(config.parsed_dir);

    std::fs::create_dir_all(&output)
        .with_context(|| format!("creating {}", output.display()))?;

    let summary = process_export_dir(&input, &output)?;
    println!(
        "{} {} export(s) parsed, {} file(s) written, {} message(s)",
        CHECK, summary.processed, summary.written, summary.messages
    );
    if summary.failed > 0 {
        println!("{} {} file(s) failed to parse", CROSS, summary.failed);
    }
    Ok(())
}

/// Sync an existing parsed directory into the store.
pub fn sync_parsed(
    input_dir: Option<PathBuf>,
    table: Option<String>,
    db: Option<PathBuf>,
) -> Result<()> {
    let config = Config::load()?;
    let input = input_dir.unwrap_or(config.parsed_dir);
    let table = table.unwrap_or(config.table_name);
    let db = db.unwrap_or(config.db_path);

    let mut store = ItemStore::open(&db)?;
    let summary = process_parsed_dir(&input, &mut store, &table)?;
    println!(
        "{} {} conversation(s) synced: {} put(s), {} delete(s)",
        CHECK, summary.conversations, summary.puts, summary.deletes
    );
    if summary.failed > 0 {
        println!("{} {} conversation(s) failed", CROSS, summary.failed);
    }
    Ok(())
}

/// Show configured paths and store contents.
pub fn show_status() -> Result<()> {
    let config = Config::load()?;

    println!("{}", style("chat-mirror status").bold());
    println!();
    let dirs = [
        ("export", &config.export_dir),
        ("parsed", &config.parsed_dir),
        ("archive", &config.archive_dir),
    ];
    for (label, dir) in dirs {
        let marker = if dir.is_dir() { CHECK } else { CROSS };
        println!("  {} {:<8} {}", marker, label, dir.display());
    }

    println!();
    if config.db_path.exists() {
        let store = ItemStore::open(&config.db_path)?;
        let count = store.count_items(&config.table_name)?;
        println!(
            "  {} store {} holds {} item(s) in {}",
            CHECK,
            config.db_path.display(),
            count,
            style(&config.table_name).cyan()
        );
    } else {
        println!("  {} store not created yet ({})", INFO, config.db_path.display());
    }

    Ok(())
}

/// Clear the configured collection.
pub fn clear_collection(yes: bool) -> Result<()> {
    let config = Config::load()?;

    if !yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Remove every item from {}?",
                style(&config.table_name).cyan()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{} Cancelled", INFO);
            return Ok(());
        }
    }

    let store = ItemStore::open(&config.db_path)?;
    let removed = store.clear_collection(&config.table_name)?;
    println!("{} Removed {} item(s)", CHECK, removed);
    Ok(())
}

/// Show or update configuration.
pub fn manage_config(key: Option<String>, value: Option<String>) -> Result<()> {
    let mut config = Config::load()?;

    match (key, value) {
        (None, _) => {
            println!("{}", style("Configuration:").bold());
            for key in ["export_dir", "parsed_dir", "archive_dir", "db_path", "table_name"] {
                println!("  {} = {}", style(key).cyan(), config.get(key)?);
            }
        }
        (Some(key), None) => {
            println!("{}", config.get(&key)?);
        }
        (Some(key), Some(value)) => {
            config.set(&key, &value)?;
            config.save()?;
            println!("{} Set {} = {}", CHECK, style(&key).cyan(), value);
        }
    }

    Ok(())
}
