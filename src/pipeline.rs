//! End-to-end run: archive rotation, parse, then sync.

use crate::config::Config;
use crate::extract::{process_export_dir, ParseSummary};
use crate::sync::{process_parsed_dir, ItemStore, SyncSummary};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use tracing::info;

const PARSED_SUFFIX: &str = "_parsed.json";

/// Report for one full pipeline run.
#[derive(Debug)]
pub struct RunReport {
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub archived: usize,
    pub parse: ParseSummary,
    pub sync: SyncSummary,
}

/// Rotate the previous run's parsed output into the archive directory.
///
/// Both directories are created if missing. The archive is emptied first so
/// it only ever holds the immediately preceding run. Returns the number of
/// files moved.
pub fn prepare_directories(parsed_dir: &Path, archive_dir: &Path) -> Result<usize> {
    fs::create_dir_all(parsed_dir)
        .with_context(|| format!("creating {}", parsed_dir.display()))?;
    fs::create_dir_all(archive_dir)
        .with_context(|| format!("creating {}", archive_dir.display()))?;

    for entry in fs::read_dir(archive_dir)? {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)
                .with_context(|| format!("clearing {}", path.display()))?;
        } else {
            fs::remove_file(&path)
                .with_context(|| format!("clearing {}", path.display()))?;
        }
    }

    let mut moved = 0;
    for entry in fs::read_dir(parsed_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !name.ends_with(PARSED_SUFFIX) {
            continue;
        }
        fs::rename(&path, archive_dir.join(name))
            .with_context(|| format!("archiving {}", path.display()))?;
        moved += 1;
    }

    info!(archived = moved, "parsed output rotated to archive");
    Ok(moved)
}

/// Execute the full export-to-store pipeline described by `config`.
pub fn run(config: &Config, store: &mut ItemStore) -> Result<RunReport> {
    let started = Utc::now();

    let archived = prepare_directories(&config.parsed_dir, &config.archive_dir)?;
    let parse = process_export_dir(&config.export_dir, &config.parsed_dir)?;
    let sync = process_parsed_dir(&config.parsed_dir, store, &config.table_name)?;

    let finished = Utc::now();
    info!(
        archived,
        parsed = parse.processed,
        synced = sync.conversations,
        "pipeline run finished"
    );
    Ok(RunReport {
        started,
        finished,
        archived,
        parse,
        sync,
    })
}
