//! Per-conversation reconciliation and the parsed-directory sync loop.
//!
//! Each conversation is diffed independently: the message keys already in
//! the store are compared against the canonical thread, stale keys are
//! deleted, and every canonical message is re-put so edits to content or
//! timestamps always land without any content comparison.

use crate::extract::CanonicalMessage;
use crate::sync::item::{conversation_key, message_key, StoredItem, MSG_PREFIX};
use crate::sync::store::{ItemStore, StoreError};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Outcome of reconciling one conversation.
///
/// A returned `Err` means the read phase failed and nothing was written.
/// `WriteFailed` means the diff was computed but applying it failed; the
/// store partition is possibly partially updated, and the caller decides
/// whether to continue with other conversations.
#[derive(Debug)]
pub enum Reconciliation {
    /// The diff was applied. Counts are the operations issued.
    Applied { puts: usize, deletes: usize },
    /// The write phase failed after a successful read phase.
    WriteFailed { cause: StoreError },
}

/// Bring the store partition for `conversation_id` in line with `canonical`.
pub fn reconcile(
    conversation_id: &str,
    canonical: &[CanonicalMessage],
    store: &mut ItemStore,
    collection: &str,
) -> Result<Reconciliation, StoreError> {
    let conv_key = conversation_key(conversation_id);

    let existing: HashSet<String> =
        match store.query_item_keys(collection, &conv_key, MSG_PREFIX) {
            Ok(keys) => keys.into_iter().collect(),
            Err(StoreError::CollectionNotFound(name)) => {
                warn!(collection = %name, "collection not found, treating as empty");
                HashSet::new()
            }
            Err(err) => return Err(err),
        };

    let mut puts = Vec::with_capacity(canonical.len());
    let mut canonical_keys = HashSet::with_capacity(canonical.len());
    for message in canonical {
        if message.message_id.is_empty() {
            warn!(conversation_id, "skipping canonical message without an id");
            continue;
        }
        canonical_keys.insert(message_key(&message.message_id));
        puts.push(StoredItem::from_message(conversation_id, message));
    }

    let deletes: Vec<String> = existing
        .iter()
        .filter(|key| !canonical_keys.contains(*key))
        .cloned()
        .collect();

    if puts.is_empty() && deletes.is_empty() {
        return Ok(Reconciliation::Applied { puts: 0, deletes: 0 });
    }

    match store.batch_write(collection, &conv_key, &deletes, &puts) {
        Ok(()) => {
            info!(
                conversation_id,
                puts = puts.len(),
                deletes = deletes.len(),
                "conversation reconciled"
            );
            Ok(Reconciliation::Applied {
                puts: puts.len(),
                deletes: deletes.len(),
            })
        }
        Err(cause) => {
            warn!(conversation_id, %cause, "write phase failed");
            Ok(Reconciliation::WriteFailed { cause })
        }
    }
}

/// Totals for one pass over a parsed-output directory.
#[derive(Debug, Default)]
pub struct SyncSummary {
    pub conversations: usize,
    pub puts: usize,
    pub deletes: usize,
    pub failed: usize,
}

const PARSED_SUFFIX: &str = "_parsed.json";

/// Sync every `*_parsed.json` file under `dir` into `collection`.
///
/// Files are processed in name order. A conversation that fails to load or
/// to sync is counted and skipped; it never stops the pass.
pub fn process_parsed_dir(
    dir: &Path,
    store: &mut ItemStore,
    collection: &str,
) -> Result<SyncSummary> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("reading parsed directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(PARSED_SUFFIX))
        })
        .collect();
    files.sort();

    let mut summary = SyncSummary::default();
    for path in &files {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let conversation_id = name.trim_end_matches(PARSED_SUFFIX);

        let canonical = match load_parsed_file(path) {
            Ok(messages) => messages,
            Err(err) => {
                warn!(file = %path.display(), error = %err, "skipping unreadable parsed file");
                summary.failed += 1;
                continue;
            }
        };

        match reconcile(conversation_id, &canonical, store, collection) {
            Ok(Reconciliation::Applied { puts, deletes }) => {
                summary.conversations += 1;
                summary.puts += puts;
                summary.deletes += deletes;
            }
            Ok(Reconciliation::WriteFailed { cause }) => {
                warn!(conversation_id, %cause, "conversation left partially synced");
                summary.failed += 1;
            }
            Err(err) => {
                warn!(conversation_id, error = %err, "read phase failed, skipping");
                summary.failed += 1;
            }
        }
    }

    info!(
        conversations = summary.conversations,
        puts = summary.puts,
        deletes = summary.deletes,
        failed = summary.failed,
        "sync pass complete"
    );
    Ok(summary)
}

fn load_parsed_file(path: &Path) -> Result<Vec<CanonicalMessage>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
