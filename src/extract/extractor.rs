//! Canonical-thread extraction and export-file processing.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

use super::models::{CanonicalMessage, ConversationTree, ROOT_SENTINEL};

/// Whether a node pointer marks the start of the conversation.
fn is_root_pointer(pointer: Option<&str>) -> bool {
    matches!(pointer, None | Some("") | Some(ROOT_SENTINEL))
}

/// Extract the canonical message sequence from a conversation record.
///
/// Pure function of its input: walks parent links from `current_node` back
/// to the root, keeping user/assistant messages that have an id, a
/// resolvable timestamp, and non-empty joined content. Malformed input
/// degrades to an empty or partial result; this never fails.
pub fn extract_canonical_thread(record: &Value) -> Vec<CanonicalMessage> {
    let tree: ConversationTree = match serde_json::from_value(record.clone()) {
        Ok(tree) => tree,
        Err(e) => {
            warn!("conversation record does not match the export schema: {e}");
            return Vec::new();
        }
    };

    let mut current = match tree.current_node.as_deref() {
        Some(id) if !is_root_pointer(Some(id)) => id.to_string(),
        _ => {
            warn!("conversation record has no usable current_node");
            return Vec::new();
        }
    };
    if tree.mapping.is_empty() {
        warn!("conversation record has an empty node mapping");
        return Vec::new();
    }

    // Leaf-to-root walk; reversed once at the end to restore thread order.
    let mut messages = Vec::new();
    // A well-formed tree never takes more hops than it has nodes.
    let max_hops = tree.mapping.len();

    for _ in 0..max_hops {
        let node = match tree.mapping.get(&current) {
            Some(node) => node,
            None => {
                // Dangling pointer: keep what the walk found so far.
                warn!("node '{current}' not found in mapping, stopping traversal");
                break;
            }
        };

        if let Some(message) = &node.message {
            let content = message.content.joined_text();
            if message.author.role.is_retained() && !message.id.is_empty() && !content.is_empty() {
                if let Some(timestamp) = message.timestamp() {
                    messages.push(CanonicalMessage {
                        message_id: message.id.clone(),
                        timestamp,
                        author: message.author.role,
                        content,
                    });
                }
            }
        }

        if node.parent_is_root() {
            break;
        }
        current = node.parent.clone().unwrap_or_default();
    }

    messages.reverse();
    messages
}

/// Resolve the top-level export shape to a single conversation record:
/// either a bare object, or the first element of a non-empty array.
pub fn conversation_record(raw: &Value) -> Option<&Value> {
    match raw {
        Value::Object(_) => Some(raw),
        Value::Array(items) => match items.first() {
            Some(first @ Value::Object(_)) => Some(first),
            _ => None,
        },
        _ => None,
    }
}

/// Load one raw export file and extract its canonical thread.
///
/// Invalid JSON is an error at this level; an unrecognized top-level shape
/// or an unparseable tree yields an empty list with a warning.
pub fn parse_export_file(path: &Path) -> Result<Vec<CanonicalMessage>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read export file {}", path.display()))?;
    let raw: Value = serde_json::from_str(&raw)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;

    match conversation_record(&raw) {
        Some(record) => Ok(extract_canonical_thread(record)),
        None => {
            warn!(
                "unexpected top-level shape in {}, expected an object or non-empty array",
                path.display()
            );
            Ok(Vec::new())
        }
    }
}

/// Outcome of a directory parse pass.
#[derive(Debug, Clone, Default)]
pub struct ParseSummary {
    /// Files processed, including ones that extracted nothing.
    pub processed: usize,
    /// Files that failed to load or parse.
    pub failed: usize,
    /// Files that produced a non-empty parsed output.
    pub written: usize,
    /// Total canonical messages written.
    pub messages: usize,
}

/// Parse every `*.json` export in `input_dir`, writing each non-empty
/// canonical list to `<base>_parsed.json` in `output_dir`. Per-file
/// failures are counted and logged; they do not abort the pass.
pub fn process_export_dir(input_dir: &Path, output_dir: &Path) -> Result<ParseSummary> {
    if !input_dir.is_dir() {
        anyhow::bail!("input directory not found: {}", input_dir.display());
    }
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir {}", output_dir.display()))?;

    let mut summary = ParseSummary::default();

    let mut entries: Vec<_> = fs::read_dir(input_dir)
        .with_context(|| format!("failed to read {}", input_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    entries.sort();

    for path in entries {
        let base = match path.file_stem().and_then(|stem| stem.to_str()) {
            Some(base) if !base.is_empty() => base.to_string(),
            _ => {
                warn!("skipping {} due to unusable file name", path.display());
                summary.failed += 1;
                continue;
            }
        };

        match parse_export_file(&path) {
            Ok(messages) => {
                summary.processed += 1;
                if messages.is_empty() {
                    info!("no canonical messages in {}", path.display());
                    continue;
                }
                let out_path = output_dir.join(format!("{base}_parsed.json"));
                let json = serde_json::to_string_pretty(&messages)?;
                fs::write(&out_path, json)
                    .with_context(|| format!("failed to write {}", out_path.display()))?;
                info!(
                    "saved {} canonical messages to {}",
                    messages.len(),
                    out_path.display()
                );
                summary.written += 1;
                summary.messages += messages.len();
            }
            Err(e) => {
                warn!("failed to parse {}: {e:#}", path.display());
                summary.failed += 1;
            }
        }
    }

    info!(
        "parse pass complete: {} processed, {} written, {} failed",
        summary.processed, summary.written, summary.failed
    );
    Ok(summary)
}
