//! Canonical-thread extraction.
//!
//! Conversation exports store every edit branch in a flat node `mapping`
//! with a `current_node` pointer at the live edit tip. Walking parent links
//! from that tip back to the root yields the one lineage that is actually
//! the conversation; sibling branches orphaned by edits never appear.

pub mod extractor;
pub mod models;

pub use extractor::{extract_canonical_thread, parse_export_file, process_export_dir, ParseSummary};
pub use models::{Author, CanonicalMessage, ConversationTree, TreeNode};
