//! chat-mirror - mirror branching conversation exports into an item store.
//!
//! Provides canonical-thread extraction from `mapping`/`current_node` export
//! JSON and diff-based synchronization against a composite-key SQLite store.

pub mod config;
pub mod extract;
pub mod pipeline;
pub mod sync;

// Re-export commonly used types
pub use extract::{extract_canonical_thread, parse_export_file, Author, CanonicalMessage};
pub use sync::{reconcile, ItemStore, Reconciliation, StoreError};
