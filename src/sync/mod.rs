//! Diff-based synchronization of canonical threads into an item store.
//!
//! One conversation maps to one partition (`CONV#<id>`) whose `MSG#`-prefixed
//! sort keys mirror the canonical message set exactly after a successful
//! reconcile. The diff is recomputed from scratch every run, so a failed
//! batch heals on the next pass without any retry bookkeeping.

pub mod engine;
pub mod item;
pub mod store;

pub use engine::{process_parsed_dir, reconcile, Reconciliation, SyncSummary};
pub use item::{conversation_key, decimal_string, message_key, StoredItem, MSG_PREFIX};
pub use store::{ItemStore, StoreError};
