//! SQLite-backed item store.
//!
//! Items live in per-collection tables keyed by `(conversation_key,
//! item_key)`. Collections come into existence lazily on first write; reads
//! against a collection that has never been written report
//! [`StoreError::CollectionNotFound`] so callers can treat it as empty.

use crate::sync::item::StoredItem;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Maximum operations (puts + deletes) applied per transaction.
pub const BATCH_SIZE: usize = 25;

/// Keys fetched per page when scanning a conversation partition.
const PAGE_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("invalid collection name: {0:?}")]
    InvalidCollectionName(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A connection to the local mirror database.
pub struct ItemStore {
    conn: Connection,
}

impl ItemStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self { conn })
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Collection names become table identifiers, so restrict them to a
    /// safe character set before quoting.
    fn validate_name(collection: &str) -> Result<(), StoreError> {
        let ok = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if ok {
            Ok(())
        } else {
            Err(StoreError::InvalidCollectionName(collection.to_string()))
        }
    }

    pub fn collection_exists(&self, collection: &str) -> Result<bool, StoreError> {
        Self::validate_name(collection)?;
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![collection],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Create the collection's table if it does not exist yet.
    pub fn create_collection(&self, collection: &str) -> Result<(), StoreError> {
        Self::validate_name(collection)?;
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{collection}\" (
                conversation_key TEXT NOT NULL,
                item_key         TEXT NOT NULL,
                ts               TEXT NOT NULL,
                author           TEXT NOT NULL,
                content          TEXT NOT NULL,
                embedding        TEXT,
                PRIMARY KEY (conversation_key, item_key)
            )"
        ))?;
        Ok(())
    }

    /// Drop the collection. Succeeds even if it never existed.
    pub fn drop_collection(&self, collection: &str) -> Result<(), StoreError> {
        Self::validate_name(collection)?;
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS \"{collection}\""))?;
        Ok(())
    }

    /// Delete every item in the collection, returning how many were removed.
    /// A missing collection clears zero items.
    pub fn clear_collection(&self, collection: &str) -> Result<usize, StoreError> {
        if !self.collection_exists(collection)? {
            return Ok(0);
        }
        let removed = self
            .conn
            .execute(&format!("DELETE FROM \"{collection}\""), [])?;
        Ok(removed)
    }

    pub fn count_items(&self, collection: &str) -> Result<usize, StoreError> {
        if !self.collection_exists(collection)? {
            return Ok(0);
        }
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{collection}\""),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// All item keys under `conversation_key` whose sort key starts with
    /// `prefix`, fetched a page at a time in key order.
    pub fn query_item_keys(
        &self,
        collection: &str,
        conversation_key: &str,
        prefix: &str,
    ) -> Result<Vec<String>, StoreError> {
        if !self.collection_exists(collection)? {
            return Err(StoreError::CollectionNotFound(collection.to_string()));
        }
        // Keyset pagination over the BINARY-collated sort key. Prefix-matching
        // keys are contiguous and start right after the prefix itself, so the
        // scan begins at the prefix and stops at the first key outside it.
        // Byte-exact, unlike LIKE (case-insensitive ASCII, %/_ wildcards).
        let mut stmt = self.conn.prepare(&format!(
            "SELECT item_key FROM \"{collection}\"
             WHERE conversation_key = ?1 AND item_key > ?2
             ORDER BY item_key LIMIT {PAGE_SIZE}"
        ))?;
        let mut keys = Vec::new();
        let mut last = prefix.to_string();
        'pages: loop {
            let page: Vec<String> = stmt
                .query_map(params![conversation_key, last], |row| row.get(0))?
                .collect::<Result<_, _>>()?;
            let full_page = page.len() == PAGE_SIZE;
            let Some(tail) = page.last() else { break };
            last = tail.clone();
            for key in page {
                if !key.starts_with(prefix) {
                    break 'pages;
                }
                keys.push(key);
            }
            if !full_page {
                break;
            }
        }
        debug!(collection, conversation_key, count = keys.len(), "queried item keys");
        Ok(keys)
    }

    /// Fetch a single item, if present.
    pub fn get_item(
        &self,
        collection: &str,
        conversation_key: &str,
        item_key: &str,
    ) -> Result<Option<StoredItem>, StoreError> {
        if !self.collection_exists(collection)? {
            return Ok(None);
        }
        let item = self
            .conn
            .query_row(
                &format!(
                    "SELECT conversation_key, item_key, ts, author, content, embedding
                     FROM \"{collection}\" WHERE conversation_key = ?1 AND item_key = ?2"
                ),
                params![conversation_key, item_key],
                |row| {
                    let embedding: Option<String> = row.get(5)?;
                    Ok(StoredItem {
                        conversation_key: row.get(0)?,
                        item_key: row.get(1)?,
                        timestamp: row.get(2)?,
                        author: row.get(3)?,
                        content: row.get(4)?,
                        embedding: embedding
                            .map(|joined| joined.split(',').map(str::to_string).collect()),
                    })
                },
            )
            .optional()?;
        Ok(item)
    }

    /// Apply deletes and puts against one conversation partition.
    ///
    /// The collection is created lazily, then the combined operation list is
    /// applied in chunks of [`BATCH_SIZE`], each chunk in its own
    /// transaction. Puts use last-writer-wins upsert semantics.
    pub fn batch_write(
        &mut self,
        collection: &str,
        conversation_key: &str,
        deletes: &[String],
        puts: &[StoredItem],
    ) -> Result<(), StoreError> {
        self.create_collection(collection)?;

        enum Op<'a> {
            Delete(&'a str),
            Put(&'a StoredItem),
        }

        let ops: Vec<Op> = deletes
            .iter()
            .map(|key| Op::Delete(key))
            .chain(puts.iter().map(Op::Put))
            .collect();

        for chunk in ops.chunks(BATCH_SIZE) {
            let tx = self.conn.transaction()?;
            for op in chunk {
                match op {
                    Op::Delete(item_key) => {
                        tx.execute(
                            &format!(
                                "DELETE FROM \"{collection}\"
                                 WHERE conversation_key = ?1 AND item_key = ?2"
                            ),
                            params![conversation_key, item_key],
                        )?;
                    }
                    Op::Put(item) => {
                        let embedding = item.embedding.as_ref().map(|parts| parts.join(","));
                        tx.execute(
                            &format!(
                                "INSERT OR REPLACE INTO \"{collection}\"
                                 (conversation_key, item_key, ts, author, content, embedding)
                                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
                            ),
                            params![
                                item.conversation_key,
                                item.item_key,
                                item.timestamp,
                                item.author,
                                item.content,
                                embedding
                            ],
                        )?;
                    }
                }
            }
            tx.commit()?;
        }
        debug!(
            collection,
            conversation_key,
            deletes = deletes.len(),
            puts = puts.len(),
            "batch write applied"
        );
        Ok(())
    }
}
