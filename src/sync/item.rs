//! Persisted item model and key construction.
//!
//! Items are keyed by `(conversation_key, item_key)`. Message items use the
//! `MSG#` sort-key prefix; other prefixes are reserved for future metadata
//! and never touched by the sync path.

use crate::extract::CanonicalMessage;
use serde::{Deserialize, Serialize};

/// Partition-key prefix for conversations.
pub const CONV_PREFIX: &str = "CONV#";

/// Sort-key prefix for message items.
pub const MSG_PREFIX: &str = "MSG#";

pub fn conversation_key(conversation_id: &str) -> String {
    format!("{CONV_PREFIX}{conversation_id}")
}

pub fn message_key(message_id: &str) -> String {
    format!("{MSG_PREFIX}{message_id}")
}

/// Render a float as an exact decimal string.
///
/// Every numeric value passes through this before storage so that what is
/// written back out is the decimal form of the number as printed, not a
/// re-rounded binary float. Rust's `f64` Display emits the shortest decimal
/// string that round-trips, and never scientific notation.
pub fn decimal_string(value: f64) -> String {
    format!("{value}")
}

/// One persisted message item. Timestamps and embedding components are kept
/// as decimal strings end to end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem {
    pub conversation_key: String,
    pub item_key: String,
    pub timestamp: String,
    pub author: String,
    pub content: String,
    /// Reserved: populated by the (out-of-scope) embedding pipeline.
    pub embedding: Option<Vec<String>>,
}

impl StoredItem {
    /// Build the message item for a canonical message.
    pub fn from_message(conversation_id: &str, message: &CanonicalMessage) -> Self {
        Self {
            conversation_key: conversation_key(conversation_id),
            item_key: message_key(&message.message_id),
            timestamp: decimal_string(message.timestamp),
            author: message.author.as_str().to_string(),
            content: message.content.clone(),
            embedding: None,
        }
    }

    /// The message id carried in the sort key, if this is a message item.
    pub fn message_id(&self) -> Option<&str> {
        self.item_key.strip_prefix(MSG_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Author;

    #[test]
    fn keys_carry_prefixes() {
        assert_eq!(conversation_key("conv1"), "CONV#conv1");
        assert_eq!(message_key("msg1"), "MSG#msg1");
    }

    #[test]
    fn decimal_strings_are_exact_and_round_trip() {
        assert_eq!(decimal_string(1.0), "1");
        assert_eq!(decimal_string(1.5), "1.5");
        let ts = 1743275703.882098_f64;
        let printed = decimal_string(ts);
        assert_eq!(printed.parse::<f64>().unwrap(), ts);
        // No scientific notation even for extreme magnitudes.
        assert!(!decimal_string(1e-10).contains('e'));
        assert!(!decimal_string(1e20).contains('e'));
    }

    #[test]
    fn item_from_message() {
        let message = CanonicalMessage {
            message_id: "msg1".into(),
            timestamp: 2.0,
            author: Author::Assistant,
            content: "Hi there!".into(),
        };
        let item = StoredItem::from_message("conv1", &message);
        assert_eq!(item.conversation_key, "CONV#conv1");
        assert_eq!(item.item_key, "MSG#msg1");
        assert_eq!(item.timestamp, "2");
        assert_eq!(item.author, "assistant");
        assert_eq!(item.message_id(), Some("msg1"));
        assert!(item.embedding.is_none());
    }
}
