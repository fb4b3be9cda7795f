//! Data models for conversation-tree exports.
//!
//! These structures map to the export's JSON schema: a `mapping` of node id
//! to node, plus a `current_node` pointer. Every field is defaulted so a
//! sparsely populated node (structural roots, tool messages with exotic
//! content blocks) still deserializes instead of sinking the whole file.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Parent ids that mark the start of a conversation.
pub const ROOT_SENTINEL: &str = "client-created-root";

/// Author role attached to a message. Only `user` and `assistant` survive
/// into canonical output; everything else deserializes to `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Assistant,
    #[default]
    #[serde(other)]
    Other,
}

impl Author {
    /// Whether this role is retained on the canonical path.
    pub fn is_retained(self) -> bool {
        matches!(self, Author::User | Author::Assistant)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Author::User => "user",
            Author::Assistant => "assistant",
            Author::Other => "unknown",
        }
    }
}

/// `author` object inside a node message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorInfo {
    #[serde(default)]
    pub role: Author,
}

/// `content` object inside a node message. Parts may contain non-string
/// blocks (images, tool payloads); only string parts contribute text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub parts: Vec<Value>,
}

impl MessageContent {
    /// Trim each string part, drop empties, join with single spaces.
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| part.as_str())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Message payload carried by a mapping node.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeMessage {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub author: AuthorInfo,

    /// Creation timestamp (epoch seconds). Preferred over `update_time`.
    #[serde(default)]
    pub create_time: Option<f64>,

    /// Fallback timestamp when `create_time` is absent.
    #[serde(default)]
    pub update_time: Option<f64>,

    #[serde(default)]
    pub content: MessageContent,
}

impl NodeMessage {
    /// Resolve the message timestamp, preferring creation time.
    pub fn timestamp(&self) -> Option<f64> {
        self.create_time.or(self.update_time)
    }
}

/// One node in the edit tree. Nodes without a `message` are structural only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TreeNode {
    /// Parent node id; absent/null/empty/root marker all mean "root".
    #[serde(default)]
    pub parent: Option<String>,

    #[serde(default)]
    pub message: Option<NodeMessage>,
}

impl TreeNode {
    /// Whether the parent pointer terminates the walk.
    pub fn parent_is_root(&self) -> bool {
        match self.parent.as_deref() {
            None | Some("") | Some(ROOT_SENTINEL) => true,
            Some(_) => false,
        }
    }
}

/// A full conversation record: the flat node mapping plus the live edit tip.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationTree {
    #[serde(default)]
    pub mapping: HashMap<String, TreeNode>,

    #[serde(default)]
    pub current_node: Option<String>,
}

/// A flattened message on the canonical path. Field names are the external
/// contract for parsed output files and sync input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMessage {
    #[serde(rename = "MessageID", default)]
    pub message_id: String,

    #[serde(rename = "Timestamp", default)]
    pub timestamp: f64,

    #[serde(rename = "Author", default)]
    pub author: Author,

    #[serde(rename = "Content", default)]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_roles_deserialize_leniently() {
        let user: Author = serde_json::from_str("\"user\"").unwrap();
        let tool: Author = serde_json::from_str("\"tool\"").unwrap();
        assert!(user.is_retained());
        assert!(!tool.is_retained());
        assert_eq!(tool, Author::Other);
    }

    #[test]
    fn joined_text_skips_non_string_parts() {
        let content: MessageContent =
            serde_json::from_str(r#"{"parts": ["  Hello ", {"asset": "img"}, "", "world"]}"#)
                .unwrap();
        assert_eq!(content.joined_text(), "Hello world");
    }

    #[test]
    fn timestamp_prefers_create_time() {
        let msg: NodeMessage =
            serde_json::from_str(r#"{"create_time": 1.0, "update_time": 2.0}"#).unwrap();
        assert_eq!(msg.timestamp(), Some(1.0));

        let msg: NodeMessage = serde_json::from_str(r#"{"update_time": 2.5}"#).unwrap();
        assert_eq!(msg.timestamp(), Some(2.5));
    }

    #[test]
    fn root_sentinels() {
        let node: TreeNode = serde_json::from_str(r#"{"parent": null}"#).unwrap();
        assert!(node.parent_is_root());
        let node: TreeNode = serde_json::from_str(r#"{"parent": ""}"#).unwrap();
        assert!(node.parent_is_root());
        let node: TreeNode =
            serde_json::from_str(r#"{"parent": "client-created-root"}"#).unwrap();
        assert!(node.parent_is_root());
        let node: TreeNode = serde_json::from_str(r#"{"parent": "node1"}"#).unwrap();
        assert!(!node.parent_is_root());
    }

    #[test]
    fn canonical_message_external_field_names() {
        let msg = CanonicalMessage {
            message_id: "m1".into(),
            timestamp: 1.5,
            author: Author::User,
            content: "hi".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["MessageID"], "m1");
        assert_eq!(json["Timestamp"], 1.5);
        assert_eq!(json["Author"], "user");
        assert_eq!(json["Content"], "hi");
    }
}
