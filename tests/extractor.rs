//! Canonical-thread extraction over realistic export trees.

use chat_mirror::extract::{extract_canonical_thread, parse_export_file, Author};
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;

fn node(parent: Option<&str>, message: Option<Value>) -> Value {
    json!({ "parent": parent, "message": message })
}

fn message(id: &str, role: &str, create_time: Option<f64>, parts: Value) -> Value {
    json!({
        "id": id,
        "author": { "role": role },
        "create_time": create_time,
        "content": { "content_type": "text", "parts": parts }
    })
}

/// Root -> msg1 (user) -> msg2 (assistant) -> msg3 (user), tip at node3.
fn linear_export() -> Value {
    json!({
        "title": "Sample conversation",
        "current_node": "node3",
        "mapping": {
            "root": node(None, None),
            "node1": node(Some("root"), Some(message("msg1", "user", Some(1.0), json!(["Hello"])))),
            "node2": node(Some("node1"), Some(message("msg2", "assistant", Some(2.0), json!(["Hi there!"])))),
            "node3": node(Some("node2"), Some(message("msg3", "user", Some(3.0), json!(["How are you?"])))),
        }
    })
}

#[test]
fn linear_chain_extracts_in_thread_order() {
    let thread = extract_canonical_thread(&linear_export());

    assert_eq!(thread.len(), 3);
    assert_eq!(thread[0].message_id, "msg1");
    assert_eq!(thread[0].author, Author::User);
    assert_eq!(thread[0].content, "Hello");
    assert_eq!(thread[0].timestamp, 1.0);
    assert_eq!(thread[1].message_id, "msg2");
    assert_eq!(thread[1].author, Author::Assistant);
    assert_eq!(thread[1].content, "Hi there!");
    assert_eq!(thread[2].message_id, "msg3");
    assert_eq!(thread[2].content, "How are you?");
}

#[test]
fn extraction_is_deterministic() {
    let export = linear_export();
    let first = extract_canonical_thread(&export);
    let second = extract_canonical_thread(&export);
    assert_eq!(first, second);
}

#[test]
fn edited_branch_wins_and_orphan_is_excluded() {
    // node2_orig and node2_edited are siblings; current_node descends from
    // the edited branch, so the original reply never appears.
    let export = json!({
        "current_node": "node3",
        "mapping": {
            "root": node(None, None),
            "node1": node(Some("root"), Some(message("msg1", "user", Some(1.0), json!(["Question"])))),
            "node2_orig": node(Some("node1"), Some(message("msg2a", "assistant", Some(2.0), json!(["First answer"])))),
            "node2_edited": node(Some("node1"), Some(message("msg2b", "assistant", Some(2.5), json!(["Better answer"])))),
            "node3": node(Some("node2_edited"), Some(message("msg3", "user", Some(3.0), json!(["Thanks"])))),
        }
    });

    let thread = extract_canonical_thread(&export);
    let ids: Vec<&str> = thread.iter().map(|m| m.message_id.as_str()).collect();
    assert_eq!(ids, vec!["msg1", "msg2b", "msg3"]);
}

#[test]
fn non_retained_roles_and_empty_content_are_skipped() {
    let export = json!({
        "current_node": "node4",
        "mapping": {
            "root": node(None, None),
            "node1": node(Some("root"), Some(message("msg1", "user", Some(1.0), json!(["Hello"])))),
            // Tool output on the path is dropped but does not break the walk.
            "node2": node(Some("node1"), Some(message("msg2", "tool", Some(2.0), json!(["{\"result\": 4}"])))),
            // Whitespace-only parts join to nothing.
            "node3": node(Some("node2"), Some(message("msg3", "assistant", Some(3.0), json!(["  ", ""])))),
            "node4": node(Some("node3"), Some(message("msg4", "assistant", Some(4.0), json!(["Answer"])))),
        }
    });

    let thread = extract_canonical_thread(&export);
    let ids: Vec<&str> = thread.iter().map(|m| m.message_id.as_str()).collect();
    assert_eq!(ids, vec!["msg1", "msg4"]);
}

#[test]
fn update_time_is_a_timestamp_fallback() {
    let export = json!({
        "current_node": "node1",
        "mapping": {
            "node1": node(None, Some(json!({
                "id": "msg1",
                "author": { "role": "user" },
                "create_time": null,
                "update_time": 1.5,
                "content": { "parts": ["Edited later"] }
            }))),
        }
    });

    let thread = extract_canonical_thread(&export);
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].timestamp, 1.5);
}

#[test]
fn messages_without_any_timestamp_are_dropped() {
    let export = json!({
        "current_node": "node2",
        "mapping": {
            "node1": node(None, Some(message("msg1", "user", Some(1.0), json!(["kept"])))),
            "node2": node(Some("node1"), Some(json!({
                "id": "msg2",
                "author": { "role": "assistant" },
                "content": { "parts": ["no clock"] }
            }))),
        }
    });

    let thread = extract_canonical_thread(&export);
    let ids: Vec<&str> = thread.iter().map(|m| m.message_id.as_str()).collect();
    assert_eq!(ids, vec!["msg1"]);
}

#[test]
fn non_string_parts_are_ignored_within_a_message() {
    let export = json!({
        "current_node": "node1",
        "mapping": {
            "node1": node(None, Some(message(
                "msg1",
                "user",
                Some(1.0),
                json!(["Look at", {"asset_pointer": "file://img"}, "this"])
            ))),
        }
    });

    let thread = extract_canonical_thread(&export);
    assert_eq!(thread[0].content, "Look at this");
}

#[test]
fn parse_export_file_accepts_array_wrapped_records() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("conv1.json");
    fs::write(&path, serde_json::to_string(&json!([linear_export()])).unwrap()).unwrap();

    let thread = parse_export_file(&path).unwrap();
    assert_eq!(thread.len(), 3);
}

#[test]
fn parse_export_file_rejects_invalid_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{not json").unwrap();

    assert!(parse_export_file(&path).is_err());
}

#[test]
fn unrecognized_top_level_shapes_yield_empty_threads() {
    let dir = tempdir().unwrap();

    for (name, body) in [("num.json", "42"), ("empty_array.json", "[]")] {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        assert!(parse_export_file(&path).unwrap().is_empty());
    }
}
