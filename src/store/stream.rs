//! The local document tree a streaming subscription keeps in sync with the
//! server's `put` and `patch` events.

use eventsource_stream::Event;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::path_segments;
use crate::error::{Result, StoreError};

#[derive(Debug, Deserialize)]
struct EventPayload {
    path: String,
    data: Value,
}

/// Local copy of the subscribed document
#[derive(Debug, Default, Clone)]
pub struct DocumentTree {
    root: Value,
}

impl DocumentTree {
    /// Current document, None when the path holds no data
    pub fn snapshot(&self) -> Option<Value> {
        if self.root.is_null() {
            None
        } else {
            Some(self.root.clone())
        }
    }

    /// Replace the value at `path` (relative to the document root).
    /// Writing null deletes, and parents left empty disappear with it.
    pub fn put(&mut self, path: &str, value: Value) {
        write(&mut self.root, &path_segments(path), value);
    }

    /// Merge the children of `value` into the node at `path`
    pub fn patch(&mut self, path: &str, value: Value) {
        let base = path_segments(path);
        match value {
            Value::Object(children) => {
                for (key, child) in children {
                    let mut segments = base.clone();
                    segments.push(&key);
                    write(&mut self.root, &segments, child);
                }
            }
            other => write(&mut self.root, &base, other),
        }
    }

    /// Read the value at `path`
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut node = &self.root;
        for segment in path_segments(path) {
            node = match node {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        if node.is_null() {
            None
        } else {
            Some(node)
        }
    }

    /// Apply one stream event. Returns the new full document when the event
    /// changed it, None for events that carry no data.
    pub fn apply(&mut self, event: &Event, subscribed: &str) -> Result<Option<Option<Value>>> {
        match event.event.as_str() {
            "put" | "patch" => {
                let payload: EventPayload = serde_json::from_str(&event.data)
                    .map_err(|e| StoreError::BadEvent(format!("{}: {}", event.event, e)))?;
                if event.event == "put" {
                    self.put(&payload.path, payload.data);
                } else {
                    self.patch(&payload.path, payload.data);
                }
                Ok(Some(self.snapshot()))
            }
            "keep-alive" => Ok(None),
            "cancel" => Err(StoreError::StreamClosed {
                path: subscribed.to_string(),
                reason: cancel_reason(&event.data),
            }),
            "auth_revoked" => Err(StoreError::StreamClosed {
                path: subscribed.to_string(),
                reason: "auth token revoked".to_string(),
            }),
            other => {
                debug!(event = other, "Ignoring unknown stream event");
                Ok(None)
            }
        }
    }
}

fn cancel_reason(data: &str) -> String {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::String(reason)) => reason,
        Ok(Value::Null) | Err(_) if data.trim().is_empty() || data.trim() == "null" => {
            "cancelled".to_string()
        }
        _ => data.to_string(),
    }
}

/// Arrays cannot take keyed writes, so they become index-keyed objects
fn array_to_object(items: Vec<Value>) -> Value {
    Value::Object(
        items
            .into_iter()
            .enumerate()
            .filter(|(_, v)| !v.is_null())
            .map(|(i, v)| (i.to_string(), v))
            .collect::<Map<String, Value>>(),
    )
}

fn write(node: &mut Value, segments: &[&str], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    if let Value::Array(items) = node {
        let items = std::mem::take(items);
        *node = array_to_object(items);
    }
    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    if rest.is_empty() && value.is_null() {
        map.remove(*first);
    } else {
        let child = map.entry(first.to_string()).or_insert(Value::Null);
        write(child, rest, value);
        if child.is_null() {
            map.remove(*first);
        }
    }

    if map.is_empty() {
        *node = Value::Null;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(name: &str, data: &str) -> Event {
        Event {
            event: name.to_string(),
            data: data.to_string(),
            id: String::new(),
            retry: None,
        }
    }

    fn put_event(path: &str, data: Value) -> Event {
        event("put", &json!({"path": path, "data": data}).to_string())
    }

    #[test]
    fn test_put_root_replaces_document() {
        let mut tree = DocumentTree::default();
        let snapshot = tree.apply(&put_event("/", json!({"a": 1})), "p").unwrap();
        assert_eq!(snapshot, Some(Some(json!({"a": 1}))));

        let snapshot = tree.apply(&put_event("/", Value::Null), "p").unwrap();
        assert_eq!(snapshot, Some(None));
    }

    #[test]
    fn test_put_nested_into_array_document() {
        let mut tree = DocumentTree::default();
        tree.put(
            "/",
            json!([
                {"name": "alice", "t1": {"point": 0}},
                {"name": "bob"}
            ]),
        );
        tree.put("/0/t1", json!({"point": 100, "elapsed": 30, "penalty": 0}));

        assert_eq!(tree.get("/0/t1/point"), Some(&json!(100)));
        assert_eq!(tree.get("/1/name"), Some(&json!("bob")));
        let standings = crate::standings::parse_standings(&tree.snapshot().unwrap());
        assert_eq!(standings.len(), 2);
        assert_eq!(standings[0].name, "alice");
    }

    #[test]
    fn test_patch_merges_children() {
        let mut tree = DocumentTree::default();
        tree.put("/", json!({"abc300": 1, "abc301": 2}));
        let patch = event(
            "patch",
            &json!({"path": "/", "data": {"abc301": 5, "abc302": 6}}).to_string(),
        );
        tree.apply(&patch, "p").unwrap();
        assert_eq!(tree.snapshot(), Some(json!({"abc300": 1, "abc301": 5, "abc302": 6})));
    }

    #[test]
    fn test_delete_prunes_empty_parents() {
        let mut tree = DocumentTree::default();
        tree.put("/", json!({"a": {"b": {"c": 1}}, "d": 2}));
        tree.put("/a/b/c", Value::Null);
        assert_eq!(tree.snapshot(), Some(json!({"d": 2})));
        tree.put("/d", Value::Null);
        assert_eq!(tree.snapshot(), None);
    }

    #[test]
    fn test_delete_missing_path_is_noop() {
        let mut tree = DocumentTree::default();
        tree.put("/x/y", Value::Null);
        assert_eq!(tree.snapshot(), None);
    }

    #[test]
    fn test_keep_alive_and_unknown_events_carry_no_data() {
        let mut tree = DocumentTree::default();
        let keep_alive = event("keep-alive", "null");
        assert_eq!(tree.apply(&keep_alive, "p").unwrap(), None);

        let unknown = event("surprise", "");
        assert_eq!(tree.apply(&unknown, "p").unwrap(), None);
    }

    #[test]
    fn test_cancel_closes_stream() {
        let mut tree = DocumentTree::default();
        let cancel = event("cancel", "\"Permission denied\"");
        match tree.apply(&cancel, "atcoder/standings/x") {
            Err(StoreError::StreamClosed { path, reason }) => {
                assert_eq!(path, "atcoder/standings/x");
                assert_eq!(reason, "Permission denied");
            }
            other => panic!("expected StreamClosed, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        let mut tree = DocumentTree::default();
        let bad = event("put", "{not json");
        assert!(matches!(tree.apply(&bad, "p"), Err(StoreError::BadEvent(_))));
    }
}
