use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

use super::stream::DocumentTree;
use super::{DocumentSource, Subscription};
use crate::error::Result;

/// In-process document store. Writes are visible to every subscriber of an
/// affected path, which makes it a stand-in for the realtime database in
/// tests and offline demos.
#[derive(Debug, Clone)]
pub struct MemorySource {
    tree: Arc<Mutex<DocumentTree>>,
    version: Arc<watch::Sender<u64>>,
}

impl Default for MemorySource {
    fn default() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            tree: Arc::new(Mutex::new(DocumentTree::default())),
            version: Arc::new(version),
        }
    }
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    fn tree(&self) -> MutexGuard<'_, DocumentTree> {
        self.tree.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the document at `path`; null deletes it
    pub fn set(&self, path: &str, value: Value) {
        self.tree().put(path, value);
        self.version.send_modify(|v| *v += 1);
    }

    fn read(&self, path: &str) -> Option<Value> {
        self.tree().get(path).cloned()
    }
}

impl DocumentSource for MemorySource {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        Ok(self.read(path))
    }

    fn subscribe(&self, path: &str) -> Subscription {
        let source = self.clone();
        let owned = path.to_string();
        let mut changes = self.version.subscribe();

        Subscription::spawn(path, move |tx| async move {
            let mut last = source.read(&owned);
            if tx.send(Ok(last.clone())).is_err() {
                return;
            }
            while changes.changed().await.is_ok() {
                let current = source.read(&owned);
                if current == last {
                    continue;
                }
                if tx.send(Ok(current.clone())).is_err() {
                    return;
                }
                last = current;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_reads_nested_paths() {
        let source = MemorySource::new();
        source.set("atcoder/last_updated", json!({"abc300": 1700000000}));

        assert_eq!(
            source.get("atcoder/last_updated/abc300").await.unwrap(),
            Some(json!(1700000000))
        );
        assert_eq!(source.get("atcoder/tasks/abc300").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_subscribe_starts_with_current_value() {
        let source = MemorySource::new();
        let mut sub = source.subscribe("a/b");
        assert_eq!(sub.next().await.unwrap().unwrap(), None);

        source.set("a/b", json!(1));
        assert_eq!(sub.next().await.unwrap().unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_unrelated_writes_are_not_delivered() {
        let source = MemorySource::new();
        source.set("a/b", json!(1));
        let mut sub = source.subscribe("a/b");
        assert_eq!(sub.next().await.unwrap().unwrap(), Some(json!(1)));

        source.set("a/c", json!(2));
        source.set("a/b", json!(3));
        assert_eq!(sub.next().await.unwrap().unwrap(), Some(json!(3)));
    }

    #[tokio::test]
    async fn test_delete_delivers_no_data() {
        let source = MemorySource::new();
        source.set("a/b", json!({"x": 1}));
        let mut sub = source.subscribe("a/b");
        sub.next().await.unwrap().unwrap();

        source.set("a/b", Value::Null);
        assert_eq!(sub.next().await.unwrap().unwrap(), None);
    }
}
