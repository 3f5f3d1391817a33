pub mod cache;
pub mod client;
pub mod memory;
pub mod stream;

pub use cache::SnapshotCache;
pub use client::RealtimeDb;
pub use memory::MemorySource;

use serde_json::Value;
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;

/// A path-addressed JSON document store.
///
/// `None` is the store's "no data at this path" answer, not an error.
pub trait DocumentSource: Clone + Send + Sync + 'static {
    /// Read the document at `path` once
    fn get(&self, path: &str) -> impl Future<Output = Result<Option<Value>>> + Send;

    /// Follow the document at `path`. Every item is the full document,
    /// starting with its current value.
    fn subscribe(&self, path: &str) -> Subscription;
}

/// A live feed of snapshots for one path. Dropping it stops the feed.
#[derive(Debug)]
pub struct Subscription {
    path: String,
    rx: mpsc::UnboundedReceiver<Result<Option<Value>>>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Spawn `run` as the producer of this subscription
    pub fn spawn<F, Fut>(path: &str, run: F) -> Self
    where
        F: FnOnce(mpsc::UnboundedSender<Result<Option<Value>>>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(tx));
        Self {
            path: path.to_string(),
            rx,
            task,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Wait for the next snapshot. Returns None once the feed has ended.
    pub async fn next(&mut self) -> Option<Result<Option<Value>>> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Join path segments into a store path without leading or trailing slashes
pub fn join_path(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a store path into its segments
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}
