//! Subscription wiring for a board context.
//!
//! A watch owns the tasks that read and follow one context's documents and
//! forwards what they produce, tagged with the context, into a channel.
//! Dropping the watch cancels everything it started.

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::board::{contests_path, BoardContext, Feed};
use crate::config::BoardConfig;
use crate::store::{DocumentSource, SnapshotCache, Subscription};

/// Where an update belongs
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateTarget {
    /// A per-contest document of a board context
    Feed(BoardContext, Feed),
    /// The contest index of the named board
    Contests(String),
}

/// A document (or a failure to get one) delivered by a watch
#[derive(Debug, Clone, PartialEq)]
pub struct StoreUpdate {
    pub target: UpdateTarget,
    pub payload: Result<Option<Value>, String>,
    /// Whether the document came from the snapshot cache rather than the store
    pub cached: bool,
    /// Generation of the watch that produced the update. A restarted watch
    /// on the same context gets a new one.
    pub generation: u64,
}

/// Forward one subscription into the channel until either side ends
fn forward<E>(
    mut subscription: Subscription,
    target: UpdateTarget,
    generation: u64,
    cache: SnapshotCache,
    tx: mpsc::UnboundedSender<E>,
) -> JoinHandle<()>
where
    E: From<StoreUpdate> + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(item) = subscription.next().await {
            if let Ok(Some(value)) = &item {
                if let Err(e) = cache.store(subscription.path(), value) {
                    debug!(error = %e, "Snapshot not cached");
                }
            }
            let update = StoreUpdate {
                target: target.clone(),
                payload: item.map_err(|e| e.to_string()),
                cached: false,
                generation,
            };
            if tx.send(E::from(update)).is_err() {
                return;
            }
        }
        debug!(path = subscription.path(), "Subscription ended");
    })
}

/// Send the cached copy of `path`, if any, ahead of live data
fn replay_cached<E>(
    cache: &SnapshotCache,
    path: &str,
    target: UpdateTarget,
    generation: u64,
    tx: &mpsc::UnboundedSender<E>,
) where
    E: From<StoreUpdate>,
{
    if let Some(snapshot) = cache.load(path) {
        debug!(path, stored_at = snapshot.stored_at, "Replaying cached snapshot");
        let _ = tx.send(E::from(StoreUpdate {
            target,
            payload: Ok(Some(snapshot.value)),
            cached: true,
            generation,
        }));
    }
}

/// Live feeds of one board context
#[derive(Debug)]
pub struct BoardWatch {
    context: BoardContext,
    generation: u64,
    tasks: Vec<JoinHandle<()>>,
}

impl BoardWatch {
    /// Read the task list once and follow standings and last update
    pub fn start<S, E>(
        source: &S,
        context: BoardContext,
        generation: u64,
        cache: &SnapshotCache,
        tx: mpsc::UnboundedSender<E>,
    ) -> Self
    where
        S: DocumentSource,
        E: From<StoreUpdate> + Send + 'static,
    {
        debug!(board = %context.board.name, contest = %context.contest, "Starting watch");
        let mut tasks = Vec::new();

        for feed in [Feed::Tasks, Feed::Standings, Feed::LastUpdated] {
            replay_cached(
                cache,
                &context.path(feed),
                UpdateTarget::Feed(context.clone(), feed),
                generation,
                &tx,
            );
        }

        // Task list: one-shot read
        {
            let source = source.clone();
            let path = context.tasks_path();
            let target = UpdateTarget::Feed(context.clone(), Feed::Tasks);
            let cache = cache.clone();
            let tx = tx.clone();
            tasks.push(tokio::spawn(async move {
                let result = source.get(&path).await;
                match &result {
                    Ok(Some(value)) => {
                        if let Err(e) = cache.store(&path, value) {
                            debug!(error = %e, "Snapshot not cached");
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(path = %path, error = %e, "Failed to read tasks"),
                }
                let _ = tx.send(E::from(StoreUpdate {
                    target,
                    payload: result.map_err(|e| e.to_string()),
                    cached: false,
                    generation,
                }));
            }));
        }

        for feed in [Feed::Standings, Feed::LastUpdated] {
            let subscription = source.subscribe(&context.path(feed));
            tasks.push(forward(
                subscription,
                UpdateTarget::Feed(context.clone(), feed),
                generation,
                cache.clone(),
                tx.clone(),
            ));
        }

        Self {
            context,
            generation,
            tasks,
        }
    }

    pub fn context(&self) -> &BoardContext {
        &self.context
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for BoardWatch {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Live contest index of one board
#[derive(Debug)]
pub struct ContestWatch {
    board: String,
    task: JoinHandle<()>,
}

impl ContestWatch {
    pub fn start<S, E>(
        source: &S,
        board: &BoardConfig,
        generation: u64,
        cache: &SnapshotCache,
        tx: mpsc::UnboundedSender<E>,
    ) -> Self
    where
        S: DocumentSource,
        E: From<StoreUpdate> + Send + 'static,
    {
        let path = contests_path(board);
        let target = UpdateTarget::Contests(board.name.clone());
        replay_cached(cache, &path, target.clone(), generation, &tx);
        let task = forward(source.subscribe(&path), target, generation, cache.clone(), tx);
        Self {
            board: board.name.clone(),
            task,
        }
    }

    pub fn board(&self) -> &str {
        &self.board
    }
}

impl Drop for ContestWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardMode;
    use crate::store::MemorySource;
    use serde_json::json;
    use std::time::Duration;

    fn board() -> BoardConfig {
        BoardConfig {
            name: "no-spons".to_string(),
            root: "atcoder/no-spons".to_string(),
            mode: BoardMode::Ranked,
        }
    }

    async fn recv(rx: &mut mpsc::UnboundedReceiver<StoreUpdate>) -> StoreUpdate {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for update")
            .expect("channel closed")
    }

    /// Collect updates until one matching `feed` arrives
    async fn recv_feed(rx: &mut mpsc::UnboundedReceiver<StoreUpdate>, feed: Feed) -> StoreUpdate {
        loop {
            let update = recv(rx).await;
            if matches!(&update.target, UpdateTarget::Feed(_, f) if *f == feed) {
                return update;
            }
        }
    }

    #[tokio::test]
    async fn test_watch_delivers_all_feeds() {
        let source = MemorySource::new();
        source.set("atcoder/no-spons/tasks/abc300", json!([{"title": "A", "dataIndex": "a"}]));
        source.set("atcoder/no-spons/standings/abc300", json!([{"name": "alice"}]));
        source.set("atcoder/no-spons/last_updated/abc300", json!(1700000000));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let context = BoardContext::new(board(), "abc300");
        let watch = BoardWatch::start(&source, context.clone(), 7, &SnapshotCache::disabled(), tx);
        assert_eq!(watch.generation(), 7);

        let mut seen = Vec::new();
        for _ in 0..3 {
            let update = recv(&mut rx).await;
            match update.target {
                UpdateTarget::Feed(ctx, feed) => {
                    assert_eq!(ctx, context);
                    assert_eq!(update.generation, 7);
                    assert!(update.payload.unwrap().is_some());
                    seen.push(feed);
                }
                other => panic!("unexpected target {:?}", other),
            }
        }
        seen.sort_by_key(|f| format!("{:?}", f));
        assert_eq!(seen, vec![Feed::LastUpdated, Feed::Standings, Feed::Tasks]);
    }

    #[tokio::test]
    async fn test_watch_follows_changes() {
        let source = MemorySource::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _watch = BoardWatch::start(
            &source,
            BoardContext::new(board(), "abc300"),
            0,
            &SnapshotCache::disabled(),
            tx,
        );

        let first = recv_feed(&mut rx, Feed::Standings).await;
        assert_eq!(first.payload, Ok(None));

        source.set("atcoder/no-spons/standings/abc300", json!([{"name": "bob"}]));
        let second = recv_feed(&mut rx, Feed::Standings).await;
        assert_eq!(second.payload, Ok(Some(json!([{"name": "bob"}]))));
    }

    #[tokio::test]
    async fn test_dropped_watch_delivers_nothing_more() {
        let source = MemorySource::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let watch = BoardWatch::start(
            &source,
            BoardContext::new(board(), "abc300"),
            0,
            &SnapshotCache::disabled(),
            tx,
        );
        recv_feed(&mut rx, Feed::Standings).await;
        recv_feed(&mut rx, Feed::LastUpdated).await;
        drop(watch);

        source.set("atcoder/no-spons/standings/abc300", json!([{"name": "late"}]));
        // Every sender was owned by an aborted task, so the channel drains and closes
        let rest = tokio::time::timeout(Duration::from_secs(1), async {
            let mut rest = Vec::new();
            while let Some(update) = rx.recv().await {
                rest.push(update);
            }
            rest
        })
        .await
        .expect("channel did not close");
        assert!(rest
            .iter()
            .all(|u| u.payload != Ok(Some(json!([{"name": "late"}])))));
    }

    #[tokio::test]
    async fn test_cached_snapshot_is_replayed_first() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(dir.path().to_path_buf(), "memory");
        cache
            .store("atcoder/no-spons/standings/abc300", &json!([{"name": "cached"}]))
            .unwrap();

        let source = MemorySource::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _watch = BoardWatch::start(&source, BoardContext::new(board(), "abc300"), 3, &cache, tx);

        let first = recv(&mut rx).await;
        assert!(first.cached);
        assert_eq!(first.generation, 3);
        assert_eq!(first.payload, Ok(Some(json!([{"name": "cached"}]))));
    }

    #[tokio::test]
    async fn test_contest_watch() {
        let source = MemorySource::new();
        source.set("atcoder/no-spons/last_updated", json!({"abc300": 1700000000}));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let watch = ContestWatch::start(&source, &board(), 2, &SnapshotCache::disabled(), tx);
        assert_eq!(watch.board(), "no-spons");

        let update = recv(&mut rx).await;
        assert_eq!(update.target, UpdateTarget::Contests("no-spons".to_string()));
        assert_eq!(update.payload, Ok(Some(json!({"abc300": 1700000000}))));
        assert_eq!(update.generation, 2);
    }
}
