use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Get the platform-appropriate snapshot cache directory
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("live-standings/snapshots"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/live-standings/snapshots",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}

/// Remove every cached snapshot
pub fn clear_cache() -> Result<()> {
    let cache_path = get_cache_path();
    match std::fs::remove_dir_all(&cache_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove cache directory"),
    }
}

/// A cached document with the time it was seen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSnapshot {
    /// Cache key the entry belongs to. Keeps content unique per key, so
    /// removing one key's content never touches another's.
    #[serde(default)]
    pub key: String,
    pub value: Value,
    pub stored_at: u64, // Unix timestamp
}

/// Last document seen per store path, so a restart can show the previous
/// board until live data arrives.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    cache_path: PathBuf,
    namespace: String, // database URL, keeps databases apart
    enabled: bool,     // false when --no-cache
}

impl SnapshotCache {
    pub fn new(cache_path: PathBuf, namespace: &str) -> Self {
        Self {
            cache_path,
            namespace: namespace.to_string(),
            enabled: true,
        }
    }

    /// A cache that never stores or returns anything
    pub fn disabled() -> Self {
        Self {
            cache_path: PathBuf::new(),
            namespace: String::new(),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn key(&self, path: &str) -> String {
        format!("{}|{}", self.namespace, path)
    }

    /// Read the last document stored for `path`
    pub fn load(&self, path: &str) -> Option<CachedSnapshot> {
        if !self.enabled {
            return None;
        }
        let bytes = cacache::read_sync(&self.cache_path, self.key(path)).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Remember `value` as the latest document at `path`.
    ///
    /// Unchanged documents are not written again, and the previous entry is
    /// removed before a new one is written, so each path holds at most one
    /// content file.
    pub fn store(&self, path: &str, value: &Value) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.load(path).is_some_and(|previous| previous.value == *value) {
            return Ok(());
        }

        let key = self.key(path);
        if let Ok(Some(_)) = cacache::metadata_sync(&self.cache_path, &key) {
            cacache::RemoveOpts::new()
                .remove_fully(true)
                .remove_sync(&self.cache_path, &key)
                .with_context(|| format!("Failed to drop cached snapshot for {}", path))?;
        }

        let entry = CachedSnapshot {
            key: key.clone(),
            value: value.clone(),
            stored_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
        };
        let json = serde_json::to_vec(&entry)?;
        cacache::write_sync(&self.cache_path, &key, &json)
            .with_context(|| format!("Failed to cache snapshot for {}", path))?;
        Ok(())
    }
}
