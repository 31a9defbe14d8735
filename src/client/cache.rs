//! Keyed query cache with staleness and prefix invalidation
//!
//! Keys are JSON arrays such as `["/api/markets", 7, "bets"]`. Invalidating a
//! key drops every entry whose key starts with the same elements, so
//! `["/api/markets"]` clears the list, every single-market entry and every
//! market's bet list at once.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use super::error::ClientResult;

/// Default freshness window for cached reads
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Identifier of a cached read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryKey(Vec<Value>);

impl QueryKey {
    pub fn new(root: &str) -> Self {
        Self(vec![Value::from(root)])
    }

    /// Append a key segment
    pub fn with(mut self, part: impl Into<Value>) -> Self {
        self.0.push(part.into());
        self
    }

    /// Append a serializable filter object. Unset fields are dropped so that
    /// equal filters always produce equal keys.
    pub fn with_params<P: Serialize>(mut self, params: &P) -> Self {
        let value = serde_json::to_value(params).unwrap_or(Value::Null);
        let value = match value {
            Value::Object(map) => {
                Value::Object(map.into_iter().filter(|(_, v)| !v.is_null()).collect())
            }
            other => other,
        };
        self.0.push(value);
        self
    }

    pub fn parts(&self) -> &[Value] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Stable string form used as the map key
    fn canonical(&self) -> String {
        Value::Array(self.0.clone()).to_string()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    key: QueryKey,
    data: Value,
    fetched_at: Instant,
}

/// Cache behavior knobs
#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    pub stale_time: Duration,
    pub refetch_on_focus: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            refetch_on_focus: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    options: CacheOptions,
}

impl QueryCache {
    pub fn new(options: CacheOptions) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            options,
        }
    }

    pub fn with_stale_time(stale_time: Duration) -> Self {
        Self::new(CacheOptions {
            stale_time,
            ..Default::default()
        })
    }

    pub fn options(&self) -> CacheOptions {
        self.options
    }

    /// Cached value for `key` if it was fetched within the stale window
    pub async fn get_fresh<T: DeserializeOwned>(&self, key: &QueryKey, now: Instant) -> Option<T> {
        let entries = self.entries.read().await;
        let entry = entries.get(&key.canonical())?;
        if now.saturating_duration_since(entry.fetched_at) >= self.options.stale_time {
            return None;
        }
        serde_json::from_value(entry.data.clone()).ok()
    }

    pub async fn insert<T: Serialize>(&self, key: QueryKey, data: &T, now: Instant) {
        let Ok(data) = serde_json::to_value(data) else {
            return;
        };
        self.entries.write().await.insert(
            key.canonical(),
            CacheEntry {
                key,
                data,
                fetched_at: now,
            },
        );
    }

    /// Serve from cache when fresh, otherwise run `fetch` and store the result.
    /// Failed fetches are not cached.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> ClientResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        if let Some(hit) = self.get_fresh(&key, Instant::now()).await {
            debug!("Cache hit {}", key.canonical());
            return Ok(hit);
        }
        let data = fetch().await?;
        self.insert(key, &data, Instant::now()).await;
        Ok(data)
    }

    /// Drop every entry whose key starts with `prefix`; returns how many
    pub async fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.key.starts_with(prefix));
        let dropped = before - entries.len();
        if dropped > 0 {
            debug!("Invalidated {} cached queries under {}", dropped, prefix.canonical());
        }
        dropped
    }

    /// Window-focus hook: clears everything only when refetch on focus is on
    pub async fn on_focus(&self) -> usize {
        if !self.options.refetch_on_focus {
            return 0;
        }
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        dropped
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
