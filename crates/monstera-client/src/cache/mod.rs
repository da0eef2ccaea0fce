//! Client memoization keyed by preset, version and environment

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use monstera_core::{Environment, Preset};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::ApiClient;
use crate::ClientResult;

/// Default maximum number of cached clients
pub const DEFAULT_CAPACITY: usize = 20;

/// Identity of a cached client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub preset: Preset,
    pub version: Option<String>,
    pub environment: Option<Environment>,
    /// Distinguishes otherwise identical clients, e.g. per-token clients
    pub scope: Option<String>,
}

impl CacheKey {
    pub fn new(preset: Preset) -> Self {
        Self {
            preset,
            version: None,
            environment: None,
            scope: None,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

/// Renders as `preset[@version][/environment][#scope]`
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.preset)?;
        if let Some(version) = &self.version {
            write!(f, "@{}", version)?;
        }
        if let Some(environment) = &self.environment {
            write!(f, "/{}", environment)?;
        }
        if let Some(scope) = &self.scope {
            write!(f, "#{}", scope)?;
        }
        Ok(())
    }
}

/// A cached client and its usage
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub client: Arc<ApiClient>,
    pub hits: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: String, client: Arc<ApiClient>) -> Self {
        let now = Utc::now();
        Self {
            key,
            client,
            hits: 0,
            created_at: now,
            last_accessed: now,
        }
    }

    /// Time since the entry was stored
    pub fn age(&self) -> Duration {
        (Utc::now() - self.created_at).to_std().unwrap_or_default()
    }

    fn touch(&mut self) -> Arc<ApiClient> {
        self.hits += 1;
        self.last_accessed = Utc::now();
        Arc::clone(&self.client)
    }

    fn snapshot(&self) -> CacheEntrySnapshot {
        CacheEntrySnapshot {
            key: self.key.clone(),
            preset: self.client.preset(),
            base_url: self.client.base_url().to_string(),
            hits: self.hits,
            created_at: self.created_at,
            last_accessed: self.last_accessed,
        }
    }
}

/// Debug view of an entry, without the client itself
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntrySnapshot {
    pub key: String,
    pub preset: Preset,
    pub base_url: String,
    pub hits: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_hits: u64,
    pub total_misses: u64,
    /// `hits / (hits + misses)`, 0 before any lookup
    pub average_hit_rate: f64,
}

/// Bounded in-memory client cache with least-recently-used eviction
#[derive(Debug)]
pub struct ClientCache {
    entries: DashMap<String, CacheEntry>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for ClientCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up a client, counting a hit or a miss
    pub fn get(&self, key: &str) -> Option<Arc<ApiClient>> {
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.touch())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Look up a client without touching counters or access times
    pub fn peek(&self, key: &str) -> Option<Arc<ApiClient>> {
        self.entries.get(key).map(|entry| Arc::clone(&entry.client))
    }

    /// Store a client, evicting the least recently used entries when full
    pub fn put(&self, key: impl Into<String>, client: Arc<ApiClient>) {
        let key = key.into();
        self.entries.insert(key.clone(), CacheEntry::new(key.clone(), client));
        debug!(key = %key, "Cached API client");
        self.trim_to_capacity(&key);
    }

    /// Return the cached client for `key`, building and storing one on a miss.
    ///
    /// `build` runs without any cache lock held. Concurrent callers for the
    /// same key may each build, but all of them get the instance that was
    /// stored first; the other builds are dropped.
    pub fn get_or_try_insert_with<F>(&self, key: &str, build: F) -> ClientResult<Arc<ApiClient>>
    where
        F: FnOnce() -> ClientResult<Arc<ApiClient>>,
    {
        if let Some(client) = self.get(key) {
            return Ok(client);
        }

        let built = build()?;
        let client = match self.entries.entry(key.to_string()) {
            // Lost a race with another builder
            Entry::Occupied(mut entry) => return Ok(entry.get_mut().touch()),
            Entry::Vacant(entry) => {
                entry.insert(CacheEntry::new(key.to_string(), Arc::clone(&built)));
                built
            }
        };
        debug!(key = %key, "Cached API client");
        self.trim_to_capacity(key);
        Ok(client)
    }

    pub fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!("Cleared client cache");
    }

    pub fn stats(&self) -> CacheStats {
        let total_hits = self.hits.load(Ordering::Relaxed);
        let total_misses = self.misses.load(Ordering::Relaxed);
        let lookups = total_hits + total_misses;

        CacheStats {
            total_entries: self.entries.len(),
            total_hits,
            total_misses,
            average_hit_rate: if lookups == 0 {
                0.0
            } else {
                total_hits as f64 / lookups as f64
            },
        }
    }

    /// Entries ordered by key
    pub fn entries(&self) -> Vec<CacheEntrySnapshot> {
        let mut entries: Vec<_> = self.entries.iter().map(|entry| entry.snapshot()).collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    /// Remove entries created more than `max_age` ago
    pub fn cleanup_older_than(&self, max_age: Duration) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            if entry.age() > max_age {
                removed += 1;
                false
            } else {
                true
            }
        });
        if removed > 0 {
            info!(removed, "Removed stale API clients");
        }
        removed
    }

    /// Run [`ClientCache::cleanup_older_than`] every `interval` until `cancel` fires
    pub fn spawn_cleanup(
        self: &Arc<Self>,
        interval: Duration,
        max_age: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        cache.cleanup_older_than(max_age);
                    }
                }
            }
            debug!("Client cache cleanup stopped");
        })
    }

    /// Evict least recently used entries, never `keep`, until within capacity.
    ///
    /// Runs after every insert with no lock held, so concurrent inserts can
    /// exceed the capacity only until their own trims finish.
    fn trim_to_capacity(&self, keep: &str) {
        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .filter(|entry| entry.key() != keep)
                .min_by_key(|entry| entry.last_accessed)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(oldest) => {
                    debug!(key = %oldest, "Evicting least recently used API client");
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests;
