//! Cache Store Module
//!
//! Maps expression text to compiled expressions, with idle-time tracking
//! for the reaper and a capacity bound.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, StatsCounters};
use crate::expr::CompiledExpression;

// == Cache Store ==
/// Concurrent store of compiled expressions keyed by their verbatim text.
///
/// Locking discipline: inserts and removals take the write lock. Lookups and
/// scans take the read lock; a lookup refreshes the entry's last access
/// atomically, which cannot interleave with a write-locked mutation of the
/// same entry.
#[derive(Debug)]
pub struct CacheStore {
    /// Expression text to entry
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Performance statistics
    counters: StatsCounters,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store holding at most `max_entries` (minimum 1) entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            counters: StatsCounters::new(),
            max_entries: max_entries.max(1),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    // == Get ==
    /// Returns the compiled form for `key`, refreshing its last access time.
    pub async fn get(&self, key: &str) -> Option<Arc<dyn CompiledExpression>> {
        self.get_at(key, Instant::now()).await
    }

    /// [`get`](Self::get) with an explicit clock reading.
    pub async fn get_at(&self, key: &str, now: Instant) -> Option<Arc<dyn CompiledExpression>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) => {
                entry.touch(now);
                self.counters.record_hit();
                Some(Arc::clone(entry.compiled()))
            }
            None => {
                self.counters.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Inserts or overwrites the entry for `key`; last writer wins.
    ///
    /// Inserting a new key into a full store first evicts the least recently
    /// accessed entry.
    pub async fn put(&self, key: String, compiled: Arc<dyn CompiledExpression>, ttl: Duration) {
        self.put_at(key, compiled, ttl, Instant::now()).await
    }

    /// [`put`](Self::put) with an explicit clock reading.
    pub async fn put_at(
        &self,
        key: String,
        compiled: Arc<dyn CompiledExpression>,
        ttl: Duration,
        now: Instant,
    ) {
        let entry = CacheEntry::new(compiled, ttl, now);
        let mut entries = self.entries.write().await;

        // Linear scan under the write lock; only runs for a new key at capacity
        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.last_access())
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                self.counters.record_eviction();
                debug!(key = %oldest, "evicted least recently used expression at capacity");
            }
        }

        entries.insert(key, entry);
    }

    // == Delete ==
    /// Removes the entry for `key`. Returns false if there was none.
    pub async fn delete(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    // == Scan Expired ==
    /// Keys of entries idle longer than their TTL at `now`.
    ///
    /// Only the shared lock is held while scanning, so lookups proceed in
    /// parallel. Entries inserted or touched concurrently may or may not be
    /// reflected; callers re-check with [`remove_if_expired`](Self::remove_if_expired).
    pub async fn scan_expired(&self, now: Instant) -> std::vec::IntoIter<String> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect::<Vec<_>>()
            .into_iter()
    }

    // == Remove If Expired ==
    /// Removes `key` only if it is still expired at `now`.
    ///
    /// An entry refreshed by a lookup after it was scanned survives. Returns
    /// true if the entry was removed.
    pub async fn remove_if_expired(&self, key: &str, now: Instant) -> bool {
        let mut entries = self.entries.write().await;
        let expired = entries.get(key).is_some_and(|entry| entry.is_expired(now));
        if expired {
            entries.remove(key);
            self.counters.record_eviction();
        }
        expired
    }

    // == Contains ==
    /// Checks for `key` without counting a lookup or refreshing the entry.
    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Last access time of `key`, without refreshing it.
    pub async fn last_access(&self, key: &str) -> Option<Instant> {
        self.entries.read().await.get(key).map(CacheEntry::last_access)
    }

    // == Clear ==
    /// Drops every entry. Returns how many were removed.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        count
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    // == Is Empty ==
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let total_entries = self.len().await;
        self.counters.snapshot(total_entries)
    }

    pub fn counters(&self) -> &StatsCounters {
        &self.counters
    }
}
