//! Cache Entry Module
//!
//! Defines a cached compiled expression together with its idle-time bookkeeping.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::expr::CompiledExpression;

// == Cache Entry ==
/// A compiled expression held by the cache.
///
/// The last access time is kept as a nanosecond offset from `created_at` in
/// a single atomic word, so it can be refreshed through a shared reference
/// and is never observed half-written.
pub struct CacheEntry {
    /// The compiled form; never mutated after creation
    compiled: Arc<dyn CompiledExpression>,
    /// Idle duration after which the entry may be evicted
    ttl: Duration,
    /// Instant the entry was built
    created_at: Instant,
    /// Nanoseconds after `created_at` of the most recent access
    last_access: AtomicU64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry whose last access is `now`.
    pub fn new(compiled: Arc<dyn CompiledExpression>, ttl: Duration, now: Instant) -> Self {
        Self {
            compiled,
            ttl,
            created_at: now,
            last_access: AtomicU64::new(0),
        }
    }

    pub fn compiled(&self) -> &Arc<dyn CompiledExpression> {
        &self.compiled
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Touch ==
    /// Records an access at `now`.
    ///
    /// The stored time only moves forward: a touch carrying an older instant
    /// than the current value (a slow caller losing a race) is a no-op.
    pub fn touch(&self, now: Instant) {
        let offset = self.offset_of(now);
        self.last_access.fetch_max(offset, Ordering::AcqRel);
    }

    pub fn last_access(&self) -> Instant {
        self.created_at + Duration::from_nanos(self.last_access.load(Ordering::Acquire))
    }

    // == Idle Time ==
    /// Time elapsed between the last access and `now` (zero if `now` is earlier).
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_access())
    }

    // == Is Expired ==
    /// True once the entry has been idle strictly longer than its TTL.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.idle_for(now) > self.ttl
    }

    fn offset_of(&self, now: Instant) -> u64 {
        let nanos = now.saturating_duration_since(self.created_at).as_nanos();
        u64::try_from(nanos).unwrap_or(u64::MAX)
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("ttl", &self.ttl)
            .field("last_access", &self.last_access())
            .finish_non_exhaustive()
    }
}
