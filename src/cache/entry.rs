//! Cache entry with its creation timestamp.

use std::time::{Duration, Instant};

/// A cached resource handle and when it was built.
///
/// There is no last-accessed field: recency lives in the position of the
/// entry inside the LRU map.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The shared resource handle.
    pub value: V,
    /// Monotonic creation time.
    pub created_at: Instant,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            created_at: Instant::now(),
        }
    }

    /// Age at `now`. Never negative: a `now` earlier than `created_at`
    /// yields zero.
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    /// Age right now.
    pub fn age(&self) -> Duration {
        self.age_at(Instant::now())
    }

    /// An entry is fresh while `age <= ttl`.
    pub fn is_expired_at(&self, ttl: Duration, now: Instant) -> bool {
        self.age_at(now) > ttl
    }
}
