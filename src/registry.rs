//! Process-wide view over every cache instance.
//!
//! Caches are generic over their handle and error types, so the registry
//! stores them behind the object-safe [`CacheAdmin`] trait. It drives the
//! operator surface (stats, clear, clear-stats) and the optional background
//! reaper that purges expired entries.

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::cache::{CacheStats, ResourceCache};
use crate::error::CacheError;

/// Administrative operations shared by every cache instance.
pub trait CacheAdmin: Send + Sync {
    fn name(&self) -> &str;
    fn stats(&self) -> CacheStats;
    /// Drop every entry, keeping counters.
    fn clear(&self);
    /// Zero every counter, keeping entries.
    fn clear_stats(&self);
    /// Remove expired entries now. Returns how many were removed.
    fn purge_expired(&self) -> usize;
}

impl<V, E> CacheAdmin for ResourceCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + fmt::Display + From<CacheError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        ResourceCache::name(self)
    }

    fn stats(&self) -> CacheStats {
        ResourceCache::stats(self)
    }

    fn clear(&self) {
        ResourceCache::clear(self)
    }

    fn clear_stats(&self) {
        ResourceCache::clear_stats(self)
    }

    fn purge_expired(&self) -> usize {
        ResourceCache::purge_expired(self)
    }
}

/// Named set of cache instances, in registration order.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use rescache::cache::ResourceCache;
/// use rescache::registry::CacheRegistry;
///
/// let registry = CacheRegistry::new();
/// let cache: ResourceCache<Arc<String>> =
///     ResourceCache::new("embedding", 100, Duration::from_secs(1800));
/// registry.register(Arc::new(cache));
/// assert_eq!(registry.names(), vec!["embedding".to_string()]);
/// ```
#[derive(Clone)]
pub struct CacheRegistry {
    caches: Arc<RwLock<Vec<Arc<dyn CacheAdmin>>>>,
    start_time: Instant,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self {
            caches: Arc::new(RwLock::new(Vec::new())),
            start_time: Instant::now(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<dyn CacheAdmin>>> {
        self.caches.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<dyn CacheAdmin>>> {
        self.caches
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a cache. Replaces any existing cache with the same name.
    pub fn register(&self, cache: Arc<dyn CacheAdmin>) {
        let mut caches = self.write();
        match caches.iter().position(|c| c.name() == cache.name()) {
            Some(idx) => caches[idx] = cache,
            None => caches.push(cache),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CacheAdmin>> {
        self.read().iter().find(|c| c.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.read().iter().map(|c| c.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every cache, in registration order.
    pub fn stats_all(&self) -> Vec<CacheStats> {
        self.snapshot().iter().map(|c| c.stats()).collect()
    }

    /// Clear every cache. Returns how many caches were cleared.
    pub fn clear_all(&self) -> usize {
        let caches = self.snapshot();
        for cache in &caches {
            cache.clear();
        }
        info!(caches = caches.len(), "All caches cleared");
        caches.len()
    }

    pub fn clear_stats_all(&self) -> usize {
        let caches = self.snapshot();
        for cache in &caches {
            cache.clear_stats();
        }
        info!(caches = caches.len(), "All cache statistics reset");
        caches.len()
    }

    /// Purge expired entries from every cache. Returns the total removed.
    pub fn purge_expired_all(&self) -> usize {
        self.snapshot().iter().map(|c| c.purge_expired()).sum()
    }

    /// Time since the registry was created.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    // Caches are called outside the registry lock so a slow cache never
    // blocks registration.
    fn snapshot(&self) -> Vec<Arc<dyn CacheAdmin>> {
        self.read().clone()
    }
}

impl Default for CacheRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("caches", &self.names())
            .finish()
    }
}

/// Start a background task that purges expired entries every `interval`.
///
/// Stops when `shutdown_rx` signals `true`. A zero `interval` disables the
/// reaper: the returned task finishes immediately.
pub fn start_reaper(
    registry: CacheRegistry,
    interval: Duration,
    mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    if interval.is_zero() {
        warn!("Reaper interval is zero; expired entries are only dropped on lookup");
        return tokio::spawn(async {});
    }
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // skip first immediate tick

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = registry.purge_expired_all();
                    if removed > 0 {
                        info!(removed, "Reaper purged expired cache entries");
                    } else {
                        debug!("Reaper found no expired entries");
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        debug!("Reaper stopped");
                        break;
                    }
                }
            }
        }
    })
}
