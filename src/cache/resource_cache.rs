//! Keyed, bounded, TTL-limited resource cache with single-flight construction.
//!
//! One `std::sync::Mutex` guards the LRU map, the in-flight construction map
//! and the counters. It is held only for bookkeeping, never across an
//! `.await` and never while a constructor runs. Constructions for the same
//! key are coalesced into one spawned task whose result is shared with every
//! waiter; constructions for different keys run independently.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use tokio::sync::oneshot;
use tracing::{debug, info};

use super::entry::CacheEntry;
use super::events::{emit_all, CacheEvent, EventSink, TracingSink};
use super::key::CacheKey;
use super::stats::{CacheStats, Counters};
use crate::config::CacheSettings;
use crate::error::CacheError;

/// Shared outcome of one construction: the handle and whether it was stored.
type Construction<V, E> = Shared<BoxFuture<'static, Result<(V, bool), E>>>;

struct InFlight<V, E> {
    id: u64,
    future: Construction<V, E>,
}

struct State<V, E> {
    entries: LruCache<CacheKey, CacheEntry<V>>,
    in_flight: HashMap<CacheKey, InFlight<V, E>>,
    counters: Counters,
    /// Bumped by `clear()`; constructions started in an older generation
    /// are returned to their callers but not stored.
    generation: u64,
    next_flight_id: u64,
}

struct Inner<V, E> {
    name: String,
    capacity: usize,
    ttl: Duration,
    state: Mutex<State<V, E>>,
    sink: Arc<dyn EventSink>,
}

/// Thread-safe get-or-construct cache for expensive resource handles.
///
/// `V` is the handle type handed to callers (usually an `Arc<T>`); `E` is the
/// constructor's error type. Cloning the cache clones a reference to the same
/// instance.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use rescache::cache::{CacheKey, ResourceCache};
/// use rescache::error::CacheError;
///
/// # tokio_test_block_on(async {
/// let cache: ResourceCache<Arc<String>, CacheError> =
///     ResourceCache::new("embedding", 100, Duration::from_secs(1800));
/// let key = CacheKey::derive(["tenant-1", "openai", "text-embedding-3-small"]);
/// let handle = cache
///     .get_or_create(&key, || async { Ok(Arc::new("client".to_string())) })
///     .await
///     .unwrap();
/// assert_eq!(handle.as_str(), "client");
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
pub struct ResourceCache<V, E = CacheError> {
    inner: Arc<Inner<V, E>>,
}

impl<V, E> Clone for ResourceCache<V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V, E> fmt::Debug for ResourceCache<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCache")
            .field("name", &self.inner.name)
            .field("capacity", &self.inner.capacity)
            .field("ttl", &self.inner.ttl)
            .finish()
    }
}

enum Pending<V, E> {
    Joined(Construction<V, E>),
    Leader {
        future: Construction<V, E>,
        ticket: Ticket<V, E>,
        tx: oneshot::Sender<Result<(V, bool), E>>,
    },
}

impl<V, E> ResourceCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + fmt::Display + From<CacheError> + Send + Sync + 'static,
{
    /// Create a cache that logs events through `tracing`.
    ///
    /// `capacity == 0` makes the cache a pass-through: every call constructs
    /// and nothing is retained.
    pub fn new(name: impl Into<String>, capacity: usize, ttl: Duration) -> Self {
        Self::with_sink(name, capacity, ttl, Arc::new(TracingSink))
    }

    /// Create a cache that delivers events to `sink`.
    pub fn with_sink(
        name: impl Into<String>,
        capacity: usize,
        ttl: Duration,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                capacity,
                ttl,
                state: Mutex::new(State {
                    entries: LruCache::unbounded(),
                    in_flight: HashMap::new(),
                    counters: Counters::default(),
                    generation: 0,
                    next_flight_id: 0,
                }),
                sink,
            }),
        }
    }

    /// Create a cache from validated settings.
    pub fn from_settings(name: impl Into<String>, settings: &CacheSettings) -> crate::Result<Self> {
        Ok(Self::new(name, settings.capacity(), settings.ttl()?))
    }

    /// Same as [`from_settings`](Self::from_settings) with a custom sink.
    pub fn from_settings_with_sink(
        name: impl Into<String>,
        settings: &CacheSettings,
        sink: Arc<dyn EventSink>,
    ) -> crate::Result<Self> {
        Ok(Self::with_sink(name, settings.capacity(), settings.ttl()?, sink))
    }

    /// Return the live entry for `key`, or build it with `constructor`.
    ///
    /// The constructor runs at most once per key at a time. Concurrent callers
    /// for the same key wait for that one construction and all receive its
    /// result, success or error. Failures are never cached.
    ///
    /// The construction runs on a spawned tokio task: if the caller gives up
    /// (for example through `tokio::time::timeout`) the construction still
    /// completes and populates the cache for the next caller.
    pub async fn get_or_create<F, Fut>(&self, key: &CacheKey, constructor: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let mut events = Vec::new();
        let pending = {
            let mut state = self.inner.lock_state();
            if let Some(value) = self.inner.lookup(&mut state, key, Instant::now(), &mut events) {
                drop(state);
                self.inner.emit(events);
                return Ok(value);
            }
            let joined = state.in_flight.get(key).map(|flight| flight.future.clone());
            match joined {
                Some(future) => Pending::Joined(future),
                None => self.register_construction(&mut state, key),
            }
        };
        self.inner.emit(events);

        match pending {
            Pending::Joined(future) => {
                let (value, stored) = future.await?;
                if stored {
                    self.inner.record_joined_hit(key);
                }
                Ok(value)
            }
            Pending::Leader { future, ticket, tx } => {
                match catch_unwind(AssertUnwindSafe(constructor)) {
                    Ok(construction) => {
                        tokio::spawn(ticket.run(construction, tx));
                    }
                    Err(payload) => {
                        let result = Err(E::from(CacheError::ConstructorPanicked(
                            panic_message(payload.as_ref()),
                        )));
                        let stored = ticket.settle(&result, Duration::ZERO);
                        let _ = tx.send(result.map(|value| (value, stored)));
                    }
                }
                future.await.map(|(value, _)| value)
            }
        }
    }

    fn register_construction(&self, state: &mut State<V, E>, key: &CacheKey) -> Pending<V, E> {
        let (tx, rx) = oneshot::channel::<Result<(V, bool), E>>();
        let future: Construction<V, E> = async move {
            rx.await
                .unwrap_or_else(|_| Err(E::from(CacheError::ConstructionAborted)))
        }
        .boxed()
        .shared();

        state.next_flight_id += 1;
        let id = state.next_flight_id;
        state.in_flight.insert(
            key.clone(),
            InFlight {
                id,
                future: future.clone(),
            },
        );
        debug!(cache = %self.inner.name, key = key.short(), "Starting resource construction");

        Pending::Leader {
            future,
            ticket: Ticket {
                inner: Arc::clone(&self.inner),
                key: key.clone(),
                id,
                generation: state.generation,
                settled: false,
            },
            tx,
        }
    }

    /// Drop every entry. Counters are kept.
    ///
    /// Constructions already running still deliver to their callers, and
    /// callers arriving meanwhile join them, but their results are not
    /// stored.
    pub fn clear(&self) {
        let cleared = {
            let mut state = self.inner.lock_state();
            let cleared = state.entries.len();
            state.entries.clear();
            state.generation += 1;
            cleared
        };
        info!(cache = %self.inner.name, cleared, "Cache cleared");
    }

    /// Zero every counter. Entries are kept.
    pub fn clear_stats(&self) {
        self.inner.lock_state().counters = Counters::default();
        info!(cache = %self.inner.name, "Cache statistics reset");
    }

    /// Consistent snapshot of counters and size.
    pub fn stats(&self) -> CacheStats {
        let state = self.inner.lock_state();
        CacheStats::from_counters(
            &self.inner.name,
            state.counters,
            state.entries.len(),
            self.inner.capacity,
        )
    }

    /// Remove every expired entry now instead of at its next lookup.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let mut events = Vec::new();
        {
            let mut state = self.inner.lock_state();
            let now = Instant::now();
            let ttl = self.inner.ttl;
            let expired: Vec<(CacheKey, Duration)> = state
                .entries
                .iter()
                .filter(|(_, entry)| entry.is_expired_at(ttl, now))
                .map(|(key, entry)| (key.clone(), entry.age_at(now)))
                .collect();
            for (key, age) in expired {
                state.entries.pop(&key);
                state.counters.expired += 1;
                events.push(CacheEvent::Expired { key, age });
            }
        }
        let removed = events.len();
        self.inner.emit(events);
        removed
    }

    /// Drop one entry. Returns `true` if it was resident.
    pub fn remove(&self, key: &CacheKey) -> bool {
        self.inner.lock_state().entries.pop(key).is_some()
    }

    /// `true` if `key` has a fresh entry. Does not change recency or counters.
    pub fn contains(&self, key: &CacheKey) -> bool {
        let state = self.inner.lock_state();
        state
            .entries
            .peek(key)
            .is_some_and(|entry| !entry.is_expired_at(self.inner.ttl, Instant::now()))
    }

    /// Keys from least to most recently used.
    pub fn keys_by_recency(&self) -> Vec<CacheKey> {
        let state = self.inner.lock_state();
        state.entries.iter().rev().map(|(key, _)| key.clone()).collect()
    }

    /// Resident entries, expired ones included until they are looked up or
    /// purged.
    pub fn len(&self) -> usize {
        self.inner.lock_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl<V, E> Inner<V, E>
where
    V: Clone,
    E: fmt::Display,
{
    fn lock_state(&self) -> MutexGuard<'_, State<V, E>> {
        // Nothing panics while the lock is held, but never let a poisoned
        // lock take the cache down.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read path: fresh entry => hit + promote; expired entry => drop + expiry.
    fn lookup(
        &self,
        state: &mut State<V, E>,
        key: &CacheKey,
        now: Instant,
        events: &mut Vec<CacheEvent>,
    ) -> Option<V> {
        let (expired, age) = state
            .entries
            .peek(key)
            .map(|entry| (entry.is_expired_at(self.ttl, now), entry.age_at(now)))?;

        if expired {
            state.entries.pop(key);
            state.counters.expired += 1;
            events.push(CacheEvent::Expired {
                key: key.clone(),
                age,
            });
            return None;
        }

        let value = state.entries.get(key).map(|entry| entry.value.clone())?;
        state.counters.hits += 1;
        events.push(CacheEvent::Hit {
            key: key.clone(),
            age,
        });
        Some(value)
    }

    /// Called once per construction, success or failure, from its ticket.
    /// Returns `true` if the result was stored.
    fn complete(
        &self,
        key: &CacheKey,
        id: u64,
        generation: u64,
        result: &Result<V, E>,
        construction: Duration,
    ) -> bool {
        let mut events = Vec::new();
        let mut stored = false;
        {
            let mut state = self.lock_state();
            if state.in_flight.get(key).is_some_and(|flight| flight.id == id) {
                state.in_flight.remove(key);
            }

            match result {
                Ok(value) => {
                    if self.capacity > 0 && state.generation == generation {
                        while state.entries.len() >= self.capacity {
                            match state.entries.pop_lru() {
                                Some((evicted, _)) => {
                                    state.counters.evictions += 1;
                                    events.push(CacheEvent::Eviction { key: evicted });
                                }
                                None => break,
                            }
                        }
                        state.entries.put(key.clone(), CacheEntry::new(value.clone()));
                        stored = true;
                    }
                    state.counters.misses += 1;
                    events.push(CacheEvent::Miss {
                        key: key.clone(),
                        construction,
                    });
                }
                Err(err) => {
                    events.push(CacheEvent::ConstructionFailed {
                        key: key.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        self.emit(events);
        stored
    }

    /// A caller that joined another caller's construction got a cached
    /// handle without building it: that is a hit. Results that were never
    /// stored (pass-through, or a construction from before a `clear()`)
    /// count nothing for the joined caller.
    fn record_joined_hit(&self, key: &CacheKey) {
        let event = {
            let mut state = self.lock_state();
            state.counters.hits += 1;
            let now = Instant::now();
            let age = state
                .entries
                .get(key)
                .map(|entry| entry.age_at(now))
                .unwrap_or_default();
            CacheEvent::Hit {
                key: key.clone(),
                age,
            }
        };
        self.emit(vec![event]);
    }

    fn emit(&self, events: Vec<CacheEvent>) {
        if !events.is_empty() {
            emit_all(self.sink.as_ref(), &self.name, events);
        }
    }
}

/// Ownership of one registered construction.
///
/// Settling it stores the result and clears the in-flight record. Dropping it
/// unsettled (the task was cancelled) only clears the in-flight record; the
/// dropped sender then tells every waiter the construction was aborted.
struct Ticket<V, E> {
    inner: Arc<Inner<V, E>>,
    key: CacheKey,
    id: u64,
    generation: u64,
    settled: bool,
}

impl<V, E> Ticket<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + fmt::Display + From<CacheError> + Send + Sync + 'static,
{
    async fn run<Fut>(self, construction: Fut, tx: oneshot::Sender<Result<(V, bool), E>>)
    where
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let started = Instant::now();
        let result = match AssertUnwindSafe(construction).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(E::from(CacheError::ConstructorPanicked(panic_message(
                payload.as_ref(),
            )))),
        };
        let stored = self.settle(&result, started.elapsed());
        let _ = tx.send(result.map(|value| (value, stored)));
    }

    fn settle(mut self, result: &Result<V, E>, construction: Duration) -> bool {
        self.settled = true;
        self.inner
            .complete(&self.key, self.id, self.generation, result, construction)
    }
}

impl<V, E> Drop for Ticket<V, E> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if state
            .in_flight
            .get(&self.key)
            .is_some_and(|flight| flight.id == self.id)
        {
            state.in_flight.remove(&self.key);
        }
        debug!(cache = %self.inner.name, key = self.key.short(), "Resource construction abandoned");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
