//! Structured cache events and where they go.
//!
//! Events are collected while the state lock is held and delivered after it
//! is released, so a slow sink never extends the critical section. Delivery
//! is best-effort: a panicking sink is swallowed and the caller's request
//! carries on.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::key::CacheKey;

/// One observable cache outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    Hit { key: CacheKey, age: Duration },
    /// A construction completed and its result was stored (or passed
    /// through when capacity is zero).
    Miss { key: CacheKey, construction: Duration },
    Eviction { key: CacheKey },
    Expired { key: CacheKey, age: Duration },
    ConstructionFailed { key: CacheKey, error: String },
}

impl CacheEvent {
    pub fn outcome(&self) -> &'static str {
        match self {
            CacheEvent::Hit { .. } => "hit",
            CacheEvent::Miss { .. } => "miss",
            CacheEvent::Eviction { .. } => "eviction",
            CacheEvent::Expired { .. } => "expired",
            CacheEvent::ConstructionFailed { .. } => "construction_failed",
        }
    }

    pub fn key(&self) -> &CacheKey {
        match self {
            CacheEvent::Hit { key, .. }
            | CacheEvent::Miss { key, .. }
            | CacheEvent::Eviction { key }
            | CacheEvent::Expired { key, .. }
            | CacheEvent::ConstructionFailed { key, .. } => key,
        }
    }
}

/// Receiver of cache events.
pub trait EventSink: Send + Sync {
    fn record(&self, cache: &str, event: &CacheEvent);
}

/// Default sink: one `tracing` event per outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, cache: &str, event: &CacheEvent) {
        let key = event.key().short();
        let outcome = event.outcome();
        match event {
            CacheEvent::Hit { age, .. } => {
                debug!(cache, key, outcome, age_ms = age.as_millis() as u64, "Cache hit");
            }
            CacheEvent::Miss { construction, .. } => {
                info!(
                    cache,
                    key,
                    outcome,
                    construction_ms = construction.as_millis() as u64,
                    "Cache miss, resource constructed"
                );
            }
            CacheEvent::Eviction { .. } => {
                info!(cache, key, outcome, "Cache full, evicted LRU entry");
            }
            CacheEvent::Expired { age, .. } => {
                info!(cache, key, outcome, age_ms = age.as_millis() as u64, "Cache entry expired");
            }
            CacheEvent::ConstructionFailed { error, .. } => {
                warn!(cache, key, outcome, error = %error, "Resource construction failed");
            }
        }
    }
}

/// Deliver `events` to `sink`, isolating the caller from sink panics.
pub(crate) fn emit_all(sink: &dyn EventSink, cache: &str, events: Vec<CacheEvent>) {
    for event in events {
        if catch_unwind(AssertUnwindSafe(|| sink.record(cache, &event))).is_err() {
            warn!(cache, outcome = event.outcome(), "Cache event sink panicked; event dropped");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Sink that keeps every event for assertions.
    #[derive(Default)]
    pub struct RecordingSink {
        pub events: Mutex<Vec<(String, CacheEvent)>>,
    }

    impl RecordingSink {
        pub fn outcomes(&self) -> Vec<&'static str> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|(_, e)| e.outcome())
                .collect()
        }
    }

    impl EventSink for RecordingSink {
        fn record(&self, cache: &str, event: &CacheEvent) {
            self.events
                .lock()
                .unwrap()
                .push((cache.to_string(), event.clone()));
        }
    }
}
