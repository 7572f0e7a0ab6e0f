//! Resource instance caching: keys, entries, the single-flight cache core,
//! counters and events.

pub mod entry;
pub mod events;
pub mod key;
pub mod resource_cache;
pub mod stats;

pub use entry::CacheEntry;
pub use events::{CacheEvent, EventSink, TracingSink};
pub use key::CacheKey;
pub use resource_cache::ResourceCache;
pub use stats::{CacheStats, Efficiency};
