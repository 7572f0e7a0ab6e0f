//! rescache: bounded, TTL-limited, single-flight cache for expensive
//! retrieval-pipeline resources (embedding clients, vector processors,
//! rerank models).
//!
//! - [`cache`]: key derivation and the generic [`ResourceCache`] core
//! - [`resources`]: per-family instances bound to a [`resources::ResourceProvider`]
//! - [`registry`]: type-erased admin view over all instances, plus the reaper
//! - [`monitor`]: Prometheus export, performance report, HTTP endpoint
//! - [`config`]: file and environment configuration

pub mod cache;
pub mod config;
pub mod error;
pub mod monitor;
pub mod registry;
pub mod resources;

pub use cache::{CacheKey, CacheStats, ResourceCache};
pub use config::{CacheSettings, RescacheConfig};
pub use error::{CacheError, Result};
pub use registry::{CacheAdmin, CacheRegistry};
pub use resources::{CacheFamily, FamilyCache, ResourceProvider, ResourceSpec};
