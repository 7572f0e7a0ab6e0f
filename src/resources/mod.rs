//! Per-family cache instances.
//!
//! Each resource family (embedding models, vector processors, rerank models,
//! weighted-rerank embeddings) is one [`ResourceCache`] with its own
//! settings, paired with the [`ResourceProvider`] that knows how to build
//! that family's handles. Callers hand a spec to [`FamilyCache::get`] and get
//! back a shared handle; the provider only runs on a miss.

pub mod embedding;
pub mod rerank;
pub mod vector;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, EventSink, ResourceCache, TracingSink};
use crate::config::CacheSettings;
use crate::error::{CacheError, Result};
use crate::registry::CacheAdmin;

pub use embedding::EmbeddingModelSpec;
pub use rerank::RerankModelSpec;
pub use vector::VectorProcessorSpec;

/// The resource families a retrieval pipeline caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheFamily {
    Embedding,
    VectorProcessor,
    RerankModel,
    WeightRerankEmbedding,
}

impl CacheFamily {
    pub const ALL: [CacheFamily; 4] = [
        CacheFamily::Embedding,
        CacheFamily::VectorProcessor,
        CacheFamily::RerankModel,
        CacheFamily::WeightRerankEmbedding,
    ];

    /// Instance name used in logs, stats and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            CacheFamily::Embedding => "embedding",
            CacheFamily::VectorProcessor => "vector_processor",
            CacheFamily::RerankModel => "rerank_model",
            CacheFamily::WeightRerankEmbedding => "weight_rerank_embedding",
        }
    }

    /// Prefix of this family's environment overrides.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            CacheFamily::Embedding => "RESCACHE_EMBEDDING",
            CacheFamily::VectorProcessor => "RESCACHE_VECTOR_PROCESSOR",
            CacheFamily::RerankModel => "RESCACHE_RERANK_MODEL",
            CacheFamily::WeightRerankEmbedding => "RESCACHE_WEIGHT_RERANK_EMBEDDING",
        }
    }

    /// Built-in settings: 30 minute TTL everywhere, 100 entries for
    /// embedding models and vector processors, 50 for the rerank families.
    pub fn default_settings(&self) -> CacheSettings {
        let max_size = match self {
            CacheFamily::Embedding | CacheFamily::VectorProcessor => 100,
            CacheFamily::RerankModel | CacheFamily::WeightRerankEmbedding => 50,
        };
        CacheSettings::new(1800.0, max_size)
    }
}

impl fmt::Display for CacheFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for CacheFamily {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        CacheFamily::ALL
            .into_iter()
            .find(|family| family.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = CacheFamily::ALL.iter().map(|f| f.name()).collect();
                CacheError::Config(format!(
                    "unknown cache family '{}' (expected one of: {})",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// Identifying attributes of one resource.
pub trait ResourceSpec: Clone + Send + Sync + 'static {
    /// Ordered attributes the key is derived from. The order is part of the
    /// key: implementations must keep it fixed.
    fn key_attributes(&self) -> Vec<&str>;

    fn cache_key(&self) -> CacheKey {
        CacheKey::derive(self.key_attributes())
    }
}

/// Builds the handles of one family.
#[async_trait]
pub trait ResourceProvider: Send + Sync + 'static {
    type Spec: ResourceSpec;
    /// Shared handle returned to callers, usually an `Arc`.
    type Handle: Clone + Send + Sync + 'static;
    type Error: Clone + fmt::Display + From<CacheError> + Send + Sync + 'static;

    async fn construct(&self, spec: &Self::Spec) -> std::result::Result<Self::Handle, Self::Error>;
}

/// One family's cache bound to its provider.
pub struct FamilyCache<P: ResourceProvider> {
    family: CacheFamily,
    cache: ResourceCache<P::Handle, P::Error>,
    provider: Arc<P>,
}

impl<P: ResourceProvider> FamilyCache<P> {
    pub fn new(family: CacheFamily, settings: &CacheSettings, provider: P) -> Result<Self> {
        Self::with_sink(family, settings, provider, Arc::new(TracingSink))
    }

    pub fn with_sink(
        family: CacheFamily,
        settings: &CacheSettings,
        provider: P,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        Ok(Self {
            family,
            cache: ResourceCache::from_settings_with_sink(family.name(), settings, sink)?,
            provider: Arc::new(provider),
        })
    }

    /// Cached handle for `spec`, built by the provider on a miss.
    pub async fn get(&self, spec: &P::Spec) -> std::result::Result<P::Handle, P::Error> {
        let key = spec.cache_key();
        let provider = Arc::clone(&self.provider);
        let spec = spec.clone();
        self.cache
            .get_or_create(&key, move || async move { provider.construct(&spec).await })
            .await
    }

    pub fn family(&self) -> CacheFamily {
        self.family
    }

    pub fn cache(&self) -> &ResourceCache<P::Handle, P::Error> {
        &self.cache
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Type-erased handle for registering with a
    /// [`CacheRegistry`](crate::registry::CacheRegistry).
    pub fn admin(&self) -> Arc<dyn CacheAdmin> {
        Arc::new(self.cache.clone())
    }
}

impl<P: ResourceProvider> fmt::Debug for FamilyCache<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FamilyCache")
            .field("family", &self.family)
            .field("cache", &self.cache)
            .finish()
    }
}
