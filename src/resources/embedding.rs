//! Embedding model instances.
//!
//! Embedding clients are cached twice over: once for indexing and vector
//! search ([`CacheFamily::Embedding`](super::CacheFamily::Embedding)) and
//! once for weighted reranking
//! ([`CacheFamily::WeightRerankEmbedding`](super::CacheFamily::WeightRerankEmbedding)).
//! Both are keyed by tenant, provider and model.

use serde::{Deserialize, Serialize};

use super::ResourceSpec;

/// Identifies one tenant's embedding model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmbeddingModelSpec {
    pub tenant_id: String,
    pub provider: String,
    pub model: String,
}

impl EmbeddingModelSpec {
    pub fn new(
        tenant_id: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            provider: provider.into(),
            model: model.into(),
        }
    }
}

impl ResourceSpec for EmbeddingModelSpec {
    fn key_attributes(&self) -> Vec<&str> {
        vec![
            self.tenant_id.as_str(),
            self.provider.as_str(),
            self.model.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheSettings;
    use crate::error::CacheError;
    use crate::resources::{CacheFamily, FamilyCache, ResourceProvider};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Stand-in for a model client: remembers what it was built for.
    #[derive(Debug)]
    struct EmbeddingClient {
        model: String,
        build: usize,
    }

    #[derive(Default)]
    struct CountingProvider {
        builds: AtomicUsize,
    }

    #[async_trait]
    impl ResourceProvider for CountingProvider {
        type Spec = EmbeddingModelSpec;
        type Handle = Arc<EmbeddingClient>;
        type Error = CacheError;

        async fn construct(&self, spec: &EmbeddingModelSpec) -> Result<Arc<EmbeddingClient>, CacheError> {
            if spec.provider == "offline" {
                return Err(CacheError::Construction(format!(
                    "provider '{}' is not configured for tenant {}",
                    spec.provider, spec.tenant_id
                )));
            }
            let build = self.builds.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(EmbeddingClient {
                model: spec.model.clone(),
                build,
            }))
        }
    }

    fn family(family: CacheFamily) -> FamilyCache<CountingProvider> {
        FamilyCache::new(family, &family.default_settings(), CountingProvider::default()).unwrap()
    }

    #[test]
    fn test_key_is_tenant_aware() {
        let a = EmbeddingModelSpec::new("tenant1", "openai", "text-embedding-ada-002");
        let b = EmbeddingModelSpec::new("tenant2", "openai", "text-embedding-ada-002");
        let c = EmbeddingModelSpec::new("tenant1", "cohere", "embed-multilingual-v3.0");
        assert_eq!(a.cache_key(), a.clone().cache_key());
        assert_ne!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[tokio::test]
    async fn test_second_request_reuses_client() {
        let cache = family(CacheFamily::Embedding);
        let spec = EmbeddingModelSpec::new("tenant1", "openai", "text-embedding-3-small");

        let first = cache.get(&spec).await.unwrap();
        let second = cache.get(&spec).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.model, "text-embedding-3-small");
        assert_eq!(cache.provider().builds.load(Ordering::SeqCst), 1);
        assert_eq!(cache.cache().stats().hits, 1);
        assert_eq!(cache.cache().name(), "embedding");
    }

    #[tokio::test]
    async fn test_tenants_get_separate_clients() {
        let cache = family(CacheFamily::Embedding);
        let a = cache
            .get(&EmbeddingModelSpec::new("tenant1", "openai", "m"))
            .await
            .unwrap();
        let b = cache
            .get(&EmbeddingModelSpec::new("tenant2", "openai", "m"))
            .await
            .unwrap();
        assert_ne!(a.build, b.build);
        assert_eq!(cache.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_provider_error_is_not_cached() {
        let cache = family(CacheFamily::WeightRerankEmbedding);
        let spec = EmbeddingModelSpec::new("tenant1", "offline", "m");

        let err = cache.get(&spec).await.unwrap_err();
        assert!(matches!(err, CacheError::Construction(ref msg) if msg.contains("tenant1")));
        assert!(cache.cache().is_empty());
        assert_eq!(cache.cache().capacity(), 50);
    }

    #[tokio::test]
    async fn test_families_are_independent() {
        let search = family(CacheFamily::Embedding);
        let rerank = family(CacheFamily::WeightRerankEmbedding);
        let spec = EmbeddingModelSpec::new("tenant1", "openai", "m");

        search.get(&spec).await.unwrap();
        rerank.get(&spec).await.unwrap();
        search.cache().clear();

        assert!(search.cache().is_empty());
        assert!(rerank.cache().contains(&spec.cache_key()));
    }

    #[tokio::test]
    async fn test_custom_settings() {
        let cache = FamilyCache::new(
            CacheFamily::Embedding,
            &CacheSettings::new(60.0, 1),
            CountingProvider::default(),
        )
        .unwrap();
        cache
            .get(&EmbeddingModelSpec::new("t", "openai", "a"))
            .await
            .unwrap();
        cache
            .get(&EmbeddingModelSpec::new("t", "openai", "b"))
            .await
            .unwrap();
        assert_eq!(cache.cache().len(), 1);
        assert_eq!(cache.cache().stats().evictions, 1);
    }
}
