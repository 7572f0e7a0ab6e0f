//! Rerank model instances, keyed by tenant, provider and model.

use serde::{Deserialize, Serialize};

use super::ResourceSpec;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RerankModelSpec {
    pub tenant_id: String,
    pub provider: String,
    pub model: String,
}

impl RerankModelSpec {
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

    /// Spec for a retrieval request's rerank settings, if reranking is
    /// configured at all.
    ///
    /// A request without a rerank provider or model name runs without a
    /// rerank step, so there is nothing to cache.
    pub fn from_request(
        tenant_id: &str,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> Option<Self> {
        match (provider, model) {
            (Some(provider), Some(model)) if !provider.is_empty() && !model.is_empty() => {
                Some(Self::new(tenant_id, provider, model))
            }
            _ => None,
        }
    }
}

impl ResourceSpec for RerankModelSpec {
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
    use crate::error::CacheError;
    use crate::resources::{CacheFamily, FamilyCache, ResourceProvider};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Provider error type of its own, to show the cache passes it through.
    #[derive(Debug, Clone, PartialEq)]
    enum RerankError {
        Unauthorized(String),
        Cache(CacheError),
    }

    impl std::fmt::Display for RerankError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                RerankError::Unauthorized(p) => write!(f, "unauthorized for {p}"),
                RerankError::Cache(e) => write!(f, "{e}"),
            }
        }
    }

    impl From<CacheError> for RerankError {
        fn from(err: CacheError) -> Self {
            RerankError::Cache(err)
        }
    }

    #[derive(Default)]
    struct SlowProvider {
        builds: AtomicUsize,
    }

    #[async_trait]
    impl ResourceProvider for SlowProvider {
        type Spec = RerankModelSpec;
        type Handle = Arc<String>;
        type Error = RerankError;

        async fn construct(&self, spec: &RerankModelSpec) -> Result<Arc<String>, RerankError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            if spec.provider == "revoked" {
                return Err(RerankError::Unauthorized(spec.provider.clone()));
            }
            Ok(Arc::new(format!("{}/{}", spec.provider, spec.model)))
        }
    }

    fn family() -> FamilyCache<SlowProvider> {
        let family = CacheFamily::RerankModel;
        FamilyCache::new(family, &family.default_settings(), SlowProvider::default()).unwrap()
    }

    #[test]
    fn test_from_request_requires_provider_and_model() {
        assert!(RerankModelSpec::from_request("t", Some("cohere"), Some("rerank-english-v2.0")).is_some());
        assert!(RerankModelSpec::from_request("t", None, Some("rerank-english-v2.0")).is_none());
        assert!(RerankModelSpec::from_request("t", Some("cohere"), None).is_none());
        assert!(RerankModelSpec::from_request("t", Some(""), Some("m")).is_none());
    }

    #[test]
    fn test_key_differs_across_providers() {
        let a = RerankModelSpec::new("tenant1", "cohere", "rerank-english-v2.0");
        let b = RerankModelSpec::new("tenant1", "jina", "jina-reranker-v1-base-en");
        assert_ne!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key().as_str().len(), 64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_build_once() {
        let cache = Arc::new(family());
        let spec = RerankModelSpec::new("tenant1", "cohere", "rerank-english-v2.0");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let spec = spec.clone();
            handles.push(tokio::spawn(async move { cache.get(&spec).await }));
        }
        for handle in handles {
            assert_eq!(
                handle.await.unwrap().unwrap().as_str(),
                "cohere/rerank-english-v2.0"
            );
        }
        assert_eq!(cache.provider().builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_provider_error_type_passes_through() {
        let cache = family();
        let spec = RerankModelSpec::new("tenant1", "revoked", "m");
        assert_eq!(
            cache.get(&spec).await.unwrap_err(),
            RerankError::Unauthorized("revoked".into())
        );
        // Not cached: a second call tries again.
        let _ = cache.get(&spec).await;
        assert_eq!(cache.provider().builds.load(Ordering::SeqCst), 2);
    }
}
