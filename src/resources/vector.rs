//! Vector processor instances, keyed by dataset and vector store backend.

use serde::{Deserialize, Serialize};

use super::ResourceSpec;
use crate::error::{CacheError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VectorProcessorSpec {
    pub dataset_id: String,
    /// Vector store backend, e.g. `qdrant` or `weaviate`.
    pub vector_type: String,
}

impl VectorProcessorSpec {
    pub fn new(dataset_id: impl Into<String>, vector_type: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            vector_type: vector_type.into(),
        }
    }

    /// Pick the backend for a dataset.
    ///
    /// An already-indexed dataset keeps the backend recorded in its index
    /// structure. Otherwise a tenant-level override wins over the deployment
    /// default. Fails when none of them names a backend.
    pub fn resolve(
        dataset_id: &str,
        indexed_type: Option<&str>,
        tenant_override: Option<&str>,
        default_store: Option<&str>,
    ) -> Result<Self> {
        [indexed_type, tenant_override, default_store]
            .into_iter()
            .flatten()
            .find(|t| !t.trim().is_empty())
            .map(|vector_type| Self::new(dataset_id, vector_type.trim()))
            .ok_or_else(|| {
                CacheError::Config(format!(
                    "Vector store must be specified for dataset {}",
                    dataset_id
                ))
            })
    }
}

impl ResourceSpec for VectorProcessorSpec {
    fn key_attributes(&self) -> Vec<&str> {
        vec![self.dataset_id.as_str(), self.vector_type.as_str()]
    }
}
