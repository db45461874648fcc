//! Vector store access for semantic search.

mod qdrant;

pub use qdrant::QdrantSearch;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::VectorSearchError;

/// Metadata filter set over the closed attribute vocabulary.
///
/// Ordered so filter rendering into prompts and logs is deterministic.
pub type SemanticFilterSet = BTreeMap<String, String>;

/// A retrieved document: embedded text plus its stored metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: serde_json::Value::Null,
        }
    }
}

/// Similarity search over the vector index.
#[async_trait]
pub trait SemanticStore: Send + Sync {
    /// Top-k similarity search restricted to the given metadata filter.
    async fn similarity_search(
        &self,
        query: &str,
        filter: &SemanticFilterSet,
        k: usize,
    ) -> Result<Vec<Document>, VectorSearchError>;
}
