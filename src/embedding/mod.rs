//! Query embedding for vector search.

mod api;

pub use api::ApiEmbeddingProvider;

use async_trait::async_trait;

use crate::error::VectorSearchError;

/// Produces embeddings for search queries.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, VectorSearchError>;

    /// Dimension of produced embeddings.
    fn dimension(&self) -> usize;
}
