//! Qdrant vector search backend.
//!
//! Embeds the query through the configured embedding API and maps the
//! semantic filter set to Qdrant field match conditions. The embedded text
//! is expected under the `text` payload key; the remaining payload fields
//! are surfaced as document metadata.

use std::sync::Arc;

use async_trait::async_trait;
use qdrant_client::qdrant::{value::Kind, Condition, Filter, SearchPointsBuilder};
use qdrant_client::Qdrant;

use crate::config::VectorConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::VectorSearchError;

use super::{Document, SemanticFilterSet, SemanticStore};

/// Qdrant-backed semantic store.
pub struct QdrantSearch {
    client: Qdrant,
    collection: String,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl QdrantSearch {
    /// Connect to Qdrant with the given configuration.
    pub fn new(
        config: &VectorConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, VectorSearchError> {
        let client = Qdrant::from_url(&config.url)
            .api_key(config.api_key.clone())
            .build()
            .map_err(|e| VectorSearchError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
            embedder,
        })
    }
}

#[async_trait]
impl SemanticStore for QdrantSearch {
    async fn similarity_search(
        &self,
        query: &str,
        filter: &SemanticFilterSet,
        k: usize,
    ) -> Result<Vec<Document>, VectorSearchError> {
        let vector = self.embedder.embed_query(query).await?;

        let mut search =
            SearchPointsBuilder::new(&self.collection, vector, k as u64).with_payload(true);

        if !filter.is_empty() {
            let conditions: Vec<Condition> = filter
                .iter()
                .map(|(field, value)| Condition::matches(field.clone(), value.clone()))
                .collect();
            search = search.filter(Filter::must(conditions));
        }

        let response = self
            .client
            .search_points(search)
            .await
            .map_err(|e| VectorSearchError::Search(e.to_string()))?;

        let documents = response
            .result
            .into_iter()
            .map(|point| {
                let mut content = String::new();
                let mut metadata = serde_json::Map::new();
                for (key, value) in point.payload {
                    let json = qdrant_value_to_json(value);
                    if key == "text" {
                        if let serde_json::Value::String(s) = &json {
                            content = s.clone();
                        }
                    } else {
                        metadata.insert(key, json);
                    }
                }
                Document {
                    content,
                    metadata: serde_json::Value::Object(metadata),
                }
            })
            .collect();

        Ok(documents)
    }
}

fn qdrant_value_to_json(value: qdrant_client::qdrant::Value) -> serde_json::Value {
    match value.kind {
        Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::from(i),
        Some(Kind::DoubleValue(d)) => {
            serde_json::Number::from_f64(d).map_or(serde_json::Value::Null, serde_json::Value::Number)
        }
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::ListValue(list)) => serde_json::Value::Array(
            list.values.into_iter().map(qdrant_value_to_json).collect(),
        ),
        Some(Kind::StructValue(map)) => serde_json::Value::Object(
            map.fields
                .into_iter()
                .map(|(k, v)| (k, qdrant_value_to_json(v)))
                .collect(),
        ),
    }
}
