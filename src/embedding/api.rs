//! API-based embedding provider (OpenAI-compatible).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EmbeddingApiConfig;
use crate::error::VectorSearchError;

use super::EmbeddingProvider;

/// OpenAI-compatible API embedding provider.
pub struct ApiEmbeddingProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    dimension: usize,
}

/// Embedding request format.
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    encoding_format: &'static str,
}

/// Embedding response format.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl ApiEmbeddingProvider {
    /// Create a new API embedding provider from configuration.
    pub fn from_config(config: &EmbeddingApiConfig) -> Result<Self, VectorSearchError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                VectorSearchError::Embedding(
                    "API key not provided and OPENAI_API_KEY env var not set".to_string(),
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                VectorSearchError::Embedding(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            dimension: Self::model_dimension(&config.model),
        })
    }

    fn model_dimension(model: &str) -> usize {
        match model {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            _ => 1536,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for ApiEmbeddingProvider {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, VectorSearchError> {
        let url = format!("{}/embeddings", self.base_url);

        let request = EmbeddingRequest {
            model: &self.model,
            input: &[text],
            encoding_format: "float",
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VectorSearchError::Embedding("Request timed out".to_string())
                } else if e.is_connect() {
                    VectorSearchError::Embedding(format!("Connection failed: {}", e))
                } else {
                    VectorSearchError::Embedding(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();

        if status.is_success() {
            let result: EmbeddingResponse = response.json().await.map_err(|e| {
                VectorSearchError::Embedding(format!("Failed to parse response: {}", e))
            })?;

            result
                .data
                .into_iter()
                .next()
                .map(|d| d.embedding)
                .ok_or_else(|| VectorSearchError::Embedding("empty embedding response".to_string()))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                Err(VectorSearchError::Embedding(format!(
                    "API error ({}): {}",
                    status, error_response.error.message
                )))
            } else {
                Err(VectorSearchError::Embedding(format!(
                    "API error ({}): {}",
                    status, error_text
                )))
            }
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
