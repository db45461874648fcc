//! API-backed oracle (OpenAI-compatible chat completions).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::OracleConfig;
use crate::error::OracleError;

use super::{ChatMessage, Completion, Oracle, ToolCall, ToolSpec};

/// OpenAI-compatible chat completion oracle.
pub struct ApiOracle {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

/// Chat completion request format.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool<'a>>>,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: &'a ToolSpec,
}

/// Chat completion response format.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

/// API error response format.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl ApiOracle {
    /// Create a new API oracle from configuration.
    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                OracleError::Api(
                    "API key not provided and OPENAI_API_KEY env var not set".to_string(),
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl Oracle for ApiOracle {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolSpec]>,
    ) -> Result<Completion, OracleError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: 0.0,
            tools: tools.map(|specs| {
                specs
                    .iter()
                    .map(|spec| WireTool {
                        tool_type: "function",
                        function: spec,
                    })
                    .collect()
            }),
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
                    OracleError::Api("Request timed out".to_string())
                } else if e.is_connect() {
                    OracleError::Api(format!("Connection failed: {}", e))
                } else {
                    OracleError::Api(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();

        if status.is_success() {
            let result: CompletionResponse = response
                .json()
                .await
                .map_err(|e| OracleError::MalformedOutput(format!("Failed to parse response: {}", e)))?;

            let message = result
                .choices
                .into_iter()
                .next()
                .map(|c| c.message)
                .ok_or_else(|| OracleError::MalformedOutput("empty choices".to_string()))?;

            Ok(Completion {
                content: message.content.unwrap_or_default(),
                tool_calls: message
                    .tool_calls
                    .into_iter()
                    .map(|c| ToolCall {
                        id: c.id,
                        name: c.function.name,
                        arguments: c.function.arguments,
                    })
                    .collect(),
            })
        } else if status.as_u16() == 429 {
            Err(OracleError::RateLimited)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                Err(OracleError::Api(format!(
                    "API error ({}): {}",
                    status, error_response.error.message
                )))
            } else {
                Err(OracleError::Api(format!("API error ({}): {}", status, error_text)))
            }
        }
    }
}
