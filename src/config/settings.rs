//! Configuration settings for the Prism server.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub oracle: OracleConfig,
    pub embedding: EmbeddingApiConfig,
    pub vector: VectorConfig,
    pub chat: ChatConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            PathBuf::from("prism.toml"),
            PathBuf::from("config.toml"),
            dirs::config_dir()
                .map(|p| p.join("prism/config.toml"))
                .unwrap_or_default(),
            dirs::home_dir()
                .map(|p| p.join(".prism/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.oracle.base_url.is_empty() {
            return Err(ConfigError::MissingField("oracle.base_url".to_string()).into());
        }
        if self.oracle.model.is_empty() {
            return Err(ConfigError::MissingField("oracle.model".to_string()).into());
        }
        if self.embedding.model.is_empty() {
            return Err(ConfigError::MissingField("embedding.model".to_string()).into());
        }
        if self.database.table.is_empty() {
            return Err(ConfigError::MissingField("database.table".to_string()).into());
        }
        if self.vector.top_k == 0 {
            return Err(ConfigError::Invalid("vector.top_k must be > 0".to_string()).into());
        }
        if self.chat.history_turns == 0 {
            return Err(ConfigError::Invalid("chat.history_turns must be > 0".to_string()).into());
        }
        Ok(())
    }

    /// Expand the database path.
    pub fn database_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.database.path);
        PathBuf::from(expanded.as_ref())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the HTTP server
    pub bind: String,
    /// HTTP port
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            http_port: 8080,
        }
    }
}

/// Relational store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
    /// Target table for analytics questions
    pub table: String,
    /// Row cap for list-style queries
    pub list_limit: usize,
    /// Catalog cache TTL in seconds
    pub catalog_ttl_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "~/.local/share/prism/customers.db".to_string(),
            table: "customers".to_string(),
            list_limit: 100,
            catalog_ttl_secs: 300,
        }
    }
}

/// Completion oracle configuration (OpenAI-compatible chat API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Base URL for the completion API
    pub base_url: String,
    /// Model name
    pub model: String,
    /// API key (loaded from environment if not set)
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum tool round-trips in agent mode
    pub max_tool_rounds: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout_secs: 30,
            max_tool_rounds: 5,
        }
    }
}

/// Embedding API configuration (used for vector search queries).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingApiConfig {
    /// Base URL for the embedding API
    pub base_url: String,
    /// Model name
    pub model: String,
    /// API key (loaded from environment if not set)
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-large".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Vector store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    /// Qdrant server URL
    pub url: String,
    /// Collection name
    pub collection: String,
    /// API key (optional)
    pub api_key: Option<String>,
    /// Top-k for similarity search
    pub top_k: usize,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            collection: "customers".to_string(),
            api_key: None,
            top_k: 20,
        }
    }
}

/// Conversation grounding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Number of recent turns passed to the oracle for grounding
    pub history_turns: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { history_turns: 10 }
    }
}
