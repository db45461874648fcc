//! Error types for the Prism analytics server.

use thiserror::Error;

/// Main error type for Prism operations.
#[derive(Error, Debug)]
pub enum PrismError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Vector search error: {0}")]
    Vector(#[from] VectorSearchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Relational store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),
}

/// Completion oracle errors.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Malformed output: {0}")]
    MalformedOutput(String),
}

/// Vector search errors.
#[derive(Error, Debug)]
pub enum VectorSearchError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),
}

/// Result type alias for Prism operations.
pub type Result<T> = std::result::Result<T, PrismError>;
