//! Configuration loading and validation.

mod settings;

pub use settings::{
    ChatConfig, Config, DatabaseConfig, EmbeddingApiConfig, OracleConfig, ServerConfig,
    VectorConfig,
};
