//! Prism: Conversational Customer Analytics
//!
//! Routes natural-language questions to a relational store and/or a vector
//! index, extracts typed query plans with help from a completion oracle,
//! and merges both paths into one grounded answer.

pub mod agent;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod embedding;
pub mod error;
pub mod executor;
pub mod oracle;
pub mod planner;
pub mod semantic;
pub mod store;
pub mod vector;
pub mod web;

pub use agent::{tool_specs, ToolAgent, MAX_TOOL_ROUNDS};
pub use catalog::{Catalog, CatalogCache, Column, ColumnKind};
pub use chat::{example_questions, Answer, IntentRouter, Orchestrator, Role, RouteIntent, Turn};
pub use config::Config;
pub use embedding::{ApiEmbeddingProvider, EmbeddingProvider};
pub use error::{ConfigError, OracleError, PrismError, Result, StoreError, VectorSearchError};
pub use executor::StructuredExecutor;
pub use oracle::{ApiOracle, ChatMessage, Completion, MessageRole, Oracle, ToolCall, ToolSpec};
pub use planner::{Filter, FilterOp, OrderBy, PlanIntent, QueryPlan, QueryPlanner, SortDirection};
pub use semantic::{
    FilterExtraction, SemanticFilterExtractor, SemanticSearchOutcome, SemanticSearcher,
    ATTRIBUTE_VOCABULARY,
};
pub use store::{RelationalStore, SqlParam};
pub use vector::{Document, QdrantSearch, SemanticFilterSet, SemanticStore};
pub use web::{create_router, SessionStore, WebApiConfig};
