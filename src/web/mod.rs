//! HTTP chat surface.

mod handlers;
mod sessions;

pub use handlers::{AppState, ChatRequest, ChatResponse};
pub use sessions::SessionStore;

use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::agent::ToolAgent;
use crate::chat::Orchestrator;
use handlers::{chat_handler, examples_handler, schema_handler};

/// Web API configuration.
#[derive(Debug, Clone)]
pub struct WebApiConfig {
    /// Enable CORS.
    pub enable_cors: bool,
    /// API prefix.
    pub prefix: String,
}

impl Default for WebApiConfig {
    fn default() -> Self {
        Self {
            enable_cors: true,
            prefix: "/api/v1".to_string(),
        }
    }
}

/// Create the chat API router.
///
/// Endpoints:
/// - POST /api/v1/chat      - Answer a question within a session
/// - GET  /api/v1/schema    - Current column catalog
/// - GET  /api/v1/examples  - Example questions
pub fn create_router(
    orchestrator: Arc<Orchestrator>,
    agent: Arc<ToolAgent>,
    config: &WebApiConfig,
) -> Router {
    let state = Arc::new(AppState::new(orchestrator, agent));

    let api_routes = Router::new()
        .route("/chat", post(chat_handler))
        .route("/schema", get(schema_handler))
        .route("/examples", get(examples_handler))
        .with_state(state);

    let router = Router::new().nest(&config.prefix, api_routes);

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .allow_origin(Any);
        router.layer(cors)
    } else {
        router
    }
}
