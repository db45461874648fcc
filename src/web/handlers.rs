//! Chat API request handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::ToolAgent;
use crate::catalog::Column;
use crate::chat::{example_questions, Orchestrator, Turn};

use super::sessions::SessionStore;

/// Application state shared across handlers.
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub agent: Arc<ToolAgent>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, agent: Arc<ToolAgent>) -> Self {
        Self {
            orchestrator,
            agent,
            sessions: SessionStore::new(),
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Chat request.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Session to continue; a new one is created when absent.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// The user's question.
    pub message: String,
    /// Answer through the tool loop instead of the router.
    #[serde(default)]
    pub agent: bool,
}

/// Chat response.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub session_id: Uuid,
    pub answer: String,
    pub related_questions: Vec<String>,
}

/// Schema response.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaResponse {
    pub table: String,
    pub columns: Vec<Column>,
}

/// Examples response.
#[derive(Debug, Clone, Serialize)]
pub struct ExamplesResponse {
    pub text: String,
}

/// Error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// ============================================================================
// Handler Functions
// ============================================================================

/// POST /api/v1/chat - Answer a question within a session.
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let message = request.message.trim();
    if message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "message must not be empty".to_string(),
                code: "empty_message".to_string(),
            }),
        )
            .into_response();
    }

    let (session_id, history) = state.sessions.resolve(request.session_id);

    let answer = if request.agent {
        state.agent.run(message, &history).await
    } else {
        state.orchestrator.answer(message, &history).await
    };

    state.sessions.append(session_id, Turn::user(message));
    state
        .sessions
        .append(session_id, Turn::assistant(answer.text.clone()));

    Json(ChatResponse {
        session_id,
        answer: answer.text,
        related_questions: answer.related_questions,
    })
    .into_response()
}

/// GET /api/v1/schema - Current column catalog.
pub async fn schema_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let catalog = state.orchestrator.current_catalog().await;
    Json(SchemaResponse {
        table: state.orchestrator.catalog().table().to_string(),
        columns: catalog.columns().to_vec(),
    })
}

/// GET /api/v1/examples - Example questions.
pub async fn examples_handler() -> impl IntoResponse {
    Json(ExamplesResponse {
        text: example_questions().to_string(),
    })
}
