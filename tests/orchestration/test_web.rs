//! Chat API tests against the axum router.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use prism::{create_router, Orchestrator, ToolAgent, WebApiConfig};

use super::support::{knowledge_docs, seed_customer_db, test_config, RoutedOracle, StubSemanticStore};

async fn test_router(dir: &TempDir) -> axum::Router {
    let store = seed_customer_db(dir).await;
    let config = test_config(dir);
    let semantic = Arc::new(StubSemanticStore::always(knowledge_docs()));
    let oracle = Arc::new(RoutedOracle::default());
    let orchestrator = Arc::new(Orchestrator::new(oracle.clone(), store, semantic, &config));
    let agent = Arc::new(ToolAgent::new(
        oracle,
        orchestrator.clone(),
        config.oracle.max_tool_rounds,
    ));
    create_router(orchestrator, agent, &WebApiConfig::default())
}

async fn post_chat(router: &axum::Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/chat")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_chat_answers_and_assigns_session() {
    let dir = TempDir::new().unwrap();
    let router = test_router(&dir).await;

    let (status, body) =
        post_chat(&router, serde_json::json!({"message": "how many customers in USA"})).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["answer"].as_str().unwrap().contains("3"));
    assert!(Uuid::parse_str(body["session_id"].as_str().unwrap()).is_ok());
    assert!(body["related_questions"].as_array().unwrap().len() > 0);
}

#[tokio::test]
async fn test_chat_session_is_continued() {
    let dir = TempDir::new().unwrap();
    let router = test_router(&dir).await;

    let (_, first) =
        post_chat(&router, serde_json::json!({"message": "how many customers in USA"})).await;
    let session_id = first["session_id"].as_str().unwrap().to_string();

    let (status, second) = post_chat(
        &router,
        serde_json::json!({"session_id": session_id, "message": "tell me about Alice"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["session_id"].as_str().unwrap(), session_id);
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let dir = TempDir::new().unwrap();
    let router = test_router(&dir).await;

    let (status, body) = post_chat(&router, serde_json::json!({"message": "  "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "empty_message");
}

#[tokio::test]
async fn test_schema_endpoint_lists_columns() {
    let dir = TempDir::new().unwrap();
    let router = test_router(&dir).await;

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/schema")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["table"], "customers");
    let names: Vec<&str> = json["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"Package Purchased"));
    assert!(names.contains(&"country"));
}

#[tokio::test]
async fn test_examples_endpoint() {
    let dir = TempDir::new().unwrap();
    let router = test_router(&dir).await;

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/examples")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(json["text"].as_str().unwrap().contains("How many customers"));
}
