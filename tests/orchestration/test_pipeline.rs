//! End-to-end pipeline tests: question in, answer out.

use std::sync::Arc;

use tempfile::TempDir;

use prism::{Document, Orchestrator, Turn};

use super::support::{knowledge_docs, seed_customer_db, test_config, RoutedOracle, StubSemanticStore};

async fn orchestrator_with(oracle: RoutedOracle, dir: &TempDir) -> Orchestrator {
    let store = seed_customer_db(dir).await;
    let config = test_config(dir);
    let semantic = Arc::new(StubSemanticStore::always(knowledge_docs()));
    Orchestrator::new(Arc::new(oracle), store, semantic, &config)
}

#[tokio::test]
async fn test_count_round_trip() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator_with(RoutedOracle::default(), &dir).await;

    let answer = orchestrator.answer("how many customers in USA", &[]).await;
    assert!(answer.text.contains("3"), "expected count 3 in: {}", answer.text);
    assert!(!answer.related_questions.is_empty());
}

#[tokio::test]
async fn test_group_by_breakdown() {
    let oracle = RoutedOracle {
        plan_json: r#"{"intent":"group_by","group_by":["Package Purchased"]}"#.to_string(),
        ..Default::default()
    };
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator_with(oracle, &dir).await;

    let answer = orchestrator
        .answer("count of customers group by package", &[])
        .await;
    assert!(answer.text.starts_with("Breakdown:"));
    // Two Diamond rows must outrank the single Gold and Silver rows.
    let first_line = answer.text.lines().nth(1).unwrap();
    assert!(first_line.contains("Diamond: 2"), "got: {}", answer.text);
}

#[tokio::test]
async fn test_meta_catalog_needs_no_backend() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator_with(RoutedOracle::default(), &dir).await;

    let answer = orchestrator.answer("what can I ask you", &[]).await;
    assert!(answer.text.contains("questions you can ask"));
}

#[tokio::test]
async fn test_semantic_answer_is_oracle_text_verbatim() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator_with(RoutedOracle::default(), &dir).await;

    let answer = orchestrator
        .answer("what is Alice's biggest pain point", &[])
        .await;
    assert_eq!(answer.text, "USA customers mostly struggle with onboarding.");
    assert!(answer.related_questions.is_empty());
}

#[tokio::test]
async fn test_hybrid_merge_is_demarcated() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator_with(RoutedOracle::default(), &dir).await;

    let answer = orchestrator
        .answer("how many customers in USA and explain their patterns", &[])
        .await;

    let (structured, semantic) = answer
        .text
        .split_once("\n\nContext:\n")
        .expect("hybrid answer must carry a labeled context section");
    assert!(structured.contains("3"));
    assert!(semantic.contains("onboarding"));
}

#[tokio::test]
async fn test_degenerate_structured_result_falls_back_to_semantic() {
    let oracle = RoutedOracle {
        plan_json:
            r#"{"intent":"list","filters":[{"column":"country","op":"contains","value":"Atlantis"}]}"#
                .to_string(),
        ..Default::default()
    };
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator_with(oracle, &dir).await;

    let answer = orchestrator.answer("filter customers in Atlantis", &[]).await;
    assert_eq!(answer.text, "USA customers mostly struggle with onboarding.");
}

#[tokio::test]
async fn test_injection_attempt_stays_inert() {
    let oracle = RoutedOracle {
        plan_json: r#"{"intent":"count","filters":[{"column":"country","op":"contains","value":"'; DROP TABLE customers; --"}]}"#
            .to_string(),
        ..Default::default()
    };
    let dir = TempDir::new().unwrap();
    let store = seed_customer_db(&dir).await;
    let config = test_config(&dir);
    let semantic = Arc::new(StubSemanticStore::always(vec![Document::new("doc")]));
    let orchestrator = Orchestrator::new(Arc::new(oracle), store.clone(), semantic, &config);

    let _ = orchestrator
        .answer("how many customers named '; DROP TABLE customers; --", &[])
        .await;

    // The hostile value traveled as a bound parameter; the table survives.
    let rows = store
        .execute("SELECT COUNT(*) FROM customers".to_string(), vec![])
        .await
        .unwrap();
    assert_eq!(rows[0][0].as_i64(), Some(4));
}

#[tokio::test]
async fn test_history_is_threaded_into_semantic_answers() {
    let dir = TempDir::new().unwrap();
    let orchestrator = orchestrator_with(RoutedOracle::default(), &dir).await;

    let history = vec![
        Turn::user("tell me about Alice"),
        Turn::assistant("Alice runs a consultancy."),
    ];
    let answer = orchestrator
        .answer("tell me about her pain points", &history)
        .await;
    // The routed oracle ignores history content, but the call must succeed
    // with history present.
    assert!(!answer.text.is_empty());
}
