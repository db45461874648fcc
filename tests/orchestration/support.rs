//! Shared test doubles and fixtures.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use prism::error::{OracleError, VectorSearchError};
use prism::{
    ChatMessage, Completion, Config, Document, Oracle, RelationalStore, SemanticFilterSet,
    SemanticStore, SqlParam, ToolSpec,
};

/// Oracle double that answers by prompt family: plan prompts get the plan
/// JSON, filter-extraction prompts the filter JSON, everything else the
/// answer text. Stable under concurrent calls.
pub struct RoutedOracle {
    pub plan_json: String,
    pub filter_json: String,
    pub answer_text: String,
}

impl Default for RoutedOracle {
    fn default() -> Self {
        Self {
            plan_json:
                r#"{"intent":"count","filters":[{"column":"country","op":"contains","value":"USA"}]}"#
                    .to_string(),
            filter_json: r#"{"filters":{"country":"USA"},"reasoning":"country mentioned"}"#
                .to_string(),
            answer_text: "USA customers mostly struggle with onboarding.".to_string(),
        }
    }
}

#[async_trait]
impl Oracle for RoutedOracle {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _tools: Option<&[ToolSpec]>,
    ) -> Result<Completion, OracleError> {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let content = if prompt.contains("SQL-ready JSON plan") {
            self.plan_json.clone()
        } else if prompt.contains("metadata filters") {
            self.filter_json.clone()
        } else {
            self.answer_text.clone()
        };
        Ok(Completion {
            content,
            tool_calls: vec![],
        })
    }
}

/// Oracle double replaying a fixed script of completions, recording every
/// request it sees.
pub struct ScriptedOracle {
    script: Mutex<VecDeque<Completion>>,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedOracle {
    pub fn new(script: Vec<Completion>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _tools: Option<&[ToolSpec]>,
    ) -> Result<Completion, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(messages.to_vec());
        let next = self.script.lock().pop_front();
        Ok(next.unwrap_or_default())
    }
}

/// Vector store double returning fixed documents for any query, or nothing
/// when the filter disagrees with the configured match.
pub struct StubSemanticStore {
    pub matching: Option<SemanticFilterSet>,
    pub docs: Vec<Document>,
}

impl StubSemanticStore {
    /// Store that answers every query with the given documents.
    pub fn always(docs: Vec<Document>) -> Self {
        Self {
            matching: None,
            docs,
        }
    }
}

#[async_trait]
impl SemanticStore for StubSemanticStore {
    async fn similarity_search(
        &self,
        _query: &str,
        filter: &SemanticFilterSet,
        _k: usize,
    ) -> Result<Vec<Document>, VectorSearchError> {
        match &self.matching {
            Some(matching) if !filter.is_empty() && filter != matching => Ok(vec![]),
            _ => Ok(self.docs.clone()),
        }
    }
}

/// Seed a customer table with a realistic column vocabulary. Three USA
/// rows, one UK row, a mix of packages and lead flags.
pub async fn seed_customer_db(dir: &TempDir) -> Arc<RelationalStore> {
    let store = Arc::new(RelationalStore::new(dir.path().join("customers.db")));

    store
        .execute(
            "CREATE TABLE customers (\
                \"Customer ID\" TEXT, \
                \"Customer Name\" TEXT, \
                \"country\" TEXT, \
                \"Package Purchased\" TEXT, \
                \"Qualifying Lead\" BOOLEAN, \
                \"Investable Assets\" NUMERIC, \
                \"Persona Type\" TEXT)"
                .to_string(),
            vec![],
        )
        .await
        .unwrap();

    let rows: [(&str, &str, &str, &str, i64, i64, &str); 4] = [
        ("c-1", "Alice", "USA", "Diamond", 1, 120_000, "Entrepreneur"),
        ("c-2", "Bob", "USA", "Gold", 0, 30_000, "Employee"),
        ("c-3", "Cara", "USA", "Diamond", 1, 250_000, "Entrepreneur"),
        ("c-4", "Dan", "UK", "Silver", 0, 15_000, "Employee"),
    ];

    for (id, name, country, package, lead, assets, persona) in rows {
        store
            .execute(
                "INSERT INTO customers VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)".to_string(),
                vec![
                    SqlParam::Text(id.to_string()),
                    SqlParam::Text(name.to_string()),
                    SqlParam::Text(country.to_string()),
                    SqlParam::Text(package.to_string()),
                    SqlParam::Integer(lead),
                    SqlParam::Integer(assets),
                    SqlParam::Text(persona.to_string()),
                ],
            )
            .await
            .unwrap();
    }

    store
}

/// Config pointing at the seeded temporary database.
pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.database.path = dir
        .path()
        .join("customers.db")
        .to_string_lossy()
        .to_string();
    config
}

/// Documents mirroring the knowledge-base entries of the seeded customers.
pub fn knowledge_docs() -> Vec<Document> {
    vec![
        Document::new(
            "Alice | USA | Diamond | Entrepreneur | pain point: onboarding complexity",
        ),
        Document::new("Cara | USA | Diamond | Entrepreneur | objection: pricing tiers"),
    ]
}
