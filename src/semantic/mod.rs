//! Semantic path: metadata filter extraction and vector search with
//! unfiltered fallback.

use std::sync::Arc;

use serde::Deserialize;

use crate::oracle::{ChatMessage, Oracle};
use crate::vector::{Document, SemanticFilterSet, SemanticStore};

/// Closed attribute vocabulary for semantic filters. Filters on anything
/// outside this list are dropped regardless of what the oracle suggests.
pub const ATTRIBUTE_VOCABULARY: &[&str] = &[
    "country",
    "Sales Rep Name",
    "Qualifying Lead",
    "Ad Lead",
    "Package of Customer Interest",
    "Package Purchased",
    "Investment Level",
    "Investable Assets",
    "Engagement Level",
    "Risk Profile",
    "Persona Type",
    "Tags",
];

/// Extracted filter set with the oracle's rationale.
#[derive(Debug, Clone, Default)]
pub struct FilterExtraction {
    pub filters: SemanticFilterSet,
    pub reasoning: String,
}

/// Outcome of a semantic search.
#[derive(Debug, Clone)]
pub struct SemanticSearchOutcome {
    pub documents: Vec<Document>,
    pub filters_applied: SemanticFilterSet,
    pub reasoning: String,
    pub fallback_used: bool,
}

/// Unvalidated extraction as the oracle produced it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExtractionDraft {
    filters: std::collections::BTreeMap<String, serde_json::Value>,
    reasoning: String,
}

/// Turns a question into a metadata filter set over the attribute
/// vocabulary. Never fails; malformed oracle output yields no filters.
pub struct SemanticFilterExtractor {
    oracle: Arc<dyn Oracle>,
}

impl SemanticFilterExtractor {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    pub async fn extract(&self, question: &str) -> FilterExtraction {
        let prompt = format!(
            "Map the question to metadata filters over customer records.\n\
             Permitted attribute names: {:?}\n\
             Question: \"{}\"\n\
             Return ONLY valid compact JSON (no prose):\n\
             {{\"filters\": {{\"<attribute>\": \"<value>\"}}, \"reasoning\": \"<one sentence>\"}}\n\
             Use an empty filters object when no attribute clearly applies.",
            ATTRIBUTE_VOCABULARY, question
        );

        let messages = [
            ChatMessage::system(
                "You translate customer-insight questions into metadata filters.",
            ),
            ChatMessage::user(prompt),
        ];

        let content = match self.oracle.complete(&messages, None).await {
            Ok(completion) => completion.content,
            Err(e) => {
                tracing::debug!("Filter extraction request failed: {}", e);
                return FilterExtraction {
                    filters: SemanticFilterSet::new(),
                    reasoning: format!("filter extraction unavailable: {}", e),
                };
            }
        };

        match serde_json::from_str::<ExtractionDraft>(content.trim()) {
            Ok(draft) => {
                let mut filters = SemanticFilterSet::new();
                for (attribute, value) in draft.filters {
                    let Some(canonical) = canonical_attribute(&attribute) else {
                        tracing::debug!("Dropping filter on unknown attribute: {}", attribute);
                        continue;
                    };
                    if let Some(value) = filter_value(&value) {
                        filters.insert(canonical.to_string(), value);
                    }
                }
                FilterExtraction {
                    filters,
                    reasoning: draft.reasoning,
                }
            }
            Err(_) => FilterExtraction {
                filters: SemanticFilterSet::new(),
                reasoning: "oracle returned non-JSON".to_string(),
            },
        }
    }
}

fn canonical_attribute(name: &str) -> Option<&'static str> {
    ATTRIBUTE_VOCABULARY
        .iter()
        .find(|a| a.eq_ignore_ascii_case(name))
        .copied()
}

fn filter_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Runs similarity search with the extracted filters, retrying unfiltered
/// when a filtered search comes back empty.
pub struct SemanticSearcher {
    store: Arc<dyn SemanticStore>,
    top_k: usize,
}

impl SemanticSearcher {
    pub fn new(store: Arc<dyn SemanticStore>, top_k: usize) -> Self {
        Self { store, top_k }
    }

    pub async fn search(
        &self,
        question: &str,
        extraction: FilterExtraction,
    ) -> SemanticSearchOutcome {
        let FilterExtraction { filters, reasoning } = extraction;

        let documents = match self.store.similarity_search(question, &filters, self.top_k).await {
            Ok(documents) => documents,
            Err(e) => {
                tracing::warn!("Vector search failed: {}", e);
                return SemanticSearchOutcome {
                    documents: vec![],
                    filters_applied: SemanticFilterSet::new(),
                    reasoning: e.to_string(),
                    fallback_used: true,
                };
            }
        };

        if documents.is_empty() && !filters.is_empty() {
            tracing::debug!("Filtered search empty, retrying unfiltered");
            let unfiltered = SemanticFilterSet::new();
            let documents = match self
                .store
                .similarity_search(question, &unfiltered, self.top_k)
                .await
            {
                Ok(documents) => documents,
                Err(e) => {
                    tracing::warn!("Unfiltered retry failed: {}", e);
                    return SemanticSearchOutcome {
                        documents: vec![],
                        filters_applied: SemanticFilterSet::new(),
                        reasoning: e.to_string(),
                        fallback_used: true,
                    };
                }
            };
            return SemanticSearchOutcome {
                documents,
                filters_applied: filters,
                reasoning,
                fallback_used: true,
            };
        }

        SemanticSearchOutcome {
            documents,
            filters_applied: filters,
            reasoning,
            fallback_used: false,
        }
    }
}
