//! Question orchestration: dispatch per routed intent, merge policy, and
//! cross-intent fallback.

use std::sync::Arc;
use std::time::Duration;

use crate::catalog::{Catalog, CatalogCache};
use crate::config::Config;
use crate::executor::{is_degenerate, StructuredExecutor};
use crate::oracle::{ChatMessage, Oracle};
use crate::planner::QueryPlanner;
use crate::semantic::{SemanticFilterExtractor, SemanticSearcher};
use crate::store::RelationalStore;
use crate::vector::SemanticStore;

use super::router::{IntentRouter, RouteIntent};
use super::types::{Answer, Role, Turn};

const STRUCTURED_FOLLOW_UPS: [&str; 3] = [
    "Break it down by package type?",
    "How many are qualifying leads?",
    "Compare this year against last year?",
];

const HYBRID_FOLLOW_UPS: [&str; 2] = [
    "Want me to break it down further?",
    "Should I compare with last month?",
];

/// Static catalog of example questions for meta-intent requests.
pub fn example_questions() -> &'static str {
    "Here are some questions you can ask me:\n\
     \n\
     Customer numbers\n\
     - How many customers joined in 2024?\n\
     - How many customers have more than 100,000 in investable assets?\n\
     \n\
     Segmentation\n\
     - How many customers are Entrepreneurs vs Employees?\n\
     - How many Growth-minded vs Conservative investors?\n\
     \n\
     Packages\n\
     - How many customers are in the Gold vs Diamond package?\n\
     - Which packages attract Entrepreneur personas?\n\
     \n\
     Insights\n\
     - What is the most common objection in sales calls?\n\
     - Tell me about customers with a high engagement level."
}

/// Routes each question, runs the structured and/or semantic paths, and
/// merges their results into one answer.
pub struct Orchestrator {
    router: IntentRouter,
    planner: QueryPlanner,
    executor: StructuredExecutor,
    extractor: SemanticFilterExtractor,
    searcher: SemanticSearcher,
    oracle: Arc<dyn Oracle>,
    catalog: Arc<CatalogCache>,
    history_turns: usize,
}

impl Orchestrator {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        store: Arc<RelationalStore>,
        semantic_store: Arc<dyn SemanticStore>,
        config: &Config,
    ) -> Self {
        let catalog = Arc::new(CatalogCache::new(
            store.clone(),
            config.database.table.clone(),
            Duration::from_secs(config.database.catalog_ttl_secs),
        ));

        Self {
            router: IntentRouter::new(),
            planner: QueryPlanner::new(oracle.clone()),
            executor: StructuredExecutor::new(
                store,
                config.database.table.clone(),
                config.database.list_limit,
            ),
            extractor: SemanticFilterExtractor::new(oracle.clone()),
            searcher: SemanticSearcher::new(semantic_store, config.vector.top_k),
            oracle,
            catalog,
            history_turns: config.chat.history_turns,
        }
    }

    /// Shared catalog cache, for the schema surfaces.
    pub fn catalog(&self) -> Arc<CatalogCache> {
        self.catalog.clone()
    }

    /// Answer a question given the session's prior turns (most recent last,
    /// not including the question itself).
    pub async fn answer(&self, question: &str, history: &[Turn]) -> Answer {
        let intent = self.router.route(question);
        tracing::info!("Routed question as {:?}", intent);

        match intent {
            RouteIntent::Meta => Answer::new(example_questions()),
            RouteIntent::Structured => {
                let text = self.structured_answer(question).await;
                if is_degenerate(&text) {
                    // An empty structured result is not worth surfacing;
                    // try the semantic path before giving up.
                    tracing::debug!("Structured result degenerate, trying semantic path");
                    Answer::new(self.semantic_answer(question, history).await)
                } else {
                    Answer::new(text).with_related(
                        STRUCTURED_FOLLOW_UPS.iter().map(|s| s.to_string()).collect(),
                    )
                }
            }
            RouteIntent::Semantic => Answer::new(self.semantic_answer(question, history).await),
            RouteIntent::Hybrid => {
                let (structured, semantic) = tokio::join!(
                    self.structured_answer(question),
                    self.semantic_answer(question, history)
                );
                Answer::new(format!("{}\n\nContext:\n{}", structured, semantic)).with_related(
                    HYBRID_FOLLOW_UPS.iter().map(|s| s.to_string()).collect(),
                )
            }
        }
    }

    /// Structured path: plan the question and execute it.
    pub async fn structured_answer(&self, question: &str) -> String {
        let catalog = self.catalog.get().await;
        let plan = self.planner.plan(question, &catalog).await;
        tracing::debug!("Planned {:?} with {} filters", plan.intent, plan.filters.len());
        self.executor.run(&plan, &catalog).await
    }

    /// Semantic path: extract filters, search, and synthesize an answer
    /// grounded in the retrieved documents and recent history.
    pub async fn semantic_answer(&self, question: &str, history: &[Turn]) -> String {
        let extraction = self.extractor.extract(question).await;
        let outcome = self.searcher.search(question, extraction).await;

        let context = if outcome.documents.is_empty() {
            "No results found.".to_string()
        } else {
            outcome
                .documents
                .iter()
                .map(|d| d.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        let filters_json =
            serde_json::to_string(&outcome.filters_applied).unwrap_or_else(|_| "{}".to_string());

        let grounding = format!(
            "You are a customer insights assistant for an internal sales team, \
             answering from the retrieved knowledge base below.\n\
             The user asked: \"{}\"\n\
             \n\
             Filters applied: {}\n\
             Reasoning for filters: {}\n\
             Fallback used: {}\n\
             Retrieved customer data:\n\
             {}\n\
             \n\
             Your role:\n\
             - Directly answer the user's question first\n\
             - Surface insights, patterns, and comparisons\n\
             - Ground every claim in the retrieved data\n\
             - If the data is unclear, acknowledge it and give your best interpretation\n\
             - Use bullets and short paragraphs for readability\n\
             - End with one or two suggested follow-up questions",
            question, filters_json, outcome.reasoning, outcome.fallback_used, context
        );

        let recent = &history[history.len().saturating_sub(self.history_turns)..];
        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(ChatMessage::system(grounding));
        for turn in recent {
            messages.push(match turn.role {
                Role::User => ChatMessage::user(turn.content.clone()),
                Role::Assistant => ChatMessage::assistant(turn.content.clone()),
            });
        }
        messages.push(ChatMessage::user(question.to_string()));

        match self.oracle.complete(&messages, None).await {
            Ok(completion) => completion.content,
            Err(e) => {
                tracing::warn!("Answer synthesis failed: {}", e);
                format!("Language model error: {}", e)
            }
        }
    }

    /// Retrieved document context for the given question, without answer
    /// synthesis. Used by the agent's semantic search tool.
    pub async fn semantic_context(&self, question: &str) -> String {
        let extraction = self.extractor.extract(question).await;
        let outcome = self.searcher.search(question, extraction).await;
        if outcome.documents.is_empty() {
            "No results found.".to_string()
        } else {
            outcome
                .documents
                .iter()
                .map(|d| d.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n")
        }
    }

    /// Current catalog snapshot.
    pub async fn current_catalog(&self) -> Catalog {
        self.catalog.get().await
    }
}
