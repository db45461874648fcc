//! Question intent routing.
//!
//! A deterministic, order-sensitive keyword classifier. Rules are checked
//! in precedence order: meta, then hybrid (both cue families present),
//! then structured, then semantic, with semantic as the default.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Routing intent for an incoming question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteIntent {
    /// Help / example-request phrasing; answered from the static catalog.
    Meta,
    /// Quantitative phrasing; answered from the relational store.
    Structured,
    /// Descriptive phrasing; answered from the vector store.
    Semantic,
    /// Both quantitative and descriptive cues in one question.
    Hybrid,
}

static META_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(suggest|example|what can i ask|help me explore|ideas)")
        .expect("Invalid regex")
});

static QUANTITATIVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(how many|\bcount\b|average|\bsum\b|group by|\btop\b|\bfilter\b|date after|date before|\btotal\b|number of)",
    )
    .expect("Invalid regex")
});

static DESCRIPTIVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(who is|what is|tell me about|explain|details of|\bpatterns?\b)")
        .expect("Invalid regex")
});

/// Deterministic keyword router. Never fails; unmatched input resolves to
/// the semantic default.
#[derive(Debug, Default)]
pub struct IntentRouter;

impl IntentRouter {
    pub fn new() -> Self {
        Self
    }

    pub fn route(&self, question: &str) -> RouteIntent {
        if META_PATTERN.is_match(question) {
            return RouteIntent::Meta;
        }

        let quantitative = QUANTITATIVE_PATTERN.is_match(question);
        let descriptive = DESCRIPTIVE_PATTERN.is_match(question);

        match (quantitative, descriptive) {
            (true, true) => RouteIntent::Hybrid,
            (true, false) => RouteIntent::Structured,
            _ => RouteIntent::Semantic,
        }
    }
}
