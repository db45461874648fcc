//! Plan extraction: a deterministic schema-driven pass merged with a
//! phrase-normalization pass through the completion oracle.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;

use crate::catalog::{Catalog, ColumnKind};
use crate::oracle::{ChatMessage, Oracle};

use super::types::{Filter, FilterOp, OrderBy, PlanIntent, QueryPlan, SortDirection};

/// Count-style phrasing that defaults the intent to `count` when the oracle
/// does not name an aggregate intent itself.
static COUNT_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(how many|\bcount\b|\btotal\b|number of)").expect("Invalid regex")
});

const PLAN_SYSTEM_PROMPT: &str = "You output JSON-only plans for SQL over a known schema.";

const PLAN_JSON_SPEC: &str = r#"Return ONLY valid compact JSON (no prose) with this schema:
{
  "intent": "count | group_by | top_n | list",
  "filters": [
    {"column": "<col>", "op": "contains|=|>|<|>=|<=|between|on|after|before|between_dates|is_true|is_false", "value": "<v1>", "value2": "<v2 if needed>"}
  ],
  "group_by": ["<col1>"],
  "top_n": 5,
  "order_by": {"column": "<col>", "direction": "desc"},
  "select": ["<cols>"]
}"#;

/// Translates a question plus the current catalog into a query plan.
///
/// Never fails: a malformed or unreachable oracle contributes nothing and
/// the deterministic pass carries the plan alone.
pub struct QueryPlanner {
    oracle: Arc<dyn Oracle>,
}

impl QueryPlanner {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Build a plan for the question against the given catalog.
    pub async fn plan(&self, question: &str, catalog: &Catalog) -> QueryPlan {
        let deterministic = deterministic_filters(question, catalog);
        let draft = self.oracle_draft(question, catalog).await;

        let mut filters = deterministic;
        filters.extend(draft.filters());

        finalize(question, filters, draft, catalog)
    }

    async fn oracle_draft(&self, question: &str, catalog: &Catalog) -> PlanDraft {
        let columns: Vec<&str> = catalog.columns().iter().map(|c| c.name.as_str()).collect();
        let prompt = format!(
            "You are mapping a natural language analytics question to a SQL-ready JSON plan.\n\
             Columns available: {:?}\n\
             User question: \"{}\"\n\
             {}",
            columns, question, PLAN_JSON_SPEC
        );

        let messages = [
            ChatMessage::system(PLAN_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];

        match self.oracle.complete(&messages, None).await {
            Ok(completion) => {
                match serde_json::from_str::<PlanDraft>(extract_json(&completion.content)) {
                    Ok(draft) => draft,
                    Err(e) => {
                        tracing::debug!("Oracle plan was not valid JSON: {}", e);
                        PlanDraft::default()
                    }
                }
            }
            Err(e) => {
                tracing::debug!("Oracle plan request failed: {}", e);
                PlanDraft::default()
            }
        }
    }
}

/// Deterministic pass: columns mentioned by name, with a trailing value.
///
/// A match yields `contains` for text-like columns, `equals` for numeric
/// and date columns, and a normalized boolean operator for boolean columns.
fn deterministic_filters(question: &str, catalog: &Catalog) -> Vec<Filter> {
    let mut out = Vec::new();

    for column in catalog.columns() {
        let pattern = format!(
            r"(?i){}(?:\s+(?:is|as)\s+|\s*=\s*|\s+)([\w&+-][\w\s&+-]*)",
            regex::escape(&column.name)
        );
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        let Some(caps) = re.captures(question) else {
            continue;
        };
        let value = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        if value.is_empty() {
            continue;
        }

        let candidate = match column.kind {
            ColumnKind::Boolean => {
                match normalize_boolean(Filter::new(&column.name, FilterOp::Contains, value)) {
                    Some(filter) => filter,
                    None => continue,
                }
            }
            ColumnKind::Numeric | ColumnKind::Date => {
                Filter::new(&column.name, FilterOp::Equals, value)
            }
            _ => Filter::new(&column.name, FilterOp::Contains, value),
        };
        out.push(candidate);
    }

    out
}

/// Boolean columns admit only literal truth values; anything else cannot be
/// expressed as a condition and is dropped.
fn normalize_boolean(filter: Filter) -> Option<Filter> {
    if matches!(filter.op, FilterOp::IsTrue | FilterOp::IsFalse) {
        return Some(filter);
    }
    let op = match filter.value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => FilterOp::IsTrue,
        "false" | "no" | "0" => FilterOp::IsFalse,
        _ => return None,
    };
    Some(Filter {
        op,
        ..filter
    })
}

/// Merge, validate against the catalog, and resolve the final intent.
fn finalize(question: &str, filters: Vec<Filter>, draft: PlanDraft, catalog: &Catalog) -> QueryPlan {
    // Canonicalize columns, normalize booleans, drop unknowns, then dedup
    // on the exact (column, value) pair; first occurrence wins.
    let mut seen: Vec<(String, String)> = Vec::new();
    let mut validated = Vec::new();
    for mut filter in filters {
        let Some(canonical) = catalog.canonical(&filter.column) else {
            tracing::debug!("Dropping filter on unknown column: {}", filter.column);
            continue;
        };
        filter.column = canonical.to_string();

        if catalog.kind_of(&filter.column) == Some(ColumnKind::Boolean) {
            match normalize_boolean(filter) {
                Some(normalized) => filter = normalized,
                None => continue,
            }
        }

        let key = (filter.column.clone(), filter.value.clone());
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        validated.push(filter);
    }

    let group_by: Vec<String> = draft
        .group_by
        .iter()
        .filter_map(|g| catalog.canonical(g).map(str::to_string))
        .collect();

    let order_by = draft.order_by.as_ref().and_then(|o| {
        catalog.canonical(&o.column).map(|canonical| OrderBy {
            column: canonical.to_string(),
            direction: match o.direction.to_ascii_lowercase().as_str() {
                "asc" => SortDirection::Asc,
                _ => SortDirection::Desc,
            },
        })
    });

    let select: Vec<String> = draft
        .select
        .iter()
        .filter_map(|s| catalog.canonical(s).map(str::to_string))
        .collect();

    // An explicit aggregate intent from the oracle is honored; otherwise
    // count-style phrasing means count, and everything else lists.
    let mut intent = match draft.intent.as_deref().and_then(parse_intent) {
        Some(explicit @ (PlanIntent::Count | PlanIntent::GroupBy | PlanIntent::TopN)) => explicit,
        _ => {
            if COUNT_KEYWORDS.is_match(question) {
                PlanIntent::Count
            } else {
                PlanIntent::List
            }
        }
    };

    // Grouping and ordering must reference catalog columns, else the intent
    // degrades to a plain list.
    if intent == PlanIntent::GroupBy && group_by.is_empty() {
        intent = PlanIntent::List;
    }
    if intent == PlanIntent::TopN && order_by.is_none() {
        intent = PlanIntent::List;
    }

    QueryPlan {
        intent,
        filters: validated,
        group_by,
        top_n: draft.top_n(),
        order_by,
        select,
    }
}

fn parse_intent(intent: &str) -> Option<PlanIntent> {
    match intent.trim().to_ascii_lowercase().as_str() {
        "count" => Some(PlanIntent::Count),
        "group_by" => Some(PlanIntent::GroupBy),
        "top_n" => Some(PlanIntent::TopN),
        "list" => Some(PlanIntent::List),
        _ => None,
    }
}

/// Strip a markdown code fence if the oracle wrapped its JSON in one.
fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest).trim_start();
    match rest.find("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

// ============================================================================
// Oracle draft types
// ============================================================================

/// Unvalidated plan as the oracle produced it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlanDraft {
    intent: Option<String>,
    filters: Vec<FilterDraft>,
    group_by: Vec<String>,
    top_n: serde_json::Value,
    order_by: Option<OrderByDraft>,
    select: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FilterDraft {
    column: String,
    op: String,
    value: serde_json::Value,
    value2: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OrderByDraft {
    column: String,
    direction: String,
}

impl PlanDraft {
    /// Draft filters with a parseable operator and a usable value.
    fn filters(&self) -> Vec<Filter> {
        self.filters
            .iter()
            .filter_map(|draft| {
                let op = FilterOp::parse(&draft.op)?;
                let value = value_to_string(&draft.value)?;
                Some(Filter {
                    column: draft.column.clone(),
                    op,
                    value,
                    value2: value_to_string(&draft.value2),
                })
            })
            .collect()
    }

    fn top_n(&self) -> Option<u32> {
        match &self.top_n {
            serde_json::Value::Number(n) => n.as_u64().map(|n| n as u32),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

fn value_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
