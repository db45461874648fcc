//! Structured query execution and answer formatting.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::planner::{render, PlanIntent, QueryPlan};
use crate::store::{RelationalStore, Row};

/// Marker prefixing user-visible store failures.
const ERROR_MARKER: &str = "Database error:";

/// Executes plans against the relational store and formats results.
///
/// Failures never propagate as errors: they surface as tagged strings the
/// orchestrator branches on.
pub struct StructuredExecutor {
    store: Arc<RelationalStore>,
    table: String,
    list_limit: usize,
}

impl StructuredExecutor {
    pub fn new(store: Arc<RelationalStore>, table: impl Into<String>, list_limit: usize) -> Self {
        Self {
            store,
            table: table.into(),
            list_limit,
        }
    }

    /// Render, execute, and format a plan.
    pub async fn run(&self, plan: &QueryPlan, catalog: &Catalog) -> String {
        let stmt = render(plan, catalog, &self.table, self.list_limit);
        tracing::debug!("Executing: {} ({} params)", stmt.sql, stmt.params.len());

        let rows = match self.store.execute(stmt.sql, stmt.params).await {
            Ok(rows) => rows,
            Err(e) => return format!("{} {}", ERROR_MARKER, e),
        };

        format_rows(plan.intent, &rows)
    }
}

/// Format fetched rows according to the plan intent.
fn format_rows(intent: PlanIntent, rows: &[Row]) -> String {
    match intent {
        PlanIntent::Count => {
            let count = rows
                .first()
                .and_then(|row| row.first())
                .and_then(|cell| cell.as_i64())
                .unwrap_or(0);
            format!("Count result: **{}** records.", count)
        }
        PlanIntent::GroupBy => {
            if rows.is_empty() {
                return "No results.".to_string();
            }
            let lines: Vec<String> = rows
                .iter()
                .map(|row| {
                    // Last cell is the count; everything before it labels
                    // the group.
                    let (count, labels) = row.split_last().map_or((None, &row[..]), |(c, l)| {
                        (Some(c), l)
                    });
                    let label = labels
                        .iter()
                        .map(|c| c.to_string())
                        .collect::<Vec<_>>()
                        .join(" / ");
                    match count {
                        Some(count) => format!("- {}: {}", label, count),
                        None => format!("- {}", label),
                    }
                })
                .collect();
            format!("Breakdown:\n{}", lines.join("\n"))
        }
        PlanIntent::TopN => {
            if rows.is_empty() {
                return "No results.".to_string();
            }
            let lines: Vec<String> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|c| c.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .collect();
            format!("Top results:\n{}", lines.join("\n"))
        }
        PlanIntent::List => {
            let shown = rows.len().min(10);
            format!("Retrieved {} rows (showing {}).", rows.len(), shown)
        }
    }
}

/// Whether an executor answer is the tagged error form.
pub fn is_error(answer: &str) -> bool {
    answer.starts_with(ERROR_MARKER)
}

/// Whether an executor answer carries no usable data.
///
/// Degenerate structured answers trigger the semantic fallback path.
pub fn is_degenerate(answer: &str) -> bool {
    answer == "No results." || answer.starts_with("Retrieved 0 rows")
}
