//! Plan rendering into parameterized SQL.
//!
//! Identifiers are always quoted; user-supplied values always travel as
//! bound positional parameters. Operator legality is decided by a single
//! operator-to-column-kind compatibility table.

use crate::catalog::{Catalog, ColumnKind};
use crate::store::{quote_ident, SqlParam};

use super::types::{Filter, FilterOp, PlanIntent, QueryPlan};

/// Default result size for top-n plans without a usable n.
const DEFAULT_TOP_N: u32 = 5;

/// A rendered statement: query text plus positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// Render a plan against a table.
///
/// `list_limit` caps list-style queries.
pub fn render(plan: &QueryPlan, catalog: &Catalog, table: &str, list_limit: usize) -> SqlStatement {
    let table_ident = quote_ident(table);
    let (where_clause, params) = render_conditions(&plan.filters, catalog);

    let sql = match (plan.intent, plan.order_by.as_ref()) {
        (PlanIntent::Count, _) => {
            format!("SELECT COUNT(*) FROM {}{}", table_ident, where_clause)
        }
        (PlanIntent::GroupBy, _) => {
            let group_cols = plan
                .group_by
                .iter()
                .map(|g| quote_ident(g))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "SELECT {}, COUNT(*) FROM {}{} GROUP BY {} ORDER BY COUNT(*) DESC",
                group_cols, table_ident, where_clause, group_cols
            )
        }
        (PlanIntent::TopN, Some(order)) => {
            let n = match plan.top_n {
                Some(n) if n > 0 => n,
                _ => DEFAULT_TOP_N,
            };
            format!(
                "SELECT * FROM {}{} ORDER BY {} {} LIMIT {}",
                table_ident,
                where_clause,
                quote_ident(&order.column),
                order.direction.as_sql(),
                n
            )
        }
        // A top-n plan without ordering degrades to a capped list.
        (PlanIntent::TopN, None) | (PlanIntent::List, _) => {
            let cols = if plan.select.is_empty() {
                "*".to_string()
            } else {
                plan.select
                    .iter()
                    .map(|c| quote_ident(c))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            format!(
                "SELECT {} FROM {}{} LIMIT {}",
                cols, table_ident, where_clause, list_limit
            )
        }
    };

    SqlStatement { sql, params }
}

/// Render filters into a WHERE clause and its parameter list.
///
/// Filters whose operator is incompatible with the column kind, and range
/// filters missing their second value, are suppressed here.
fn render_conditions(filters: &[Filter], catalog: &Catalog) -> (String, Vec<SqlParam>) {
    let mut conditions = Vec::new();
    let mut params: Vec<SqlParam> = Vec::new();

    for filter in filters {
        let Some(kind) = catalog.kind_of(&filter.column) else {
            continue;
        };
        if !op_supported(filter.op, kind) {
            tracing::debug!(
                "Dropping {:?} filter on {:?} column {}",
                filter.op,
                kind,
                filter.column
            );
            continue;
        }
        if filter.op.needs_second_value() && filter.value2.is_none() {
            continue;
        }

        let ident = quote_ident(&filter.column);
        match filter.op {
            FilterOp::Contains => {
                params.push(SqlParam::Text(format!("%{}%", filter.value.to_lowercase())));
                conditions.push(format!("LOWER({}) LIKE ?{}", ident, params.len()));
            }
            FilterOp::Equals | FilterOp::Gt | FilterOp::Lt | FilterOp::Gte | FilterOp::Lte => {
                params.push(typed_param(&filter.value, kind));
                conditions.push(format!(
                    "{} {} ?{}",
                    ident,
                    comparison_sql(filter.op),
                    params.len()
                ));
            }
            FilterOp::Between => {
                let value2 = filter.value2.as_deref().unwrap_or_default();
                params.push(typed_param(&filter.value, kind));
                let low = params.len();
                params.push(typed_param(value2, kind));
                conditions.push(format!("{} BETWEEN ?{} AND ?{}", ident, low, params.len()));
            }
            FilterOp::On | FilterOp::After | FilterOp::Before => {
                let cmp = match filter.op {
                    FilterOp::On => "=",
                    FilterOp::After => ">=",
                    _ => "<=",
                };
                params.push(SqlParam::Text(filter.value.clone()));
                conditions.push(format!("DATE({}) {} ?{}", ident, cmp, params.len()));
            }
            FilterOp::BetweenDates => {
                let value2 = filter.value2.as_deref().unwrap_or_default();
                params.push(SqlParam::Text(filter.value.clone()));
                let low = params.len();
                params.push(SqlParam::Text(value2.to_string()));
                conditions.push(format!(
                    "DATE({}) BETWEEN ?{} AND ?{}",
                    ident, low, params.len()
                ));
            }
            FilterOp::IsTrue => conditions.push(format!("{} = TRUE", ident)),
            FilterOp::IsFalse => conditions.push(format!("{} = FALSE", ident)),
        }
    }

    if conditions.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), params)
    }
}

/// Operator-to-kind compatibility table.
fn op_supported(op: FilterOp, kind: ColumnKind) -> bool {
    use ColumnKind::*;
    use FilterOp::*;
    match op {
        Contains => matches!(kind, Text | Other),
        Equals => matches!(kind, Text | Numeric | Date | Other),
        Gt | Lt | Gte | Lte | Between => matches!(kind, Numeric | Date | Other),
        On | After | Before | BetweenDates => matches!(kind, Date | Text | Other),
        IsTrue | IsFalse => matches!(kind, Boolean),
    }
}

fn comparison_sql(op: FilterOp) -> &'static str {
    match op {
        FilterOp::Equals => "=",
        FilterOp::Gt => ">",
        FilterOp::Lt => "<",
        FilterOp::Gte => ">=",
        FilterOp::Lte => "<=",
        _ => unreachable!("not a comparison operator"),
    }
}

/// Bind numeric-looking values as numbers so comparisons against numeric
/// columns keep numeric affinity.
fn typed_param(value: &str, kind: ColumnKind) -> SqlParam {
    if kind == ColumnKind::Numeric {
        if let Ok(i) = value.trim().parse::<i64>() {
            return SqlParam::Integer(i);
        }
        if let Ok(f) = value.trim().parse::<f64>() {
            return SqlParam::Real(f);
        }
    }
    SqlParam::Text(value.to_string())
}
