//! Query plan types.

use serde::{Deserialize, Serialize};

/// Filter operator. Wire names match the compact plan JSON the oracle
/// produces ("=", ">=", "between_dates", ...); snake_case names are
/// accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Contains,
    #[serde(rename = "=", alias = "equals")]
    Equals,
    #[serde(rename = ">", alias = "gt")]
    Gt,
    #[serde(rename = "<", alias = "lt")]
    Lt,
    #[serde(rename = ">=", alias = "gte")]
    Gte,
    #[serde(rename = "<=", alias = "lte")]
    Lte,
    Between,
    On,
    After,
    Before,
    BetweenDates,
    IsTrue,
    IsFalse,
}

impl FilterOp {
    /// Parse a wire operator string, tolerating both symbol and word forms.
    pub fn parse(op: &str) -> Option<Self> {
        match op.trim().to_ascii_lowercase().as_str() {
            "contains" => Some(Self::Contains),
            "=" | "equals" | "eq" => Some(Self::Equals),
            ">" | "gt" => Some(Self::Gt),
            "<" | "lt" => Some(Self::Lt),
            ">=" | "gte" => Some(Self::Gte),
            "<=" | "lte" => Some(Self::Lte),
            "between" => Some(Self::Between),
            "on" => Some(Self::On),
            "after" => Some(Self::After),
            "before" => Some(Self::Before),
            "between_dates" => Some(Self::BetweenDates),
            "is_true" => Some(Self::IsTrue),
            "is_false" => Some(Self::IsFalse),
            _ => None,
        }
    }

    /// Whether this operator needs a second value.
    pub fn needs_second_value(&self) -> bool {
        matches!(self, Self::Between | Self::BetweenDates)
    }
}

/// A single filter condition against a catalog column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<String>,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
            value2: None,
        }
    }
}

/// Analytical intent of a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanIntent {
    Count,
    GroupBy,
    TopN,
    #[default]
    List,
}

/// Sort direction for top-n ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Ordering clause for top-n plans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// A typed, catalog-validated query plan.
///
/// Constructed fresh per question and discarded after execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub intent: PlanIntent,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub group_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_n: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    #[serde(default)]
    pub select: Vec<String>,
}
