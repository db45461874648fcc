//! Column catalog for the target table.
//!
//! The catalog governs which filters are legal: planner passes drop any
//! filter whose column is not a member. It is loaded from store metadata,
//! treated as read-only, and cached with a TTL refresh.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::store::RelationalStore;

/// Kind tag for a catalog column, driving operator compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Boolean,
    Numeric,
    Date,
    Other,
}

impl ColumnKind {
    /// Map a declared SQL type to a kind tag.
    pub fn from_declared(declared: &str) -> Self {
        let ty = declared.to_ascii_lowercase();
        if ty.contains("bool") {
            ColumnKind::Boolean
        } else if ty.contains("int")
            || ty.contains("real")
            || ty.contains("numeric")
            || ty.contains("decimal")
            || ty.contains("double")
            || ty.contains("float")
        {
            ColumnKind::Numeric
        } else if ty.contains("date") || ty.contains("time") {
            ColumnKind::Date
        } else if ty.contains("char") || ty.contains("text") || ty.contains("clob") {
            ColumnKind::Text
        } else {
            ColumnKind::Other
        }
    }
}

/// A catalog column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered set of columns for the target table.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    columns: Vec<Column>,
}

impl Catalog {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Build a catalog from (name, declared type) pairs.
    pub fn from_declared(pairs: &[(String, String)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(name, declared)| Column {
                    name: name.clone(),
                    kind: ColumnKind::from_declared(declared),
                })
                .collect(),
        )
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Case-insensitive membership check.
    pub fn contains(&self, name: &str) -> bool {
        self.canonical(name).is_some()
    }

    /// Resolve a column reference to its catalog spelling, case-insensitively.
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.name.as_str())
    }

    /// Kind of a column, resolved case-insensitively.
    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.kind)
    }
}

/// TTL-cached catalog loader.
///
/// The schema is treated as immutable between refreshes; a failed reload
/// falls back to the last good catalog so planning never hard-fails.
pub struct CatalogCache {
    store: Arc<RelationalStore>,
    table: String,
    ttl: Duration,
    cached: RwLock<Option<(Catalog, Instant)>>,
}

impl CatalogCache {
    pub fn new(store: Arc<RelationalStore>, table: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            table: table.into(),
            ttl,
            cached: RwLock::new(None),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Current catalog, reloading if the cached copy has expired.
    pub async fn get(&self) -> Catalog {
        {
            let cached = self.cached.read();
            if let Some((catalog, loaded_at)) = cached.as_ref() {
                if loaded_at.elapsed() < self.ttl {
                    return catalog.clone();
                }
            }
        }

        match self.store.column_types(&self.table).await {
            Ok(pairs) => {
                let catalog = Catalog::from_declared(&pairs);
                *self.cached.write() = Some((catalog.clone(), Instant::now()));
                catalog
            }
            Err(e) => {
                tracing::warn!("Catalog reload failed for {}: {}", self.table, e);
                let cached = self.cached.read();
                cached
                    .as_ref()
                    .map(|(catalog, _)| catalog.clone())
                    .unwrap_or_default()
            }
        }
    }
}
