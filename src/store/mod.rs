//! Relational store access.
//!
//! Connections are opened per call inside a blocking task and released on
//! every exit path; no pooling. Query text uses quoted identifiers and
//! positional placeholders only, with all values bound as parameters.

use std::fmt;
use std::path::PathBuf;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, ToSql};

use crate::error::StoreError;

/// A value bound into a query as a positional parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Integer(i64),
    Real(f64),
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            SqlParam::Text(s) => s.to_sql(),
            SqlParam::Integer(i) => i.to_sql(),
            SqlParam::Real(f) => f.to_sql(),
        }
    }
}

/// A single result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Cell {
    /// Integer view of the cell, if it holds one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, ""),
            Cell::Integer(i) => write!(f, "{}", i),
            Cell::Real(r) => write!(f, "{}", r),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A result row.
pub type Row = Vec<Cell>;

/// Quote an identifier for embedding in query text.
///
/// Column names in the customer schema contain spaces, so every identifier
/// is double-quoted with internal quotes doubled.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQLite-backed relational store with per-call scoped connections.
#[derive(Debug, Clone)]
pub struct RelationalStore {
    path: PathBuf,
}

impl RelationalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Execute a query with positional parameters and fetch all rows.
    ///
    /// Statements that return no rows (DDL, inserts) yield an empty vec.
    pub async fn execute(
        &self,
        sql: String,
        params: Vec<SqlParam>,
    ) -> Result<Vec<Row>, StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = open_connection(&path)?;
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| StoreError::Query(e.to_string()))?;

            let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
            let mut rows = stmt
                .query(param_refs.as_slice())
                .map_err(|e| StoreError::Query(e.to_string()))?;

            let mut out = Vec::new();
            loop {
                match rows.next() {
                    Ok(Some(row)) => {
                        let width = row.as_ref().column_count();
                        let mut cells = Vec::with_capacity(width);
                        for i in 0..width {
                            let value = row
                                .get_ref(i)
                                .map_err(|e| StoreError::Query(e.to_string()))?;
                            cells.push(cell_from_value(value));
                        }
                        out.push(cells);
                    }
                    Ok(None) => break,
                    Err(e) => return Err(StoreError::Query(e.to_string())),
                }
            }
            Ok(out)
        })
        .await
        .map_err(|e| StoreError::Query(format!("query task failed: {e}")))?
    }

    /// List column names for a table, in declaration order.
    pub async fn list_columns(&self, table: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .column_types(table)
            .await?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    /// Column names with their declared types, in declaration order.
    pub async fn column_types(&self, table: &str) -> Result<Vec<(String, String)>, StoreError> {
        let path = self.path.clone();
        let table = table.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = open_connection(&path)?;
            let sql = format!("PRAGMA table_info({})", quote_ident(&table));
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| StoreError::Query(e.to_string()))?;
            let rows = stmt
                .query_map([], |row| {
                    let name: String = row.get(1)?;
                    let declared: String = row.get(2)?;
                    Ok((name, declared))
                })
                .map_err(|e| StoreError::Query(e.to_string()))?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row.map_err(|e| StoreError::Query(e.to_string()))?);
            }
            Ok(out)
        })
        .await
        .map_err(|e| StoreError::Query(format!("query task failed: {e}")))?
    }
}

fn open_connection(path: &PathBuf) -> Result<Connection, StoreError> {
    let conn = Connection::open(path).map_err(|e| StoreError::Connection(e.to_string()))?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(|e| StoreError::Connection(e.to_string()))?;
    Ok(conn)
}

fn cell_from_value(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => Cell::Null,
        ValueRef::Integer(i) => Cell::Integer(i),
        ValueRef::Real(r) => Cell::Real(r),
        ValueRef::Text(t) => Cell::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(_) => Cell::Null,
    }
}
