//! Row store seam: the gateway's only collaborator for data. One call per request.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgRowStore;

use crate::error::StoreError;
use crate::extractors::ForwardedHeaders;
use async_trait::async_trait;
use serde_json::Value;

/// A table row: column name to JSON value, in column order.
pub type Row = serde_json::Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

/// Filtered, ordered slice of one table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQuery {
    pub table: String,
    /// Exact-match filters on the column's text form, AND-combined.
    pub filters: Vec<(String, String)>,
    pub order: Option<OrderBy>,
    pub offset: u64,
    pub limit: u64,
}

/// Primary key column and the value to match (compared as text).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyMatch {
    pub column: String,
    pub value: String,
}

#[async_trait]
pub trait RowStore: Send + Sync {
    async fn list(&self, ctx: &ForwardedHeaders, query: &ListQuery) -> Result<Vec<Row>, StoreError>;

    /// Exactly one row, or `StoreError::NotSingle`.
    async fn fetch_one(&self, ctx: &ForwardedHeaders, table: &str, key: &KeyMatch) -> Result<Row, StoreError>;

    /// Insert all rows in one statement; returns them as stored.
    async fn insert(&self, ctx: &ForwardedHeaders, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError>;

    /// Overwrite the given columns on rows matching `key`. Matching nothing is not an error.
    async fn update(
        &self,
        ctx: &ForwardedHeaders,
        table: &str,
        key: &KeyMatch,
        changes: Row,
    ) -> Result<Vec<Row>, StoreError>;

    /// Delete rows matching `key`. Matching nothing is not an error.
    async fn delete(&self, ctx: &ForwardedHeaders, table: &str, key: &KeyMatch) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Text form of a JSON value as compared by equality filters. `None` for null, which never matches.
pub fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(v.to_string()),
    }
}
