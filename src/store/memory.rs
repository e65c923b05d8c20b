//! In-process row store with the same filter, order and range semantics as the PostgreSQL one.
//! Tables must be declared up front; rows get a generated UUID id when none is given.

use super::{value_text, KeyMatch, ListQuery, Row, RowStore};
use crate::error::StoreError;
use crate::extractors::ForwardedHeaders;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

pub struct MemoryStore {
    primary_key: String,
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_primary_key("id", tables)
    }

    pub fn with_primary_key<I, S>(primary_key: &str, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MemoryStore {
            primary_key: primary_key.to_string(),
            tables: RwLock::new(tables.into_iter().map(|t| (t.into(), Vec::new())).collect()),
        }
    }

    /// Number of rows currently in `table`, if declared.
    pub fn row_count(&self, table: &str) -> Option<usize> {
        self.tables.read().ok()?.get(table).map(Vec::len)
    }

    fn key_matches(row: &Row, key: &KeyMatch) -> bool {
        row.get(&key.column).and_then(value_text).as_deref() == Some(key.value.as_str())
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".into())
}

/// NULLs sort first when descending, last when ascending (PostgreSQL default).
fn compare_column(a: &Row, b: &Row, column: &str) -> Ordering {
    let ka = a.get(column).and_then(value_text);
    let kb = b.get(column).and_then(value_text);
    match (ka, kb) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => x.cmp(&y),
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn list(&self, _ctx: &ForwardedHeaders, query: &ListQuery) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        let rows = tables
            .get(&query.table)
            .ok_or_else(|| StoreError::UnknownTable(query.table.clone()))?;
        let mut matched: Vec<&Row> = rows
            .iter()
            .filter(|row| {
                query
                    .filters
                    .iter()
                    .all(|(col, val)| row.get(col).and_then(value_text).as_deref() == Some(val.as_str()))
            })
            .collect();
        if let Some(order) = &query.order {
            matched.sort_by(|a, b| {
                let ord = compare_column(a, b, &order.column);
                if order.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }
        Ok(matched
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn fetch_one(&self, _ctx: &ForwardedHeaders, table: &str, key: &KeyMatch) -> Result<Row, StoreError> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        let rows = tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        let mut found: Vec<&Row> = rows.iter().filter(|r| Self::key_matches(r, key)).collect();
        match found.len() {
            1 => Ok(found.remove(0).clone()),
            count => Err(StoreError::NotSingle { count }),
        }
    }

    async fn insert(&self, _ctx: &ForwardedHeaders, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let existing = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;

        let mut staged: Vec<Row> = Vec::with_capacity(rows.len());
        for body in rows {
            let mut row = Row::new();
            let id = match body.get(&self.primary_key) {
                Some(v) if !v.is_null() => v.clone(),
                _ => Value::String(uuid::Uuid::new_v4().to_string()),
            };
            let id_text = value_text(&id);
            let duplicate = existing
                .iter()
                .chain(staged.iter())
                .any(|r| r.get(&self.primary_key).and_then(value_text) == id_text);
            if duplicate {
                return Err(StoreError::Rejected(format!(
                    "duplicate key value violates unique constraint \"{}_pkey\"",
                    table
                )));
            }
            row.insert(self.primary_key.clone(), id);
            for (k, v) in body {
                if k != self.primary_key {
                    row.insert(k, v);
                }
            }
            staged.push(row);
        }
        existing.extend(staged.iter().cloned());
        Ok(staged)
    }

    async fn update(
        &self,
        _ctx: &ForwardedHeaders,
        table: &str,
        key: &KeyMatch,
        changes: Row,
    ) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        let mut updated = Vec::new();
        for row in rows.iter_mut().filter(|r| Self::key_matches(r, key)) {
            for (k, v) in &changes {
                row.insert(k.clone(), v.clone());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, _ctx: &ForwardedHeaders, table: &str, key: &KeyMatch) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        rows.retain(|r| !Self::key_matches(r, key));
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.tables.read().map(|_| ()).map_err(|_| poisoned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::OrderBy;
    use serde_json::json;

    fn row(v: Value) -> Row {
        match v {
            Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    fn key(id: &str) -> KeyMatch {
        KeyMatch {
            column: "id".into(),
            value: id.into(),
        }
    }

    fn all(table: &str) -> ListQuery {
        ListQuery {
            table: table.into(),
            filters: vec![],
            order: None,
            offset: 0,
            limit: 100,
        }
    }

    #[tokio::test]
    async fn insert_generates_ids_and_keeps_given_ones() {
        let store = MemoryStore::new(["cases"]);
        let ctx = ForwardedHeaders::default();
        let out = store
            .insert(&ctx, "cases", vec![row(json!({ "title": "a" })), row(json!({ "id": 7, "title": "b" }))])
            .await
            .unwrap();
        assert_eq!(out.len(), 2);
        assert!(out[0]["id"].as_str().map(|s| s.len() == 36).unwrap_or(false));
        assert_eq!(out[1]["id"], json!(7));
        assert_eq!(out[0].keys().next().map(String::as_str), Some("id"));
        assert_eq!(store.row_count("cases"), Some(2));
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let store = MemoryStore::new(["cases"]);
        let ctx = ForwardedHeaders::default();
        store.insert(&ctx, "cases", vec![row(json!({ "id": "x" }))]).await.unwrap();
        let err = store.insert(&ctx, "cases", vec![row(json!({ "id": "x" }))]).await.unwrap_err();
        assert!(err.to_string().contains("cases_pkey"));
        assert_eq!(store.row_count("cases"), Some(1));
    }

    #[tokio::test]
    async fn unknown_table_is_a_store_error() {
        let store = MemoryStore::new(["cases"]);
        let err = store.list(&ForwardedHeaders::default(), &all("nope")).await.unwrap_err();
        assert_eq!(err.to_string(), "relation \"nope\" does not exist");
    }

    #[tokio::test]
    async fn list_filters_orders_and_slices() {
        let store = MemoryStore::new(["alerts"]);
        let ctx = ForwardedHeaders::default();
        let rows = (1..=5)
            .map(|i| {
                let level = if i % 2 == 0 { "low" } else { "high" };
                row(json!({
                    "id": i,
                    "risk_level": level,
                    "created_at": format!("2024-01-0{}T00:00:00.000Z", i),
                }))
            })
            .collect();
        store.insert(&ctx, "alerts", rows).await.unwrap();

        let mut q = all("alerts");
        q.filters = vec![("risk_level".into(), "high".into())];
        q.order = Some(OrderBy {
            column: "created_at".into(),
            descending: true,
        });
        let out = store.list(&ctx, &q).await.unwrap();
        let ids: Vec<i64> = out.iter().filter_map(|r| r["id"].as_i64()).collect();
        assert_eq!(ids, vec![5, 3, 1]);

        q.offset = 1;
        q.limit = 1;
        let out = store.list(&ctx, &q).await.unwrap();
        assert_eq!(out[0]["id"], json!(3));
    }

    #[tokio::test]
    async fn numeric_and_bool_filters_compare_as_text() {
        let store = MemoryStore::new(["metrics"]);
        let ctx = ForwardedHeaders::default();
        store
            .insert(&ctx, "metrics", vec![row(json!({ "year": 2024, "verified": true }))])
            .await
            .unwrap();
        let mut q = all("metrics");
        q.filters = vec![("year".into(), "2024".into()), ("verified".into(), "true".into())];
        assert_eq!(store.list(&ctx, &q).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fetch_one_requires_exactly_one() {
        let store = MemoryStore::new(["cases"]);
        let ctx = ForwardedHeaders::default();
        assert!(matches!(
            store.fetch_one(&ctx, "cases", &key("missing")).await,
            Err(StoreError::NotSingle { count: 0 })
        ));
        store.insert(&ctx, "cases", vec![row(json!({ "id": "a" }))]).await.unwrap();
        assert_eq!(store.fetch_one(&ctx, "cases", &key("a")).await.unwrap()["id"], json!("a"));
    }

    #[tokio::test]
    async fn update_merges_and_delete_is_idempotent() {
        let store = MemoryStore::new(["cases"]);
        let ctx = ForwardedHeaders::default();
        store
            .insert(&ctx, "cases", vec![row(json!({ "id": "a", "title": "t", "status": "open" }))])
            .await
            .unwrap();
        let out = store
            .update(&ctx, "cases", &key("a"), row(json!({ "status": "closed" })))
            .await
            .unwrap();
        assert_eq!(out[0]["title"], json!("t"));
        assert_eq!(out[0]["status"], json!("closed"));
        assert!(store
            .update(&ctx, "cases", &key("zzz"), row(json!({ "status": "x" })))
            .await
            .unwrap()
            .is_empty());

        store.delete(&ctx, "cases", &key("a")).await.unwrap();
        store.delete(&ctx, "cases", &key("a")).await.unwrap();
        assert_eq!(store.row_count("cases"), Some(0));
    }
}
