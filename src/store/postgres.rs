//! Row store over a PostgreSQL pool.

use super::{KeyMatch, ListQuery, Row, RowStore};
use crate::error::StoreError;
use crate::extractors::ForwardedHeaders;
use crate::sql::{self, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

/// Session setting the forwarded caller headers are published under, transaction-local.
pub const REQUEST_HEADERS_SETTING: &str = "request.headers";

#[derive(Clone)]
pub struct PgRowStore {
    pool: PgPool,
    schema: String,
}

impl PgRowStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgRowStore {
            pool,
            schema: schema.into(),
        }
    }

    /// Connect a pool once at startup.
    pub async fn connect(database_url: &str, max_connections: u32, schema: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool, schema))
    }

    /// Open the per-request transaction and expose the caller headers to row-level policies.
    async fn begin(&self, ctx: &ForwardedHeaders) -> Result<Transaction<'static, Postgres>, StoreError> {
        let mut tx = self.pool.begin().await?;
        if !ctx.is_empty() {
            sqlx::query("SELECT set_config($1, $2, true)")
                .bind(REQUEST_HEADERS_SETTING)
                .bind(ctx.to_json().to_string())
                .execute(&mut *tx)
                .await?;
        }
        Ok(tx)
    }

    async fn fetch_rows(tx: &mut Transaction<'static, Postgres>, q: &QueryBuf) -> Result<Vec<Row>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, Value>(&q.sql);
        for p in &q.params {
            query = query.bind(p.as_str());
        }
        let values = query.fetch_all(&mut **tx).await?;
        values.into_iter().map(into_row).collect()
    }

    async fn execute(tx: &mut Transaction<'static, Postgres>, q: &QueryBuf) -> Result<u64, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.as_str());
        }
        let done = query.execute(&mut **tx).await?;
        Ok(done.rows_affected())
    }
}

fn into_row(v: Value) -> Result<Row, StoreError> {
    match v {
        Value::Object(m) => Ok(m),
        other => Err(StoreError::Rejected(format!("expected a row object, got {}", other))),
    }
}

#[async_trait]
impl RowStore for PgRowStore {
    async fn list(&self, ctx: &ForwardedHeaders, query: &ListQuery) -> Result<Vec<Row>, StoreError> {
        let q = sql::select_list(&self.schema, query);
        let mut tx = self.begin(ctx).await?;
        let rows = Self::fetch_rows(&mut tx, &q).await?;
        tx.commit().await?;
        Ok(rows)
    }

    async fn fetch_one(&self, ctx: &ForwardedHeaders, table: &str, key: &KeyMatch) -> Result<Row, StoreError> {
        let q = sql::select_by_key(&self.schema, table, key);
        let mut tx = self.begin(ctx).await?;
        let mut rows = Self::fetch_rows(&mut tx, &q).await?;
        tx.commit().await?;
        if rows.len() != 1 {
            return Err(StoreError::NotSingle { count: rows.len() });
        }
        rows.pop().ok_or(StoreError::NotSingle { count: 0 })
    }

    async fn insert(&self, ctx: &ForwardedHeaders, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        let q = sql::insert(&self.schema, table, &rows);
        // A defaults-only insert creates one row per execution.
        let runs = if q.params.is_empty() { rows.len() } else { 1 };
        let mut tx = self.begin(ctx).await?;
        let mut out = Vec::with_capacity(rows.len());
        for _ in 0..runs {
            out.extend(Self::fetch_rows(&mut tx, &q).await?);
        }
        tx.commit().await?;
        Ok(out)
    }

    async fn update(
        &self,
        ctx: &ForwardedHeaders,
        table: &str,
        key: &KeyMatch,
        changes: Row,
    ) -> Result<Vec<Row>, StoreError> {
        let q = sql::update(&self.schema, table, key, &changes);
        let mut tx = self.begin(ctx).await?;
        let rows = Self::fetch_rows(&mut tx, &q).await?;
        tx.commit().await?;
        Ok(rows)
    }

    async fn delete(&self, ctx: &ForwardedHeaders, table: &str, key: &KeyMatch) -> Result<(), StoreError> {
        let q = sql::delete(&self.schema, table, key);
        let mut tx = self.begin(ctx).await?;
        let affected = Self::execute(&mut tx, &q).await?;
        tx.commit().await?;
        tracing::debug!(table = %table, affected, "delete");
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}
