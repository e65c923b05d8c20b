//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for any table without column metadata.
//! Rows come back as `to_jsonb(t)`; written values go through `jsonb_populate_record(set)` so the
//! database coerces them to the table's column types and fills its own defaults. Filter and key
//! values are converted to the column's type the same way, so comparisons run on typed values
//! and can use the table's indexes.

use crate::store::{KeyMatch, ListQuery, Row};

/// Alias of the target table in every statement.
const TABLE_ALIAS: &str = "t";
/// Alias of the populated source record in UPDATE.
const SOURCE_ALIAS: &str = "src";

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<String>,
}

impl QueryBuf {
    fn push_param(&mut self, v: String) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

fn row_json() -> String {
    format!("to_jsonb({})", TABLE_ALIAS)
}

/// `t."col" = <value as col's type>`: the text value is cast through a one-field record of the
/// table's row type.
fn typed_eq(q: &mut QueryBuf, table: &str, column: &str, value: &str) -> String {
    let name = q.push_param(column.to_string());
    let val = q.push_param(value.to_string());
    format!(
        "{alias}.{col} = (jsonb_populate_record(NULL::{table}, jsonb_build_object(${name}::text, ${val}::text))).{col}",
        alias = TABLE_ALIAS,
        col = quoted(column),
        table = table,
        name = name,
        val = val
    )
}

fn key_condition(q: &mut QueryBuf, table: &str, key: &KeyMatch) -> String {
    typed_eq(q, table, &key.column, &key.value)
}

/// SELECT page: typed equality filters, optional ORDER BY, LIMIT/OFFSET.
pub fn select_list(schema: &str, query: &ListQuery) -> QueryBuf {
    let mut q = QueryBuf::default();
    let table = qualified_table(schema, &query.table);

    let mut where_parts = Vec::new();
    for (col, val) in &query.filters {
        where_parts.push(typed_eq(&mut q, &table, col, val));
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    let order_clause = query
        .order
        .as_ref()
        .map(|o| {
            format!(
                " ORDER BY {}.{} {}",
                TABLE_ALIAS,
                quoted(&o.column),
                if o.descending { "DESC" } else { "ASC" }
            )
        })
        .unwrap_or_default();

    q.sql = format!(
        "SELECT {} FROM {} AS {}{}{} LIMIT {} OFFSET {}",
        row_json(),
        table,
        TABLE_ALIAS,
        where_clause,
        order_clause,
        query.limit,
        query.offset
    );
    q
}

/// SELECT by key. Limited to two rows: enough to tell "one" from "several".
pub fn select_by_key(schema: &str, table: &str, key: &KeyMatch) -> QueryBuf {
    let mut q = QueryBuf::default();
    let target = qualified_table(schema, table);
    let cond = key_condition(&mut q, &target, key);
    q.sql = format!(
        "SELECT {} FROM {} AS {} WHERE {} LIMIT 2",
        row_json(),
        target,
        TABLE_ALIAS,
        cond
    );
    q
}

/// Union of row keys in first-seen order.
pub fn insert_columns(rows: &[Row]) -> Vec<String> {
    let mut cols: Vec<String> = Vec::new();
    for row in rows {
        for k in row.keys() {
            if !cols.iter().any(|c| c == k) {
                cols.push(k.clone());
            }
        }
    }
    cols
}

/// INSERT of all rows from one JSON array parameter. Columns are the union of row keys;
/// a row missing one of them inserts NULL there. With no columns at all, inserts a row of
/// defaults (run once per requested row).
pub fn insert(schema: &str, table: &str, rows: &[Row]) -> QueryBuf {
    let mut q = QueryBuf::default();
    let target = qualified_table(schema, table);
    let cols = insert_columns(rows);
    if cols.is_empty() {
        q.sql = format!(
            "INSERT INTO {} AS {} DEFAULT VALUES RETURNING {}",
            target,
            TABLE_ALIAS,
            row_json()
        );
        return q;
    }
    let payload = serde_json::Value::Array(rows.iter().cloned().map(serde_json::Value::Object).collect());
    let n = q.push_param(payload.to_string());
    let col_list = cols.iter().map(|c| quoted(c)).collect::<Vec<_>>().join(", ");
    q.sql = format!(
        "INSERT INTO {} AS {} ({}) SELECT {} FROM jsonb_populate_recordset(NULL::{}, ${}::jsonb) RETURNING {}",
        target,
        TABLE_ALIAS,
        col_list,
        col_list,
        target,
        n,
        row_json()
    );
    q
}

/// UPDATE by key: SET only columns present in `changes`. With nothing to set, selects the
/// matching rows instead.
pub fn update(schema: &str, table: &str, key: &KeyMatch, changes: &Row) -> QueryBuf {
    let mut q = QueryBuf::default();
    let target = qualified_table(schema, table);
    if changes.is_empty() {
        let cond = key_condition(&mut q, &target, key);
        q.sql = format!(
            "SELECT {} FROM {} AS {} WHERE {}",
            row_json(),
            target,
            TABLE_ALIAS,
            cond
        );
        return q;
    }
    let n = q.push_param(serde_json::Value::Object(changes.clone()).to_string());
    let sets = changes
        .keys()
        .map(|c| format!("{} = {}.{}", quoted(c), SOURCE_ALIAS, quoted(c)))
        .collect::<Vec<_>>()
        .join(", ");
    let cond = key_condition(&mut q, &target, key);
    q.sql = format!(
        "UPDATE {} AS {} SET {} FROM jsonb_populate_record(NULL::{}, ${}::jsonb) AS {} WHERE {} RETURNING {}",
        target,
        TABLE_ALIAS,
        sets,
        target,
        n,
        SOURCE_ALIAS,
        cond,
        row_json()
    );
    q
}

/// DELETE by key.
pub fn delete(schema: &str, table: &str, key: &KeyMatch) -> QueryBuf {
    let mut q = QueryBuf::default();
    let target = qualified_table(schema, table);
    let cond = key_condition(&mut q, &target, key);
    q.sql = format!(
        "DELETE FROM {} AS {} WHERE {}",
        target,
        TABLE_ALIAS,
        cond
    );
    q
}
