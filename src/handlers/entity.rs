//! Entity CRUD handlers: list, read, create, update, delete, and the method dispatcher
//! that serves every path not claimed by the common routes.

use crate::error::GatewayError;
use crate::extractors::ForwardedHeaders;
use crate::response::{success_created, success_deleted, success_ok, success_updated};
use crate::routing::{filters_from_query, Pagination, RequestTarget};
use crate::state::AppState;
use crate::store::{KeyMatch, ListQuery, OrderBy, Row};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Current UTC time as an ISO-8601 string with millisecond precision.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn parse_json(body: &Bytes) -> Result<Value, GatewayError> {
    serde_json::from_slice(body).map_err(|e| GatewayError::Validation(format!("invalid JSON body: {}", e)))
}

fn body_to_row(value: Value) -> Result<Row, GatewayError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(GatewayError::Validation("body must be a JSON object".into())),
    }
}

/// One object or a non-empty array of objects.
fn body_to_rows(value: Value) -> Result<Vec<Row>, GatewayError> {
    match value {
        Value::Object(m) => Ok(vec![m]),
        Value::Array(items) if !items.is_empty() => items
            .into_iter()
            .map(|v| match v {
                Value::Object(m) => Ok(m),
                _ => Err(GatewayError::Validation("array items must be JSON objects".into())),
            })
            .collect(),
        _ => Err(GatewayError::Validation(
            "body must be a JSON object or a non-empty array of objects".into(),
        )),
    }
}

/// A creation stamp is missing when absent or falsy: null, false, zero or the empty string.
fn is_unset(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

fn key_for(state: &AppState, id: &str) -> KeyMatch {
    KeyMatch {
        column: state.entities.primary_key.clone(),
        value: id.to_string(),
    }
}

fn body_rejection(rejection: BytesRejection) -> GatewayError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::PayloadTooLarge(rejection.body_text())
    } else {
        GatewayError::Validation(rejection.body_text())
    }
}

/// Serves `{method} /{entity}[/{id}]`.
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    forwarded: ForwardedHeaders,
    query: Option<Query<Vec<(String, String)>>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, GatewayError> {
    let target = RequestTarget::from_path(uri.path());
    if target.entity.is_empty() {
        return Err(GatewayError::Routing {
            available: state.entities.available(),
        });
    }
    tracing::info!(
        method = %method,
        entity = %target.entity,
        id = target.id.as_deref().unwrap_or(""),
        bearer = forwarded.bearer_token().is_some(),
        "processing request"
    );
    let body = body.map_err(body_rejection)?;
    let params = match query {
        Some(Query(p)) => p,
        None => return Err(GatewayError::Validation("malformed query string".into())),
    };

    match method {
        Method::GET => match target.id.as_deref() {
            Some(id) => read(&state, &forwarded, &target.entity, id).await,
            None => list(&state, &forwarded, &target.entity, &params).await,
        },
        Method::POST => create(&state, &forwarded, &target.entity, &body).await,
        Method::PUT => match target.id.as_deref() {
            Some(id) => update(&state, &forwarded, &target.entity, id, &body).await,
            None => Err(GatewayError::Validation("ID is required for PUT requests".into())),
        },
        Method::DELETE => match target.id.as_deref() {
            Some(id) => delete(&state, &forwarded, &target.entity, id).await,
            None => Err(GatewayError::Validation("ID is required for DELETE requests".into())),
        },
        _ => Err(GatewayError::MethodNotAllowed),
    }
}

pub async fn list(
    state: &AppState,
    forwarded: &ForwardedHeaders,
    entity: &str,
    params: &[(String, String)],
) -> Result<Response, GatewayError> {
    let table = state.entities.resolve(entity)?;
    let page = Pagination::from_query(params, state.max_page_size)?;
    let filters = filters_from_query(params);
    let order = if table.reference {
        None
    } else {
        Some(OrderBy {
            column: state.entities.created_column.clone(),
            descending: true,
        })
    };
    tracing::info!(
        entity = %entity,
        table = %table.table,
        page = page.page,
        page_size = page.page_size,
        range = ?page.range(),
        filters = ?filters,
        "list"
    );
    let query = ListQuery {
        table: table.table.clone(),
        filters,
        order,
        offset: page.offset(),
        limit: page.limit(),
    };
    let rows = state.store.list(forwarded, &query).await?;
    Ok(success_ok(rows).into_response())
}

pub async fn read(
    state: &AppState,
    forwarded: &ForwardedHeaders,
    entity: &str,
    id: &str,
) -> Result<Response, GatewayError> {
    let table = state.entities.resolve(entity)?;
    tracing::info!(entity = %entity, table = %table.table, id = %id, "read");
    let row = state.store.fetch_one(forwarded, &table.table, &key_for(state, id)).await?;
    Ok(success_ok(row).into_response())
}

pub async fn create(
    state: &AppState,
    forwarded: &ForwardedHeaders,
    entity: &str,
    body: &Bytes,
) -> Result<Response, GatewayError> {
    let table = state.entities.resolve(entity)?;
    let mut rows = body_to_rows(parse_json(body)?)?;
    if !table.reference {
        let created = &state.entities.created_column;
        let now = now_timestamp();
        for row in rows.iter_mut() {
            if is_unset(row.get(created)) {
                row.insert(created.clone(), Value::String(now.clone()));
            }
        }
    }
    let payload = Value::Array(rows.iter().cloned().map(Value::Object).collect());
    tracing::info!(entity = %entity, table = %table.table, payload = %payload, "create");
    let inserted = state.store.insert(forwarded, &table.table, rows).await?;
    Ok(success_created(inserted).into_response())
}

pub async fn update(
    state: &AppState,
    forwarded: &ForwardedHeaders,
    entity: &str,
    id: &str,
    body: &Bytes,
) -> Result<Response, GatewayError> {
    let table = state.entities.resolve(entity)?;
    let mut changes = body_to_row(parse_json(body)?)?;
    if !table.reference {
        changes.insert(state.entities.updated_column.clone(), Value::String(now_timestamp()));
    }
    let payload = Value::Object(changes.clone());
    tracing::info!(entity = %entity, table = %table.table, id = %id, payload = %payload, "update");
    let updated = state
        .store
        .update(forwarded, &table.table, &key_for(state, id), changes)
        .await?;
    Ok(success_updated(updated).into_response())
}

pub async fn delete(
    state: &AppState,
    forwarded: &ForwardedHeaders,
    entity: &str,
    id: &str,
) -> Result<Response, GatewayError> {
    let table = state.entities.resolve(entity)?;
    tracing::info!(entity = %entity, table = %table.table, id = %id, "delete");
    state.store.delete(forwarded, &table.table, &key_for(state, id)).await?;
    Ok(success_deleted().into_response())
}
