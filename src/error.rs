//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Usage hint returned when the path carries no entity segment.
pub const INVALID_ROUTE_MESSAGE: &str = "Invalid route. Use /api/{entity} or /api/{entity}/{id}";

/// Message returned for every uncaught failure; details stay in the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config load: {0}")]
    Load(String),
    #[error("invalid table name for entity '{entity}': {table}")]
    InvalidTable { entity: String, table: String },
    #[error("validation: {0}")]
    Validation(String),
    #[error("setting {name}: {message}")]
    Setting { name: &'static str, message: String },
}

/// Failure reported by the backing row store. The message is surfaced to callers as-is.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("JSON object requested, multiple (or no) rows returned")]
    NotSingle { count: usize },
    #[error("relation \"{0}\" does not exist")]
    UnknownTable(String),
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid route. Use /api/{{entity}} or /api/{{entity}}/{{id}}")]
    Routing { available: Vec<String> },
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(rename = "availableEntities", skip_serializing_if = "Option::is_none")]
    pub available_entities: Option<Vec<String>>,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Routing { .. } => StatusCode::BAD_REQUEST,
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Store(_) => StatusCode::BAD_REQUEST,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            GatewayError::Internal(detail) => {
                tracing::error!(error = %detail, "unhandled error");
                ErrorBody {
                    error: INTERNAL_ERROR_MESSAGE.to_string(),
                    available_entities: None,
                }
            }
            GatewayError::Routing { available } => {
                tracing::warn!(status = status.as_u16(), "request has no entity");
                ErrorBody {
                    error: INVALID_ROUTE_MESSAGE.to_string(),
                    available_entities: Some(available),
                }
            }
            other => {
                tracing::warn!(status = status.as_u16(), error = %other, "request failed");
                ErrorBody {
                    error: other.to_string(),
                    available_entities: None,
                }
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_bad_request() {
        let err = GatewayError::from(StoreError::UnknownTable("public.nope".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "relation \"public.nope\" does not exist");
    }

    #[test]
    fn single_row_failure_message_is_stable() {
        let err = GatewayError::from(StoreError::NotSingle { count: 0 });
        assert_eq!(
            err.to_string(),
            "JSON object requested, multiple (or no) rows returned"
        );
    }

    #[test]
    fn internal_and_method_statuses() {
        assert_eq!(
            GatewayError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            GatewayError::PayloadTooLarge("length limit exceeded".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
