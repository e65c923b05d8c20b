//! Router assembly.

mod common;
mod entity;

pub use common::common_routes;
pub use entity::entity_routes;

use crate::cors::cors;
use crate::error::{GatewayError, INTERNAL_ERROR_MESSAGE};
use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, middleware, response::IntoResponse, response::Response, Router};
use std::any::Any;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        INTERNAL_ERROR_MESSAGE.to_string()
    };
    GatewayError::Internal(format!("handler panicked: {}", detail)).into_response()
}

/// Full application: common routes, the gateway fallback, and the cross-cutting layers.
/// CORS is outermost so preflight never reaches routing and every response carries the headers.
/// Bodies over `body_limit` fail in the dispatcher's body extractor and come back as a JSON 413.
pub fn app(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(entity_routes(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(cors))
}
