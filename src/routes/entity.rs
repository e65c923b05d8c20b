//! Gateway routes: every path not claimed by the common routes is an entity request.
//! The entity and id are parsed from the raw path by the dispatcher, so `/api/...` and bare
//! `/{entity}` forms share one handler.

use crate::handlers::entity::dispatch;
use crate::state::AppState;
use axum::Router;

pub fn entity_routes(state: AppState) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}
