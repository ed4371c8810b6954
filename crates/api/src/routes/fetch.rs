//! Route definitions for registry fetches.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::fetch;
use crate::state::AppState;

/// Root-level `/fetch`, guarded by the notifications token rather than JWT.
pub fn router() -> Router<AppState> {
    Router::new().route("/fetch", get(fetch::scheduled_fetch))
}

/// Routes mounted at `/actions`.
///
/// ```text
/// POST   /fetch/{registry}   -> fetch_registry
/// ```
pub fn actions_router() -> Router<AppState> {
    Router::new().route("/fetch/{registry}", post(fetch::fetch_registry))
}
