//! Route definitions for the `/cycles` resource and its stages.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{cycle, stage};
use crate::state::AppState;

/// Routes mounted at `/cycles`.
///
/// ```text
/// POST   /                      -> create_cycle
/// GET    /{id}                  -> get_cycle
/// PUT    /{id}                  -> update_cycle
/// GET    /{id}/stages           -> list_stages
/// POST   /{id}/stages           -> create_stage
/// GET    /{id}/notifications    -> list_cycle_notifications
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(cycle::create_cycle))
        .route("/{id}", get(cycle::get_cycle).put(cycle::update_cycle))
        .route(
            "/{id}/stages",
            get(stage::list_stages).post(stage::create_stage),
        )
        .route(
            "/{id}/notifications",
            get(cycle::list_cycle_notifications),
        )
}
