use axum::routing::get;
use axum::Router;

use crate::handlers::person;
use crate::state::AppState;

/// Routes mounted at `/persons`.
///
/// ```text
/// GET    /          -> list_persons
/// GET    /{id}      -> get_person
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(person::list_persons))
        .route("/{id}", get(person::get_person))
}
