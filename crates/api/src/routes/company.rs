use axum::routing::get;
use axum::Router;

use crate::handlers::company;
use crate::state::AppState;

/// Routes mounted at `/companies`.
///
/// ```text
/// GET    /          -> list_companies
/// POST   /          -> create_company (ALLOW_EDITING_COMPANIES)
/// GET    /{id}      -> get_company
/// DELETE /{id}      -> delete_company (ALLOW_EDITING_COMPANIES)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(company::list_companies).post(company::create_company),
        )
        .route(
            "/{id}",
            get(company::get_company).delete(company::delete_company),
        )
}
