pub mod auth;
pub mod company;
pub mod cycle;
pub mod email_template;
pub mod fetch;
pub mod health;
pub mod person;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                      login (public)
///
/// /dashboard                                       cycles + groups
/// /groups                                          groups with template counts
/// /notifications                                   send log (paginated)
///
/// /cycles                                          create
/// /cycles/{id}                                     get, update
/// /cycles/{id}/stages                              list, create
/// /cycles/{id}/notifications                       send log of the cycle
///
/// /templates/{id}                                  get, update (drafts only)
/// /templates/{id}/parameters                       accepted and used placeholders
/// /templates/{id}/recipients                       current recipients
/// /templates/{id}/recipients/upload                CSV external-id filter (POST)
/// /templates/{id}/test                             test send (POST)
/// /templates/{id}/trigger                          first send (POST)
/// /templates/{id}/resend                           repeat send (POST)
/// /templates/{id}/notifications                    send log of the template
///
/// /companies                                       list, create
/// /companies/{id}                                  get, delete
///
/// /persons                                         list
/// /persons/{id}                                    get
///
/// /actions/fetch/{registry}                        fetch one registry (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .route("/dashboard", get(handlers::dashboard::get_dashboard))
        .route("/groups", get(handlers::group::list_groups))
        .route(
            "/notifications",
            get(handlers::notification::list_notifications),
        )
        .nest("/cycles", cycle::router())
        .nest("/templates", email_template::router())
        .nest("/companies", company::router())
        .nest("/persons", person::router())
        .nest("/actions", fetch::actions_router())
}
