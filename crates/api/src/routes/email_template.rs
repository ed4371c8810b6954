//! Route definitions for the `/templates` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::email_template;
use crate::state::AppState;

/// Routes mounted at `/templates`.
///
/// ```text
/// GET    /{id}                       -> get_template
/// PUT    /{id}                       -> update_template
/// GET    /{id}/parameters            -> get_parameters
/// GET    /{id}/recipients            -> list_recipients
/// POST   /{id}/recipients/upload     -> upload_recipients
/// POST   /{id}/test                  -> send_test
/// POST   /{id}/trigger               -> trigger
/// POST   /{id}/resend                -> resend
/// GET    /{id}/notifications         -> list_template_notifications
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}",
            get(email_template::get_template).put(email_template::update_template),
        )
        .route("/{id}/parameters", get(email_template::get_parameters))
        .route("/{id}/recipients", get(email_template::list_recipients))
        .route(
            "/{id}/recipients/upload",
            post(email_template::upload_recipients),
        )
        .route("/{id}/test", post(email_template::send_test))
        .route("/{id}/trigger", post(email_template::trigger))
        .route("/{id}/resend", post(email_template::resend))
        .route(
            "/{id}/notifications",
            get(email_template::list_template_notifications),
        )
}
