//! Shared-secret guard for the scheduled `/fetch` endpoint.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use notifications_core::error::CoreError;

use crate::error::AppError;
use crate::middleware::auth::bearer_token;
use crate::state::AppState;

/// Proof that the caller presented `Bearer <NOTIFICATIONS_TOKEN>`.
///
/// Any other header, and every request while no token is configured, is
/// rejected with 403.
#[derive(Debug, Clone, Copy)]
pub struct FetchToken;

impl FromRequestParts<AppState> for FetchToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let expected = state.config.notifications_token.as_deref();
        match (expected, bearer_token(parts)) {
            (Some(expected), Some(given)) if expected == given => Ok(FetchToken),
            _ => {
                tracing::warn!("Rejected /fetch call with a missing or wrong token");
                Err(AppError::Core(CoreError::Forbidden(
                    "A valid notifications token is required".into(),
                )))
            }
        }
    }
}
