use axum::extract::State;
use axum::{routing::get, Json, Router};
use notifications_db::repositories::EmailJobRepo;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database is unreachable.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    pub async_emails: bool,
    /// Queued sends not yet claimed by a worker; absent when the database
    /// is down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_email_jobs: Option<i64>,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = notifications_db::health_check(&state.pool).await.is_ok();
    let pending_email_jobs = if db_healthy {
        EmailJobRepo::count_pending(&state.pool).await.ok()
    } else {
        None
    };

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        async_emails: state.config.async_emails,
        pending_email_jobs,
    })
}

/// Served at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
