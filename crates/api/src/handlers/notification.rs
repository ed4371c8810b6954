//! Handler for the read-only `/notifications` log.

use axum::extract::{Query, State};
use axum::Json;
use notifications_db::models::notification::CycleNotification;
use notifications_db::repositories::NotificationRepo;
use notifications_db::{clamp_limit, clamp_offset};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Serialize)]
pub struct NotificationLog {
    pub items: Vec<CycleNotification>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// GET /api/v1/notifications?limit=&offset=
///
/// Every notification sent, newest first.
pub async fn list_notifications(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<NotificationLog>>> {
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(params.offset);

    let items = NotificationRepo::list(&state.pool, limit, offset).await?;
    let total = NotificationRepo::count(&state.pool).await?;

    Ok(Json(DataResponse {
        data: NotificationLog {
            items,
            total,
            limit,
            offset,
        },
    }))
}
