//! Handlers for the `/cycles` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use notifications_core::error::CoreError;
use notifications_core::types::DbId;
use notifications_db::models::cycle::{CreateCycle, Cycle, UpdateCycle};
use notifications_db::models::email_template::TemplateDetail;
use notifications_db::models::notification::CycleNotification;
use notifications_db::models::stage::Stage;
use notifications_db::repositories::{CycleRepo, EmailTemplateRepo, NotificationRepo, StageRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Earliest and latest reporting years accepted for a new cycle.
const MIN_YEAR: i16 = 2000;
const MAX_YEAR: i16 = 2100;

/// A cycle with its stages and every template of every stage.
#[derive(Debug, Serialize)]
pub struct CycleDetail {
    #[serde(flatten)]
    pub cycle: Cycle,
    pub stages: Vec<Stage>,
    pub templates: Vec<TemplateDetail>,
}

pub(crate) async fn ensure_cycle(state: &AppState, id: DbId) -> AppResult<Cycle> {
    CycleRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Cycle", id }))
}

/// POST /api/v1/cycles
///
/// Creates the cycle, its default stages and a draft template per
/// stage and group.
pub async fn create_cycle(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCycle>,
) -> AppResult<(StatusCode, Json<DataResponse<Cycle>>)> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&input.year) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Year must be between {MIN_YEAR} and {MAX_YEAR}"
        ))));
    }

    let cycle = CycleRepo::create_with_defaults(&state.pool, &input).await?;
    tracing::info!(cycle_id = cycle.id, year = cycle.year, user_id = auth.user_id, "Cycle created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: cycle })))
}

/// GET /api/v1/cycles/{id}
pub async fn get_cycle(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<CycleDetail>>> {
    let cycle = ensure_cycle(&state, id).await?;
    let stages = StageRepo::list_for_cycle(&state.pool, id).await?;
    let templates = EmailTemplateRepo::list_for_cycle(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: CycleDetail {
            cycle,
            stages,
            templates,
        },
    }))
}

/// PUT /api/v1/cycles/{id}
pub async fn update_cycle(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCycle>,
) -> AppResult<Json<DataResponse<Cycle>>> {
    let cycle = CycleRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Cycle", id }))?;
    Ok(Json(DataResponse { data: cycle }))
}

/// GET /api/v1/cycles/{id}/notifications
///
/// Every notification sent for any template of the cycle, newest first.
pub async fn list_cycle_notifications(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<CycleNotification>>>> {
    ensure_cycle(&state, id).await?;
    let notifications = NotificationRepo::list_for_cycle(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: notifications,
    }))
}
