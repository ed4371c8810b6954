//! Handlers for the stages nested under `/cycles/{id}/stages`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use notifications_core::error::CoreError;
use notifications_core::stages::validate_stage_title;
use notifications_core::types::DbId;
use notifications_db::models::stage::{CreateStage, Stage};
use notifications_db::repositories::StageRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::cycle::ensure_cycle;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/cycles/{id}/stages
pub async fn list_stages(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(cycle_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Stage>>>> {
    ensure_cycle(&state, cycle_id).await?;
    let stages = StageRepo::list_for_cycle(&state.pool, cycle_id).await?;
    Ok(Json(DataResponse { data: stages }))
}

/// POST /api/v1/cycles/{id}/stages
///
/// Adds the stage together with one draft template per group.
pub async fn create_stage(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(cycle_id): Path<DbId>,
    Json(input): Json<CreateStage>,
) -> AppResult<(StatusCode, Json<DataResponse<Stage>>)> {
    let title = input.title.trim();
    validate_stage_title(title).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    ensure_cycle(&state, cycle_id).await?;

    let stage = StageRepo::create_with_templates(&state.pool, cycle_id, title).await?;
    tracing::info!(cycle_id, stage_id = stage.id, title = %stage.title, "Stage created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: stage })))
}
