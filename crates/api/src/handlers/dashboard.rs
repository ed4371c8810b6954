//! Handler for the staff landing page data.

use axum::extract::State;
use axum::Json;
use notifications_db::models::companies_group::CompaniesGroupSummary;
use notifications_db::models::cycle::Cycle;
use notifications_db::repositories::{CompaniesGroupRepo, CycleRepo};
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Dashboard {
    /// Newest cycle first.
    pub cycles: Vec<Cycle>,
    pub groups: Vec<CompaniesGroupSummary>,
}

/// GET /api/v1/dashboard
pub async fn get_dashboard(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Dashboard>>> {
    let cycles = CycleRepo::list(&state.pool).await?;
    let groups = CompaniesGroupRepo::list_with_counts(&state.pool).await?;
    Ok(Json(DataResponse {
        data: Dashboard { cycles, groups },
    }))
}
