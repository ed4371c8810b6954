//! Handler for the `/groups` resource.

use axum::extract::State;
use axum::Json;
use notifications_db::models::companies_group::CompaniesGroupSummary;
use notifications_db::repositories::CompaniesGroupRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/groups
///
/// Obligation groups with the number of templates written for each.
pub async fn list_groups(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<CompaniesGroupSummary>>>> {
    let groups = CompaniesGroupRepo::list_with_counts(&state.pool).await?;
    Ok(Json(DataResponse { data: groups }))
}
