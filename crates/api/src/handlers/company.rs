//! Handlers for the `/companies` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use notifications_core::error::CoreError;
use notifications_core::types::DbId;
use notifications_db::models::company::{Company, CreateCompany};
use notifications_db::repositories::{CompaniesGroupRepo, CompanyRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::resolve_page;
use crate::response::{DataResponse, Page};
use crate::state::AppState;

/// Companies per listing page.
pub const COMPANIES_PER_PAGE: i64 = 25;

#[derive(Debug, Deserialize)]
pub struct CompanyListParams {
    /// Restrict to one group code.
    pub group: Option<String>,
    pub page: Option<i64>,
}

fn ensure_editing_allowed(state: &AppState) -> AppResult<()> {
    if state.config.allow_editing_companies {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "Editing companies is disabled".into(),
        )))
    }
}

/// GET /api/v1/companies?group=&page=
///
/// Visible companies, 25 per page. A page past the end serves the last page.
pub async fn list_companies(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<CompanyListParams>,
) -> AppResult<Json<DataResponse<Page<Company>>>> {
    let group = params.group.as_deref().map(str::trim).filter(|g| !g.is_empty());

    let total = CompanyRepo::count_visible(&state.pool, group).await?;
    let (page, num_pages, offset) = resolve_page(params.page, total, COMPANIES_PER_PAGE);
    let items = CompanyRepo::list_visible(&state.pool, group, COMPANIES_PER_PAGE, offset).await?;

    Ok(Json(DataResponse {
        data: Page {
            items,
            page,
            num_pages,
            total,
            per_page: COMPANIES_PER_PAGE,
        },
    }))
}

/// GET /api/v1/companies/{id}
pub async fn get_company(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Company>>> {
    let company = CompanyRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Company",
            id,
        }))?;
    Ok(Json(DataResponse { data: company }))
}

/// POST /api/v1/companies (only with `ALLOW_EDITING_COMPANIES`)
pub async fn create_company(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCompany>,
) -> AppResult<(StatusCode, Json<DataResponse<Company>>)> {
    ensure_editing_allowed(&state)?;

    if input.name.trim().is_empty() || input.country.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Company name and country are required".into(),
        )));
    }
    let groups = CompaniesGroupRepo::list(&state.pool).await?;
    if !groups.iter().any(|g| g.id == input.group_id) {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "CompaniesGroup",
            id: input.group_id,
        }));
    }

    let company = CompanyRepo::create(&state.pool, &input).await?;
    tracing::info!(company_id = company.id, user_id = auth.user_id, "Company created by hand");
    Ok((StatusCode::CREATED, Json(DataResponse { data: company })))
}

/// DELETE /api/v1/companies/{id} (only with `ALLOW_EDITING_COMPANIES`)
pub async fn delete_company(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    ensure_editing_allowed(&state)?;

    if CompanyRepo::delete(&state.pool, id).await? {
        tracing::info!(company_id = id, user_id = auth.user_id, "Company deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Company",
            id,
        }))
    }
}
