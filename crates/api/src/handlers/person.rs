//! Handlers for the `/persons` resource.

use axum::extract::{Path, Query, State};
use axum::Json;
use notifications_core::error::CoreError;
use notifications_core::types::DbId;
use notifications_db::models::notification::NotifiedStage;
use notifications_db::models::person::{Person, PersonCompanyEntry};
use notifications_db::repositories::{NotificationRepo, PersonCompanyRepo, PersonRepo};
use notifications_registry::RegistryKind;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::resolve_page;
use crate::response::{DataResponse, Page};
use crate::state::AppState;

pub const PERSONS_PER_PAGE: i64 = 25;

#[derive(Debug, Deserialize)]
pub struct PersonListParams {
    /// `bdr`, `ecr` or `fgases`; all registries when absent.
    pub registry: Option<String>,
    pub page: Option<i64>,
}

/// A person with their current companies and notification history.
#[derive(Debug, Serialize)]
pub struct PersonDetail {
    #[serde(flatten)]
    pub person: Person,
    pub companies: Vec<PersonCompanyEntry>,
    pub notified_stages: Vec<NotifiedStage>,
}

fn group_codes_for(registry: Option<&str>) -> AppResult<Vec<&'static str>> {
    let kinds = match registry.map(str::trim).filter(|r| !r.is_empty()) {
        Some(name) => vec![name.parse::<RegistryKind>()?],
        None => RegistryKind::ALL.to_vec(),
    };
    let mut codes: Vec<&'static str> = Vec::new();
    for code in kinds.into_iter().flat_map(|k| k.group_codes().iter().copied()) {
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    Ok(codes)
}

/// GET /api/v1/persons?registry=&page=
///
/// Persons with a current link to a company of the registry's groups.
pub async fn list_persons(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PersonListParams>,
) -> AppResult<Json<DataResponse<Page<Person>>>> {
    let codes = group_codes_for(params.registry.as_deref())?;

    let total = PersonRepo::count_by_group_codes(&state.pool, &codes).await?;
    let (page, num_pages, offset) = resolve_page(params.page, total, PERSONS_PER_PAGE);
    let items = PersonRepo::list_by_group_codes(&state.pool, &codes, PERSONS_PER_PAGE, offset).await?;

    Ok(Json(DataResponse {
        data: Page {
            items,
            page,
            num_pages,
            total,
            per_page: PERSONS_PER_PAGE,
        },
    }))
}

/// GET /api/v1/persons/{id}
pub async fn get_person(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PersonDetail>>> {
    let person = PersonRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Person",
            id,
        }))?;
    let companies = PersonCompanyRepo::current_companies_for_person(&state.pool, id).await?;
    let notified_stages = NotificationRepo::notified_stages_for_person(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: PersonDetail {
            person,
            companies,
            notified_stages,
        },
    }))
}
