//! Registry synchronization endpoints.
//!
//! `GET /fetch` is called by an external scheduler with the shared
//! notifications token; `POST /api/v1/actions/fetch/{registry}` lets staff
//! fetch one registry on demand.

use axum::extract::{Path, Query, State};
use axum::Json;
use notifications_core::fetch::FetchReport;
use notifications_registry::fetch::Fetcher;
use notifications_registry::{build_registry, RegistryKind};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::fetch_token::FetchToken;
use crate::response::DataResponse;
use crate::state::AppState;

/// Registries synchronized by the scheduled `/fetch` call.
pub const SCHEDULED_REGISTRIES: [RegistryKind; 2] = [RegistryKind::Bdr, RegistryKind::Ecr];

#[derive(Debug, Serialize)]
pub struct FetchOutcome {
    pub message: String,
    pub success: bool,
    #[serde(flatten)]
    pub report: FetchReport,
}

impl FetchOutcome {
    /// A registry that could not be listed; nothing was written for it.
    fn unavailable(kind: RegistryKind, reason: String) -> Self {
        let mut report = FetchReport::new(kind.as_str());
        report.skip("registry", kind.as_str(), reason.clone());
        Self {
            message: format!("Registry unavailable: {reason}"),
            success: false,
            report,
        }
    }
}

impl From<FetchReport> for FetchOutcome {
    fn from(report: FetchReport) -> Self {
        Self {
            message: report.message(),
            success: report.is_success(),
            report,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FetchParams {
    /// Use the bundled fixtures instead of the live registry.
    #[serde(default)]
    pub test: bool,
}

/// Run one fetch on its own task, so a request timeout does not stop it
/// between the upserts and the link reconciliation.
async fn fetch_one(state: &AppState, kind: RegistryKind, test: bool) -> AppResult<FetchOutcome> {
    let registry = build_registry(kind, &state.config.registry, test || state.config.mock_registries)?;
    tracing::info!(registry = registry.name(), "Registry fetch started");
    let pool = state.pool.clone();
    let report = tokio::spawn(async move { Fetcher::run(&pool, registry.as_ref()).await })
        .await
        .map_err(|e| AppError::InternalError(format!("Fetch task for {kind} aborted: {e}")))??;
    Ok(report.into())
}

/// GET /fetch
///
/// Fetches BDR then ECR. Requires `Authorization: Bearer <NOTIFICATIONS_TOKEN>`.
/// A registry that cannot be reached is reported and the next one still runs.
pub async fn scheduled_fetch(
    _token: FetchToken,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<FetchOutcome>>>> {
    let mut outcomes = Vec::with_capacity(SCHEDULED_REGISTRIES.len());
    for kind in SCHEDULED_REGISTRIES {
        match fetch_one(&state, kind, false).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(AppError::Registry(reason)) => {
                tracing::warn!(registry = %kind, %reason, "Scheduled fetch skipped registry");
                outcomes.push(FetchOutcome::unavailable(kind, reason));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(Json(DataResponse { data: outcomes }))
}

/// POST /api/v1/actions/fetch/{registry}?test=
pub async fn fetch_registry(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(registry): Path<String>,
    Query(params): Query<FetchParams>,
) -> AppResult<Json<DataResponse<FetchOutcome>>> {
    let kind: RegistryKind = registry.parse()?;
    tracing::info!(registry = %kind, user_id = auth.user_id, test = params.test, "Manual registry fetch");
    let outcome = fetch_one(&state, kind, params.test).await?;
    Ok(Json(DataResponse { data: outcome }))
}
