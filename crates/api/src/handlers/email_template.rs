//! Handlers for the `/templates` resource: editing, previewing recipients,
//! test sends, triggering and resending.

use std::collections::HashMap;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use notifications_core::error::CoreError;
use notifications_core::params::{extract_parameters, validate_template, ACCEPTED_PARAMS};
use notifications_core::recipients::parse_external_ids;
use notifications_core::types::DbId;
use notifications_db::models::email_template::{
    CycleEmailTemplate, TemplateDetail, UpdateCycleEmailTemplate,
};
use notifications_db::models::notification::CycleNotification;
use notifications_db::models::recipient::Recipient;
use notifications_db::repositories::{EmailTemplateRepo, NotificationRepo, PersonCompanyRepo};
use notifications_mailer::DispatchSummary;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Multipart field carrying the recipient CSV.
const UPLOAD_FIELD: &str = "file";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TemplateView {
    #[serde(flatten)]
    pub template: TemplateDetail,
    pub is_triggered: bool,
}

#[derive(Debug, Serialize)]
pub struct AcceptedParam {
    pub name: &'static str,
    pub source: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TemplateParameters {
    pub accepted: Vec<AcceptedParam>,
    /// Placeholders the current subject and body use, sorted.
    pub used: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FilteredRecipients {
    pub external_ids: Vec<String>,
    pub recipients: Vec<Recipient>,
}

/// Body of `POST /trigger` and `POST /resend`.
#[derive(Debug, Default, Deserialize)]
pub struct SendRequest {
    /// Limit the send to companies with these external IDs. Absent (or
    /// `null`) means the whole group; a present list must name at least one.
    #[serde(default)]
    pub external_ids: Option<Vec<String>>,
}

/// Body of `POST /test`.
#[derive(Debug, Deserialize)]
pub struct TestSendRequest {
    pub email: String,
    /// Placeholder values; missing ones render empty.
    #[serde(default)]
    pub params: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct TestSendResult {
    pub sent_to: String,
}

/// Result of a trigger or resend: sent inline, or queued for the worker.
#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SendOutcome {
    Sent(DispatchSummary),
    Queued { job_id: DbId, template_id: DbId },
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_detail(state: &AppState, id: DbId) -> AppResult<TemplateDetail> {
    EmailTemplateRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "CycleEmailTemplate",
            id,
        }))
}

fn locked(template: &TemplateDetail) -> AppError {
    AppError::Core(CoreError::Forbidden(format!(
        "Template {} was already triggered and can no longer be edited",
        template.label()
    )))
}

/// Trim the requested external IDs and drop blanks.
///
/// A list that ends up empty is rejected: it would otherwise read as "no
/// filter" and reach the whole group.
fn normalize_filter(external_ids: Option<Vec<String>>) -> AppResult<Option<Vec<String>>> {
    let Some(ids) = external_ids else {
        return Ok(None);
    };
    let ids: Vec<String> = ids
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    if ids.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "external_ids must name at least one company; omit it to send to the whole group"
                .to_string(),
        )));
    }
    Ok(Some(ids))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/templates/{id}
pub async fn get_template(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TemplateView>>> {
    let template = load_detail(&state, id).await?;
    let is_triggered = template.is_triggered();
    Ok(Json(DataResponse {
        data: TemplateView {
            template,
            is_triggered,
        },
    }))
}

/// PUT /api/v1/templates/{id}
///
/// Only drafts can be edited; a triggered template answers 403.
pub async fn update_template(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCycleEmailTemplate>,
) -> AppResult<Json<DataResponse<CycleEmailTemplate>>> {
    let current = load_detail(&state, id).await?;
    if current.is_triggered() {
        return Err(locked(&current));
    }

    let subject = input.subject.as_deref().unwrap_or(&current.subject);
    let body_html = input.body_html.as_deref().unwrap_or(&current.body_html);
    validate_template(subject, body_html)?;

    // A trigger may have claimed the template since it was loaded.
    let updated = EmailTemplateRepo::update_content(&state.pool, id, &input)
        .await?
        .ok_or_else(|| locked(&current))?;

    tracing::info!(template_id = id, user_id = auth.user_id, "Template updated");
    Ok(Json(DataResponse { data: updated }))
}

/// GET /api/v1/templates/{id}/parameters
pub async fn get_parameters(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<TemplateParameters>>> {
    let template = load_detail(&state, id).await?;

    let mut used = extract_parameters(&template.subject);
    used.extend(extract_parameters(&template.body_html));
    used.sort();
    used.dedup();

    let accepted = ACCEPTED_PARAMS
        .iter()
        .map(|&(name, source)| AcceptedParam { name, source })
        .collect();

    Ok(Json(DataResponse {
        data: TemplateParameters { accepted, used },
    }))
}

/// GET /api/v1/templates/{id}/recipients
///
/// Everyone a trigger would reach right now.
pub async fn list_recipients(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Recipient>>>> {
    let template = load_detail(&state, id).await?;
    let recipients = PersonCompanyRepo::recipients_for_group(&state.pool, template.group_id, None).await?;
    Ok(Json(DataResponse { data: recipients }))
}

/// POST /api/v1/templates/{id}/recipients/upload
///
/// Accepts a multipart CSV of company external IDs and returns the parsed IDs
/// with the recipients they select. The client passes the IDs back to
/// `trigger` or `resend`.
pub async fn upload_recipients(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<FilteredRecipients>>> {
    let template = load_detail(&state, id).await?;

    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        data = Some(
            field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?,
        );
        break;
    }
    let data = data.ok_or_else(|| {
        AppError::BadRequest(format!("Missing multipart field '{UPLOAD_FIELD}'"))
    })?;

    let external_ids = parse_external_ids(&data)?;
    let recipients =
        PersonCompanyRepo::recipients_for_group(&state.pool, template.group_id, Some(&external_ids))
            .await?;

    tracing::debug!(
        template_id = id,
        ids = external_ids.len(),
        recipients = recipients.len(),
        "Recipient filter uploaded"
    );
    Ok(Json(DataResponse {
        data: FilteredRecipients {
            external_ids,
            recipients,
        },
    }))
}

/// POST /api/v1/templates/{id}/test
pub async fn send_test(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<TestSendRequest>,
) -> AppResult<Json<DataResponse<TestSendResult>>> {
    state
        .dispatcher()
        .send_test(id, &input.email, &input.params)
        .await?;
    Ok(Json(DataResponse {
        data: TestSendResult {
            sent_to: input.email.trim().to_string(),
        },
    }))
}

/// POST /api/v1/templates/{id}/trigger
///
/// Sends inline (200) or, with `ASYNC_EMAILS`, queues the send (202).
pub async fn trigger(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SendRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SendOutcome>>)> {
    let filter = normalize_filter(input.external_ids)?;
    let dispatcher = state.dispatcher();
    tracing::info!(template_id = id, user_id = auth.user_id, filtered = filter.is_some(), "Trigger requested");

    let outcome = if state.config.async_emails {
        let job = dispatcher.enqueue_trigger(id, filter.as_deref()).await?;
        (
            StatusCode::ACCEPTED,
            SendOutcome::Queued {
                job_id: job.id,
                template_id: id,
            },
        )
    } else {
        let summary = dispatcher.trigger(id, filter.as_deref()).await?;
        (StatusCode::OK, SendOutcome::Sent(summary))
    };
    Ok((outcome.0, Json(DataResponse { data: outcome.1 })))
}

/// POST /api/v1/templates/{id}/resend
pub async fn resend(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SendRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SendOutcome>>)> {
    let filter = normalize_filter(input.external_ids)?;
    let dispatcher = state.dispatcher();
    tracing::info!(template_id = id, user_id = auth.user_id, filtered = filter.is_some(), "Resend requested");

    let outcome = if state.config.async_emails {
        let job = dispatcher.enqueue_resend(id, filter.as_deref()).await?;
        (
            StatusCode::ACCEPTED,
            SendOutcome::Queued {
                job_id: job.id,
                template_id: id,
            },
        )
    } else {
        let summary = dispatcher.resend(id, filter.as_deref()).await?;
        (StatusCode::OK, SendOutcome::Sent(summary))
    };
    Ok((outcome.0, Json(DataResponse { data: outcome.1 })))
}

/// GET /api/v1/templates/{id}/notifications
pub async fn list_template_notifications(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<CycleNotification>>>> {
    load_detail(&state, id).await?;
    let notifications = NotificationRepo::list_for_template(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: notifications,
    }))
}
