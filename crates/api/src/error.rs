//! Error type returned by every handler.
//!
//! Failures render as `{"error": <message>, "code": <CODE>}`. Server-side
//! failures are logged here and reach the client only as a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use notifications_core::error::CoreError;
use notifications_mailer::{DispatchError, EmailError};
use notifications_registry::RegistryError;
use serde::Serialize;

/// PostgreSQL SQLSTATE codes the API turns into 409.
const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

const INTERNAL_MESSAGE: &str = "An internal error occurred";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The mail transport failed or refused a message.
    #[error(transparent)]
    Email(#[from] EmailError),

    /// A registry could not be queried.
    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Core(e) => AppError::Core(e),
            DispatchError::Database(e) => AppError::Database(e),
            DispatchError::Email(e) => AppError::Email(e),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownRegistry(name) => {
                AppError::BadRequest(format!("Unknown registry: {name}"))
            }
            RegistryError::Database(e) => AppError::Database(e),
            other => AppError::Registry(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

/// Status, machine-readable code and client-facing message of a failure.
struct Classified {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl Classified {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", INTERNAL_MESSAGE)
    }
}

impl AppError {
    fn classify(&self) -> Classified {
        match self {
            AppError::Core(core) => classify_core(core),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::Email(EmailError::Address(err)) => Classified::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("Invalid email address: {err}"),
            ),
            AppError::Email(_) => Classified::new(
                StatusCode::BAD_GATEWAY,
                "EMAIL_ERROR",
                "The email could not be delivered",
            ),
            AppError::Registry(msg) => {
                Classified::new(StatusCode::BAD_GATEWAY, "REGISTRY_ERROR", msg.clone())
            }
            AppError::BadRequest(msg) => {
                Classified::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
            }
            AppError::InternalError(_) => Classified::internal(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let classified = self.classify();
        if classified.status.is_server_error() {
            tracing::error!(error = %self, status = classified.status.as_u16(), "Request failed");
        }

        let body = ErrorBody {
            error: classified.message,
            code: classified.code,
        };
        (classified.status, Json(body)).into_response()
    }
}

fn classify_core(err: &CoreError) -> Classified {
    match err {
        CoreError::NotFound { entity, id } => Classified::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => {
            Classified::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
        }
        CoreError::Conflict(msg) => Classified::new(StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => {
            Classified::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
        }
        CoreError::Forbidden(msg) => {
            Classified::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone())
        }
        CoreError::Internal(_) => Classified::internal(),
    }
}

/// `RowNotFound` is 404. Violations of a `uq_*` constraint or of a foreign
/// key are 409. Anything else is a 500.
fn classify_sqlx_error(err: &sqlx::Error) -> Classified {
    let db_err = match err {
        sqlx::Error::RowNotFound => {
            return Classified::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found")
        }
        sqlx::Error::Database(db_err) => db_err,
        _ => return Classified::internal(),
    };

    match db_err.code().as_deref() {
        Some(PG_UNIQUE_VIOLATION) => match db_err.constraint() {
            Some(constraint) if constraint.starts_with("uq_") => Classified::new(
                StatusCode::CONFLICT,
                "CONFLICT",
                format!("Duplicate value violates unique constraint: {constraint}"),
            ),
            _ => Classified::internal(),
        },
        Some(PG_FOREIGN_KEY_VIOLATION) => Classified::new(
            StatusCode::CONFLICT,
            "CONFLICT",
            "The record is still referenced by other records",
        ),
        _ => Classified::internal(),
    }
}
