//! Handlers for the `/auth` resource.

use axum::extract::State;
use axum::Json;
use notifications_core::error::CoreError;
use notifications_core::types::DbId;
use notifications_db::repositories::StaffUserRepo;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{generate_access_token, STAFF_ROLE};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: StaffInfo,
}

#[derive(Debug, Serialize)]
pub struct StaffInfo {
    pub id: DbId,
    pub username: String,
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Invalid username or password".into(),
    ))
}

/// POST /api/v1/auth/login
///
/// Authenticate a staff user with username and password.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = StaffUserRepo::find_by_username(&state.pool, input.username.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(username = %user.username, "Failed staff login");
        return Err(invalid_credentials());
    }

    StaffUserRepo::record_login(&state.pool, user.id).await?;

    let access_token = generate_access_token(user.id, STAFF_ROLE, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    tracing::info!(user_id = user.id, "Staff user logged in");
    Ok(Json(AuthResponse {
        access_token,
        expires_in: state.config.jwt.expires_in_secs(),
        user: StaffInfo {
            id: user.id,
            username: user.username,
        },
    }))
}
