//! Staff session tokens.
//!
//! A successful login yields one HS256 access token. There is no refresh
//! flow: staff log in again once it expires. Tokens whose `role` is not
//! [`STAFF_ROLE`] are rejected on validation.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use notifications_core::types::DbId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role claim carried by every staff token.
pub const STAFF_ROLE: &str = "staff";

/// Default token lifetime in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;

/// Clock skew tolerated when checking `exp`, in seconds.
const EXPIRY_LEEWAY_SECS: u64 = 30;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Staff user id.
    pub sub: DbId,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    fn staff(user_id: DbId, role: &str, ttl: Duration) -> Self {
        let issued = Utc::now();
        Self {
            sub: user_id,
            role: role.to_string(),
            exp: (issued + ttl).timestamp(),
            iat: issued.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry_mins: i64,
}

impl JwtConfig {
    /// Reads `JWT_SECRET` (required, non-empty) and `JWT_ACCESS_EXPIRY_MINS`
    /// (default 15).
    ///
    /// # Panics
    ///
    /// On a missing secret or an unparsable expiry; both are startup errors.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .expect("JWT_SECRET must be set to a non-empty value");

        let access_token_expiry_mins = match std::env::var("JWT_ACCESS_EXPIRY_MINS") {
            Ok(raw) => raw
                .parse()
                .expect("JWT_ACCESS_EXPIRY_MINS must be a whole number of minutes"),
            Err(_) => DEFAULT_ACCESS_EXPIRY_MINS,
        };

        Self {
            secret,
            access_token_expiry_mins,
        }
    }

    /// Token lifetime in seconds, as reported to the client.
    pub fn expires_in_secs(&self) -> i64 {
        self.access_ttl().num_seconds()
    }

    fn access_ttl(&self) -> Duration {
        Duration::minutes(self.access_token_expiry_mins)
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = EXPIRY_LEEWAY_SECS;
        validation
    }
}

/// Sign an access token for `user_id`.
pub fn generate_access_token(
    user_id: DbId,
    role: &str,
    config: &JwtConfig,
) -> Result<String, JwtError> {
    let claims = Claims::staff(user_id, role, config.access_ttl());
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify signature, expiry and role, returning the claims.
pub fn validate_token(token: &str, config: &JwtConfig) -> Result<Claims, JwtError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &JwtConfig::validation(),
    )?
    .claims;

    if claims.role != STAFF_ROLE {
        return Err(ErrorKind::InvalidToken.into());
    }
    Ok(claims)
}
