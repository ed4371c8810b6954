use notifications_registry::RegistryConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the JWT
/// secret, which must always be provided.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Shared secret for the unauthenticated `/fetch` endpoint. When unset
    /// the endpoint rejects every request.
    pub notifications_token: Option<String>,
    /// Queue trigger and resend sends for the worker instead of sending inline.
    pub async_emails: bool,
    /// Allow staff to create and delete companies by hand.
    pub allow_editing_companies: bool,
    /// Serve registry fetches from the bundled fixtures instead of HTTP.
    pub mock_registries: bool,
    pub registry: RegistryConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                    |
    /// |---------------------------|----------------------------|
    /// | `HOST`                    | `0.0.0.0`                  |
    /// | `PORT`                    | `3000`                     |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                       |
    /// | `NOTIFICATIONS_TOKEN`     | unset                      |
    /// | `ASYNC_EMAILS`            | `false`                    |
    /// | `ALLOW_EDITING_COMPANIES` | `false`                    |
    /// | `MOCK_REGISTRIES`         | `false`                    |
    ///
    /// Registry endpoints are read by [`RegistryConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let notifications_token = std::env::var("NOTIFICATIONS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            notifications_token,
            async_emails: env_flag("ASYNC_EMAILS"),
            allow_editing_companies: env_flag("ALLOW_EDITING_COMPANIES"),
            mock_registries: env_flag("MOCK_REGISTRIES"),
            registry: RegistryConfig::from_env(),
        }
    }
}

/// Read a boolean flag; `1`, `true` and `yes` (any case) count as set.
fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}
