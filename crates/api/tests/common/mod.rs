#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use notifications_api::auth::jwt::{generate_access_token, JwtConfig, STAFF_ROLE};
use notifications_api::auth::password::hash_password;
use notifications_api::config::ServerConfig;
use notifications_api::router::build_app_router;
use notifications_api::state::AppState;
use notifications_db::repositories::StaffUserRepo;
use notifications_mailer::MemoryMailer;
use notifications_registry::RegistryConfig;
use sqlx::PgPool;
use tower::ServiceExt;

pub const FETCH_TOKEN: &str = "scheduler-secret";
pub const STAFF_PASSWORD: &str = "staff-password-1";

/// Build a test `ServerConfig` with safe defaults.
///
/// Registry fetches are served from the bundled fixtures and emails are
/// sent inline.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
        notifications_token: Some(FETCH_TOKEN.to_string()),
        async_emails: false,
        allow_editing_companies: false,
        mock_registries: true,
        registry: RegistryConfig::default(),
    }
}

/// A test app backed by the in-memory outbox.
pub struct TestApp {
    pub router: Router,
    pub mailer: Arc<MemoryMailer>,
    pub config: ServerConfig,
}

impl TestApp {
    /// A fresh router; `oneshot` consumes it, so take one per request.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Bearer token for a staff user, minted without going through login.
    pub fn token(&self, user_id: i64) -> String {
        generate_access_token(user_id, STAFF_ROLE, &self.config.jwt).unwrap()
    }
}

pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, test_config())
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> TestApp {
    let mailer = Arc::new(MemoryMailer::new());
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        mailer: mailer.clone(),
    };
    TestApp {
        router: build_app_router(state, &config),
        mailer,
        config,
    }
}

/// Insert a staff account with [`STAFF_PASSWORD`] and return its id.
pub async fn create_staff(pool: &PgPool, username: &str) -> i64 {
    let hash = hash_password(STAFF_PASSWORD).unwrap();
    StaffUserRepo::create(pool, username, &hash).await.unwrap().id
}

/// A staff account plus a token for it.
pub async fn staff_token(pool: &PgPool, app: &TestApp) -> String {
    let id = create_staff(pool, "staff").await;
    app.token(id)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header("authorization", format!("Bearer {token}")),
        None => builder,
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, builder(Method::GET, uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(
        app,
        builder(Method::GET, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(
        app,
        builder(Method::POST, uri, None)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(
        app,
        builder(Method::POST, uri, Some(token))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(
        app,
        builder(Method::PUT, uri, Some(token))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(
        app,
        builder(Method::DELETE, uri, Some(token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

/// POST a single-file multipart form with the file in field `file`.
pub async fn post_csv_auth(app: Router, uri: &str, csv: &str, token: &str) -> Response<Body> {
    let boundary = "----notifications-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"ids.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{boundary}--\r\n"
    );
    send(
        app,
        builder(Method::POST, uri, Some(token))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn assert_status(response: &Response<Body>, expected: StatusCode) {
    assert_eq!(response.status(), expected, "unexpected status");
}
