//! Registry fetch endpoints, served from the bundled fixtures.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get, get_auth, post_json_auth, FETCH_TOKEN};
use notifications_db::repositories::{CompanyRepo, PersonRepo};
use sqlx::PgPool;
use tower::ServiceExt;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_fetch_without_token_is_forbidden(pool: PgPool) {
    let test = common::build_test_app(pool);
    let response = get(test.app(), "/fetch").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_fetch_with_wrong_token_is_forbidden(pool: PgPool) {
    let test = common::build_test_app(pool);
    let response = get_auth(test.app(), "/fetch", "not-the-token").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A raw token without the Bearer scheme is rejected too.
    let request = Request::builder()
        .method(Method::GET)
        .uri("/fetch")
        .header("authorization", FETCH_TOKEN)
        .body(Body::empty())
        .unwrap();
    let response = test.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_fetch_is_forbidden_when_no_token_is_configured(pool: PgPool) {
    let mut config = common::test_config();
    config.notifications_token = None;
    let test = common::build_test_app_with(pool, config);

    let response = get_auth(test.app(), "/fetch", FETCH_TOKEN).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_fetch_runs_bdr_then_ecr(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let response = get_auth(test.app(), "/fetch", FETCH_TOKEN).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let reports = json["data"].as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["success"], true);
    assert_eq!(
        reports[0]["message"],
        "Registry fetched successfully: 3 companies, 3 persons"
    );
    assert_eq!(reports[1]["companies"], 3);
    assert_eq!(reports[1]["links"], 4);

    assert!(CompanyRepo::find_by_external_id(&pool, "bdr-cars-003")
        .await
        .unwrap()
        .is_some());
    let ids = PersonRepo::find_ids_by_usernames(&pool, &["pvandijk".to_string()])
        .await
        .unwrap();
    assert_eq!(ids.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_staff_can_fetch_a_single_registry(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let token = common::staff_token(&pool, &test).await;

    let response = post_json_auth(
        test.app(),
        "/api/v1/actions/fetch/fcs",
        serde_json::json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], true);
    assert_eq!(json["data"]["companies"], 2);

    let response = post_json_auth(
        test.app(),
        "/api/v1/actions/fetch/ods",
        serde_json::json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_manual_fetch_requires_staff(pool: PgPool) {
    let test = common::build_test_app(pool);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/actions/fetch/bdr")
        .body(Body::empty())
        .unwrap();
    let response = test.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unreachable_registries_are_reported_not_fatal(pool: PgPool) {
    let mut config = common::test_config();
    config.mock_registries = false;
    // Nothing listens on the discard port.
    let down = notifications_registry::config::Endpoint {
        url: "http://127.0.0.1:9".to_string(),
        token: "token".to_string(),
    };
    config.registry.bdr = down.clone();
    config.registry.ecr = down;
    config.registry.timeout_secs = 2;
    let test = common::build_test_app_with(pool.clone(), config);

    let response = get_auth(test.app(), "/fetch", FETCH_TOKEN).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let outcomes = json["data"].as_array().unwrap();
    assert_eq!(outcomes.len(), 2);
    for outcome in outcomes {
        assert_eq!(outcome["success"], false);
        assert!(outcome["message"]
            .as_str()
            .unwrap()
            .starts_with("Registry unavailable"));
    }
    assert_eq!(outcomes[0]["registry"], "bdr");
    assert_eq!(outcomes[1]["registry"], "ecr");
}
