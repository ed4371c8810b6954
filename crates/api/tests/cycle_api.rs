//! Cycles, stages, groups and the dashboard.

mod common;

use axum::http::StatusCode;
use common::{body_json, get_auth, post_json_auth, put_json_auth};
use sqlx::PgPool;

async fn create_cycle(test: &common::TestApp, token: &str, year: i64) -> serde_json::Value {
    let response = post_json_auth(
        test.app(),
        "/api/v1/cycles",
        serde_json::json!({ "year": year, "closing_date": format!("{year}-10-03") }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_new_cycle_has_default_stages_and_templates(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let token = common::staff_token(&pool, &test).await;

    let cycle = create_cycle(&test, &token, 2024).await;
    let id = cycle["id"].as_i64().unwrap();

    let response = get_auth(test.app(), &format!("/api/v1/cycles/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["year"], 2024);

    let titles: Vec<&str> = json["data"]["stages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Invitations", "Reminder", "Deadline", "After"]);

    let templates = json["data"]["templates"].as_array().unwrap();
    assert_eq!(templates.len(), 20);
    assert!(templates.iter().all(|t| t["status"] == "draft"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_year_conflicts(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let token = common::staff_token(&pool, &test).await;
    create_cycle(&test, &token, 2024).await;

    let response = post_json_auth(
        test.app(),
        "/api/v1/cycles",
        serde_json::json!({ "year": 2024, "closing_date": "2024-11-01" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_implausible_year_is_rejected(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let token = common::staff_token(&pool, &test).await;

    let response = post_json_auth(
        test.app(),
        "/api/v1/cycles",
        serde_json::json!({ "year": 24, "closing_date": "2024-11-01" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_closing_date_can_be_updated(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let token = common::staff_token(&pool, &test).await;
    let id = create_cycle(&test, &token, 2024).await["id"].as_i64().unwrap();

    let response = put_json_auth(
        test.app(),
        &format!("/api/v1/cycles/{id}"),
        serde_json::json!({ "closing_date": "2024-12-31" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["closing_date"], "2024-12-31");

    let response = put_json_auth(
        test.app(),
        "/api/v1/cycles/999999",
        serde_json::json!({ "closing_date": "2024-12-31" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_added_stage_gets_a_template_per_group(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let token = common::staff_token(&pool, &test).await;
    let id = create_cycle(&test, &token, 2024).await["id"].as_i64().unwrap();

    let response = post_json_auth(
        test.app(),
        &format!("/api/v1/cycles/{id}/stages"),
        serde_json::json!({ "title": "Final call" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get_auth(test.app(), &format!("/api/v1/cycles/{id}/stages"), &token).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 5);

    let response = get_auth(test.app(), &format!("/api/v1/cycles/{id}"), &token).await;
    let json = body_json(response).await;
    let final_call = json["data"]["templates"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|t| t["stage_title"] == "Final call")
        .count();
    assert_eq!(final_call, 5);

    // Stage titles are unique within a cycle.
    let response = post_json_auth(
        test.app(),
        &format!("/api/v1/cycles/{id}/stages"),
        serde_json::json!({ "title": "Final call" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_blank_stage_title_is_rejected(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let token = common::staff_token(&pool, &test).await;
    let id = create_cycle(&test, &token, 2024).await["id"].as_i64().unwrap();

    let response = post_json_auth(
        test.app(),
        &format!("/api/v1/cycles/{id}/stages"),
        serde_json::json!({ "title": "   " }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_dashboard_lists_newest_cycle_first(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let token = common::staff_token(&pool, &test).await;
    create_cycle(&test, &token, 2023).await;
    create_cycle(&test, &token, 2025).await;
    create_cycle(&test, &token, 2024).await;

    let response = get_auth(test.app(), "/api/v1/dashboard", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let years: Vec<i64> = json["data"]["cycles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["year"].as_i64().unwrap())
        .collect();
    assert_eq!(years, [2025, 2024, 2023]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_groups_count_their_templates(pool: PgPool) {
    let test = common::build_test_app(pool.clone());
    let token = common::staff_token(&pool, &test).await;
    create_cycle(&test, &token, 2024).await;

    let response = get_auth(test.app(), "/api/v1/groups", &token).await;
    let json = body_json(response).await;
    let groups = json["data"].as_array().unwrap();
    assert_eq!(groups.len(), 5);
    assert!(groups.iter().all(|g| g["count_emailtemplates"] == 4));
}
