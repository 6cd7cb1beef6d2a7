//! HTTP-level integration tests for the job and task endpoints.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router
//! without an actual TCP listener.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_empty, post_json};
use serde_json::json;
use sqlx::PgPool;

async fn job_count(pool: &PgPool) -> i64 {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs")
        .fetch_one(pool)
        .await
        .unwrap();
    row.0
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_submit_bundle_returns_201_with_sixteen_tasks(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/jobs",
        json!({
            "job_type": "nuclear_v2",
            "parameters": { "person1": { "name": "Ana" }, "person2": { "name": "Ben" } },
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let tasks = json["data"]["tasks"].as_array().unwrap();

    assert_eq!(json["data"]["job"]["job_type"], "nuclear_v2");
    assert_eq!(tasks.len(), 16);
    assert_eq!(tasks[0]["input"]["title"], "Western Astrology for Ana");
    assert_eq!(tasks[15]["input"]["docType"], "verdict");
    assert_eq!(tasks[15]["sequence"], 15);
    assert!(json["data"]["warnings"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_submit_unknown_type_returns_400_and_writes_nothing(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/jobs",
        json!({ "job_type": "tarot_spread", "parameters": {} }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNKNOWN_JOB_TYPE");
    assert_eq!(job_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_submit_without_systems_reports_warning(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(app, "/api/v1/jobs", json!({ "job_type": "extended" })).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let tasks = json["data"]["tasks"].as_array().unwrap();
    let warnings = json["data"]["warnings"].as_array().unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["input"]["system"], "western");
    assert!(warnings.iter().any(|w| w["kind"] == "systems_defaulted"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_submit_by_product_sku(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/jobs",
        json!({ "product_sku": "complete_reading", "parameters": { "person1": { "name": "Ana" } } }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["job"]["job_type"], "extended");
    assert_eq!(json["data"]["job"]["product_sku"], "complete_reading");
    assert_eq!(json["data"]["tasks"].as_array().unwrap().len(), 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_submit_product_over_system_limit_returns_400(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/jobs",
        json!({ "product_sku": "single_system", "parameters": { "systems": ["vedic", "kabbalah"] } }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "SYSTEM_LIMIT_EXCEEDED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_compatibility_overlay_creates_both_readings_and_overlay(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/jobs",
        json!({
            "product_sku": "compatibility_overlay",
            "parameters": {
                "systems": ["vedic"],
                "person1": { "name": "Ana" },
                "person2": { "name": "Ben" },
            },
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let titles: Vec<_> = json["data"]["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["input"]["title"].as_str().unwrap().to_string())
        .collect();

    assert_eq!(json["data"]["job"]["job_type"], "nuclear");
    assert_eq!(
        titles,
        vec![
            "Vedic Astrology for Ana",
            "Vedic Astrology for Ben",
            "Vedic Astrology Overlay: Ana & Ben",
        ]
    );
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_preview_does_not_persist(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/jobs/preview",
        json!({ "job_type": "extended", "parameters": { "systems": ["vedic", "western"] } }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let tasks = json["data"]["tasks"].as_array().unwrap();

    assert_eq!(json["data"]["job_type"], "extended");
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0]["input"]["docNum"], 1);
    assert_eq!(tasks[1]["input"]["docNum"], 2);
    assert_eq!(tasks[0]["task_type"], "text_generation");
    assert_eq!(job_count(&pool).await, 0);
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_get_job_and_its_tasks(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let created = body_json(
        post_json(
            app,
            "/api/v1/jobs",
            json!({ "job_type": "nuclear", "parameters": { "systems": ["gene_keys"] } }),
        )
        .await,
    )
    .await;
    let id = created["data"]["job"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = get(app, &format!("/api/v1/jobs/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], id);

    let app = common::build_test_app(pool);
    let response = get(app, &format!("/api/v1/jobs/{id}/tasks")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let doc_types: Vec<_> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["input"]["docType"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(doc_types, vec!["person1", "person2", "overlay"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_get_missing_job_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let response = get(app, "/api/v1/jobs/999999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/jobs/999999/tasks").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_jobs(pool: PgPool) {
    for _ in 0..3 {
        let app = common::build_test_app(pool.clone());
        post_json(app, "/api/v1/jobs", json!({ "job_type": "synastry" })).await;
    }

    let app = common::build_test_app(pool.clone());
    let json = body_json(get(app, "/api/v1/jobs").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);

    let app = common::build_test_app(pool);
    let json = body_json(get(app, "/api/v1/jobs?limit=2").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_products(pool: PgPool) {
    let app = common::build_test_app(pool);
    let json = body_json(get(app, "/api/v1/products").await).await;
    let products = json["data"].as_array().unwrap();

    assert_eq!(products.len(), 4);
    assert!(products
        .iter()
        .any(|p| p["sku"] == "nuclear_package" && p["job_type"] == "nuclear_v2"));
    assert!(products
        .iter()
        .any(|p| p["sku"] == "compatibility_overlay" && p["job_type"] == "nuclear"));
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cancel_job_then_conflict(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let created = body_json(post_json(app, "/api/v1/jobs", json!({ "job_type": "extended" })).await).await;
    let id = created["data"]["job"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = post_empty(app, &format!("/api/v1/jobs/{id}/cancel")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = common::build_test_app(pool);
    let response = post_empty(app, &format!("/api/v1/jobs/{id}/cancel")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "JOB_ALREADY_FINISHED");
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_worker_round_trip_completes_job(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let created = body_json(post_json(app, "/api/v1/jobs", json!({ "job_type": "extended" })).await).await;
    let job_id = created["data"]["job"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool.clone());
    let response = post_json(app, "/api/v1/tasks/claim", json!({ "worker": "gen-1" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let claimed = body_json(response).await;
    let task_id = claimed["data"]["id"].as_i64().unwrap();
    assert_eq!(claimed["data"]["claimed_by"], "gen-1");

    let app = common::build_test_app(pool.clone());
    let response = post_json(
        app,
        &format!("/api/v1/tasks/{task_id}/complete"),
        json!({ "output": { "text": "Your Western chart..." } }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let app = common::build_test_app(pool.clone());
    let job = body_json(get(app, &format!("/api/v1/jobs/{job_id}")).await).await;
    assert_eq!(job["data"]["progress_percent"], 100);
    assert_eq!(job["data"]["status_id"], 3);

    let app = common::build_test_app(pool.clone());
    let response = post_json(app, "/api/v1/tasks/claim", json!({ "worker": "gen-1" })).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        &format!("/api/v1/tasks/{task_id}/complete"),
        json!({ "output": {} }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "TASK_NOT_RUNNING");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_fail_unknown_task_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/tasks/424242/fail",
        json!({ "error": "boom" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_claim_requires_worker_name(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(app, "/api/v1/tasks/claim", json!({ "worker": "  " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
