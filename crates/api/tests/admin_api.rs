//! HTTP-level tests for the admin surface: login, settings, events,
//! memories, background upload, and the memory book export.

mod common;

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::Router;
use common::{
    admin_token, body_bytes, body_json, delete_auth, get, get_auth, post_file_auth, post_json,
    post_json_auth, put_json_auth, ADMIN_PASSWORD,
};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn submit_memory(app: Router, body: Value) -> i64 {
    let response = post_json(app, "/api/v1/memories", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Login and access control
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_success(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/admin/login",
        json!({ "password": ADMIN_PASSWORD }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], true);
    assert!(json["data"]["token"].is_string());
    assert_eq!(json["data"]["expires_in"], 3600);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_wrong_password(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(app, "/api/v1/admin/login", json!({ "password": "guess" })).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_routes_require_token(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get(app.clone(), "/api/v1/admin/events").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_auth(app, "/api/v1/admin/memories", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_settings_is_partial(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = admin_token(app.clone()).await;

    let response = put_json_auth(
        app.clone(),
        "/api/v1/admin/settings",
        json!({
            "couple_names": "Ema & Tim",
            "tone_questions": { "wise": ["What should they keep?"] },
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get(app, "/api/v1/settings").await).await;
    assert_eq!(json["data"]["couple_names"], "Ema & Tim");
    assert_eq!(json["data"]["welcome_text"], "Leave a memory for");
    assert_eq!(json["data"]["tone_questions"]["wise"][0], "What should they keep?");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_change_admin_password(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = admin_token(app.clone()).await;

    let response = put_json_auth(
        app.clone(),
        "/api/v1/admin/settings",
        json!({ "admin_password": "short" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(
        app.clone(),
        "/api/v1/admin/settings",
        json!({ "admin_password": "confetti-2026" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let old = post_json(
        app.clone(),
        "/api/v1/admin/login",
        json!({ "password": ADMIN_PASSWORD }),
    )
    .await;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let new = post_json(
        app,
        "/api/v1/admin/login",
        json!({ "password": "confetti-2026" }),
    )
    .await;
    assert_eq!(new.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_background_upload(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = admin_token(app.clone()).await;
    let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    let response = post_file_auth(
        app.clone(),
        "/api/v1/admin/background",
        "image/png",
        &png,
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let url = body_json(response).await["data"]["background_image"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(url.starts_with("data:image/png;base64,"));

    let json = body_json(get(app.clone(), "/api/v1/settings").await).await;
    assert_eq!(json["data"]["background_image"], url.as_str());

    let response = post_file_auth(
        app.clone(),
        "/api/v1/admin/background",
        "text/plain",
        b"hello",
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_file_auth(
        app,
        "/api/v1/admin/background?event_id=999999",
        "image/png",
        &png,
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_event_lifecycle(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = admin_token(app.clone()).await;

    let response = post_json_auth(
        app.clone(),
        "/api/v1/admin/events",
        json!({ "name": "Summer wedding", "couple_names": "Ria & Bo" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let event = body_json(response).await["data"].clone();
    let id = event["id"].as_i64().unwrap();
    let code = event["code"].as_str().unwrap().to_string();
    assert_eq!(code.len(), 6);
    assert_eq!(event["join_url"], format!("https://memora.test/?event={code}"));
    assert_eq!(event["memory_count"], 0);

    let response = put_json_auth(
        app.clone(),
        &format!("/api/v1/admin/events/{id}"),
        json!({ "name": "Autumn wedding" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["data"]["name"], "Autumn wedding");
    assert_eq!(updated["data"]["couple_names"], "Ria & Bo");

    let response = delete_auth(app.clone(), &format!("/api/v1/admin/events/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // A deactivated code no longer resolves.
    let json = body_json(get(app.clone(), &format!("/api/v1/resolve?event={code}")).await).await;
    assert!(json["data"]["event"].is_null());

    let json = body_json(get_auth(app, "/api/v1/admin/events", &token).await).await;
    let events = json["data"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["is_active"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_event_code_conflicts(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = admin_token(app.clone()).await;

    let body = json!({ "name": "One", "code": "party1" });
    let response = post_json_auth(app.clone(), "/api/v1/admin/events", body, &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["code"], "PARTY1");

    let body = json!({ "name": "Two", "code": "PARTY1" });
    let response = post_json_auth(app, "/api/v1/admin/events", body, &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_event_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = admin_token(app.clone()).await;

    let response = get_auth(app, "/api/v1/admin/events/424242", &token).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Event 424242 not found");
}

// ---------------------------------------------------------------------------
// Memories and export
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_memories_filter_by_event_and_delete(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = admin_token(app.clone()).await;

    let response = post_json_auth(
        app.clone(),
        "/api/v1/admin/events",
        json!({ "name": "Garden party", "code": "GARDEN" }),
        &token,
    )
    .await;
    let event_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    submit_memory(
        app.clone(),
        json!({ "guest_name": "A", "message": "Global", "event_code": null }),
    )
    .await;
    let scoped = submit_memory(
        app.clone(),
        json!({ "guest_name": "B", "message": "Scoped", "event_code": "garden" }),
    )
    .await;

    let json = body_json(get_auth(app.clone(), "/api/v1/admin/memories", &token).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    // Newest first.
    assert_eq!(json["data"][0]["id"], scoped);

    let uri = format!("/api/v1/admin/memories?event_id={event_id}");
    let json = body_json(get_auth(app.clone(), &uri, &token).await).await;
    let scoped_list = json["data"].as_array().unwrap();
    assert_eq!(scoped_list.len(), 1);
    assert_eq!(scoped_list[0]["event_code"], "GARDEN");

    let uri = format!("/api/v1/admin/memories/{scoped}");
    let response = delete_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = delete_auth(app, &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_export_pdf_download(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = admin_token(app.clone()).await;
    submit_memory(
        app.clone(),
        json!({ "guest_name": "Jamie", "message": "Don't lose each other.", "tone": "funny" }),
    )
    .await;

    let response = get_auth(app, "/api/v1/admin/memories/pdf", &token).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[CONTENT_DISPOSITION],
        "attachment; filename=\"memora_Anna_and_Nemanja.pdf\""
    );
    let bytes = body_bytes(response).await;
    assert!(bytes.starts_with(b"%PDF"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_export_for_missing_event_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = admin_token(app.clone()).await;

    let response = get_auth(app, "/api/v1/admin/memories/pdf?event_id=31337", &token).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
