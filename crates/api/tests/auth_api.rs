//! HTTP-level tests for staff authentication and role enforcement.

mod common;

use axum::http::StatusCode;
use common::{
    admin_token, body_json, build_test_app, create_user, editor_token, get, get_auth, post_auth,
    post_json, post_json_auth, TEST_PASSWORD,
};
use cutroom_core::roles::ROLE_ADMIN_ID;
use cutroom_db::repositories::UserRepo;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_success(pool: PgPool) {
    let user = create_user(&pool, "dana", ROLE_ADMIN_ID).await;
    let t = build_test_app(pool);

    let body = serde_json::json!({ "username": "dana", "password": TEST_PASSWORD });
    let response = post_json(t.app(), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert!(json["expires_in"].is_number());
    assert_eq!(json["user"]["id"], user.id);
    assert_eq!(json["user"]["role"], "admin");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_wrong_password(pool: PgPool) {
    create_user(&pool, "dana", ROLE_ADMIN_ID).await;
    let t = build_test_app(pool);

    let body = serde_json::json!({ "username": "dana", "password": "nope" });
    let response = post_json(t.app(), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_unknown_user(pool: PgPool) {
    let t = build_test_app(pool);
    let body = serde_json::json!({ "username": "ghost", "password": "whatever" });
    let response = post_json(t.app(), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_login_inactive_user(pool: PgPool) {
    let user = create_user(&pool, "former", ROLE_ADMIN_ID).await;
    UserRepo::deactivate(&pool, user.id).await.unwrap();
    let t = build_test_app(pool);

    let body = serde_json::json!({ "username": "former", "password": TEST_PASSWORD });
    let response = post_json(t.app(), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Five wrong passwords lock the account even for the right password.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_account_lockout(pool: PgPool) {
    create_user(&pool, "dana", ROLE_ADMIN_ID).await;
    let t = build_test_app(pool);

    for _ in 0..5 {
        let body = serde_json::json!({ "username": "dana", "password": "wrong" });
        let response = post_json(t.app(), "/api/v1/auth/login", body).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let body = serde_json::json!({ "username": "dana", "password": TEST_PASSWORD });
    let response = post_json(t.app(), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// A refresh token is single-use.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_refresh_rotates_token(pool: PgPool) {
    create_user(&pool, "dana", ROLE_ADMIN_ID).await;
    let t = build_test_app(pool);

    let body = serde_json::json!({ "username": "dana", "password": TEST_PASSWORD });
    let login_json = body_json(post_json(t.app(), "/api/v1/auth/login", body).await).await;
    let refresh_token = login_json["refresh_token"].as_str().unwrap().to_string();

    let body = serde_json::json!({ "refresh_token": refresh_token });
    let response = post_json(t.app(), "/api/v1/auth/refresh", body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_ne!(json["refresh_token"], refresh_token.as_str());

    let replay = post_json(t.app(), "/api/v1/auth/refresh", body).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_logout_revokes_refresh_tokens(pool: PgPool) {
    create_user(&pool, "dana", ROLE_ADMIN_ID).await;
    let t = build_test_app(pool);

    let body = serde_json::json!({ "username": "dana", "password": TEST_PASSWORD });
    let login_json = body_json(post_json(t.app(), "/api/v1/auth/login", body).await).await;
    let access = login_json["access_token"].as_str().unwrap();
    let refresh = login_json["refresh_token"].as_str().unwrap();

    let response = post_auth(t.app(), "/api/v1/auth/logout", access).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = serde_json::json!({ "refresh_token": refresh });
    let response = post_json(t.app(), "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_me_returns_current_user(pool: PgPool) {
    let t = build_test_app(pool);
    let token = editor_token(&t).await;

    let response = get_auth(t.app(), "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["username"], "editor");
    assert_eq!(json["data"]["role"], "editor");
    assert!(json["data"].get("password_hash").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_token_is_unauthorized(pool: PgPool) {
    let t = build_test_app(pool);
    let response = get(t.app(), "/api/v1/projects").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Editors manage projects but not users, settings or sales.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_editor_blocked_from_admin_routes(pool: PgPool) {
    let t = build_test_app(pool);
    let token = editor_token(&t).await;

    let response = get_auth(t.app(), "/api/v1/projects", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    for uri in ["/api/v1/admin/users", "/api/v1/admin/settings", "/api/v1/sales/quotes"] {
        let response = get_auth(t.app(), uri, &token).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_creates_editor(pool: PgPool) {
    let t = build_test_app(pool);
    let token = admin_token(&t).await;

    let body = serde_json::json!({
        "username": "newcut",
        "email": "newcut@studio.test",
        "password": "long-enough-password",
        "role_id": 2,
    });
    let response = post_json_auth(t.app(), "/api/v1/admin/users", body, &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["role"], "editor");

    let editor = login_as(&t, "newcut", "long-enough-password").await;
    assert!(!editor.is_empty());
}

async fn login_as(t: &common::TestApp, username: &str, password: &str) -> String {
    let body = serde_json::json!({ "username": username, "password": password });
    let response = post_json(t.app(), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Duplicate usernames conflict.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_username_conflicts(pool: PgPool) {
    let t = build_test_app(pool);
    let token = admin_token(&t).await;

    let body = serde_json::json!({
        "username": "admin",
        "email": "other@studio.test",
        "password": "long-enough-password",
        "role_id": 1,
    });
    let response = post_json_auth(t.app(), "/api/v1/admin/users", body, &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
