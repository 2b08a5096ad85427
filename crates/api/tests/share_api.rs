//! HTTP-level tests for client share links: sign-in methods, session
//! scope, project status gating and rate limiting.

mod common;

use std::net::SocketAddr;

use axum::http::header::RETRY_AFTER;
use axum::http::StatusCode;
use common::{
    admin_token, body_json, build_test_app, build_test_app_with, create_project, delete_auth,
    get, get_auth, post_json, post_json_auth, post_json_from, post_multipart_auth,
    put_json_auth, upload_video, TestApp,
};
use sqlx::PgPool;

const SHARE_PASSWORD: &str = "screening-42";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Project in password mode with one uploaded video. Returns
/// `(staff token, project id, video id)`.
async fn password_project(t: &TestApp, slug: &str) -> (String, i64, i64) {
    let token = admin_token(t).await;
    let project = create_project(t, &token, slug).await;
    let project_id = project["id"].as_i64().unwrap();

    let body = serde_json::json!({ "auth_mode": "password", "password": SHARE_PASSWORD });
    let response =
        put_json_auth(t.app(), &format!("/api/v1/projects/{project_id}/share"), body, &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let video = upload_video(t, &token, project_id, "Hero cut", b"fake video bytes").await;
    (token, project_id, video["id"].as_i64().unwrap())
}

async fn password_session(t: &TestApp, slug: &str) -> String {
    let body = serde_json::json!({ "password": SHARE_PASSWORD, "name": "Dana" });
    let response = post_json(t.app(), &format!("/api/v1/share/{slug}/auth/password"), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["scope"], "full");
    json["data"]["token"].as_str().unwrap().to_string()
}

async fn add_recipient(t: &TestApp, token: &str, project_id: i64, email: &str) {
    let body = serde_json::json!({ "email": email, "name": "Client Contact" });
    let response = post_json_auth(
        t.app(),
        &format!("/api/v1/projects/{project_id}/recipients"),
        body,
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

/// Request a code for `email` and redeem it. Returns the session token.
async fn otp_session(t: &TestApp, slug: &str, email: &str) -> String {
    let body = serde_json::json!({ "email": email });
    let response = post_json(t.app(), &format!("/api/v1/share/{slug}/auth/otp/request"), body).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = serde_json::json!({ "email": email, "code": last_code(t) });
    let response = post_json(t.app(), &format!("/api/v1/share/{slug}/auth/otp/verify"), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["token"].as_str().unwrap().to_string()
}

fn peer(addr: &str) -> SocketAddr {
    addr.parse().unwrap()
}

/// Pull the 6-digit code out of the most recent email.
fn last_code(t: &TestApp) -> String {
    let sent = t.mailer.sent();
    let mail = sent.last().expect("a code email should have been sent");
    mail.subject.split_whitespace().next().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Link lookup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unknown_slug_is_404(pool: PgPool) {
    let t = build_test_app(pool);
    let response = get(t.app(), "/api/v1/share/no-such-link").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_share_info_hides_session_for_password_mode(pool: PgPool) {
    let t = build_test_app(pool);
    password_project(&t, "spring-promo").await;

    let response = get(t.app(), "/api/v1/share/spring-promo").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["password_required"], true);
    assert_eq!(json["data"]["guest_available"], false);
    assert!(json["data"]["session"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_open_project_issues_session(pool: PgPool) {
    let t = build_test_app(pool);
    let token = admin_token(&t).await;
    let project = create_project(&t, &token, "open-house").await;
    let id = project["id"].as_i64().unwrap();
    let body = serde_json::json!({ "auth_mode": "none" });
    put_json_auth(t.app(), &format!("/api/v1/projects/{id}/share"), body, &token).await;

    let json = body_json(get(t.app(), "/api/v1/share/open-house").await).await;
    assert_eq!(json["data"]["session"]["access_method"], "open");
    let session = json["data"]["session"]["token"].as_str().unwrap();

    let response = get_auth(t.app(), "/api/v1/share/open-house/videos", session).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_archived_project_is_forbidden(pool: PgPool) {
    let t = build_test_app(pool);
    let (token, project_id, _) = password_project(&t, "old-job").await;
    let session = password_session(&t, "old-job").await;

    let body = serde_json::json!({ "status": "archived" });
    let response =
        put_json_auth(t.app(), &format!("/api/v1/projects/{project_id}"), body, &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(t.app(), "/api/v1/share/old-job").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = get_auth(t.app(), "/api/v1/share/old-job/videos", &session).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Password sign-in
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_wrong_password_issues_no_session(pool: PgPool) {
    let t = build_test_app(pool);
    password_project(&t, "spring-promo").await;

    let body = serde_json::json!({ "password": "not-it" });
    let response =
        post_json(t.app(), "/api/v1/share/spring-promo/auth/password", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert!(json.get("data").is_none());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM share_sessions")
        .fetch_one(&t.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_password_session_lists_videos(pool: PgPool) {
    let t = build_test_app(pool);
    let (_, _, video_id) = password_project(&t, "spring-promo").await;
    let session = password_session(&t, "spring-promo").await;

    let response = get_auth(t.app(), "/api/v1/share/spring-promo/videos", &session).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["name"], "Hero cut");
    assert_eq!(json["data"][0]["versions"][0]["id"], video_id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_password_attempts_rate_limited(pool: PgPool) {
    let t = build_test_app(pool);
    password_project(&t, "spring-promo").await;

    for _ in 0..10 {
        let body = serde_json::json!({ "password": "guessing" });
        let response =
            post_json(t.app(), "/api/v1/share/spring-promo/auth/password", body).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the right password is refused until the window passes.
    let body = serde_json::json!({ "password": SHARE_PASSWORD });
    let response = post_json(t.app(), "/api/v1/share/spring-promo/auth/password", body).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(RETRY_AFTER));
    assert_eq!(body_json(response).await["code"], "RATE_LIMITED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_password_change_revokes_sessions(pool: PgPool) {
    let t = build_test_app(pool);
    let (token, project_id, _) = password_project(&t, "spring-promo").await;
    let session = password_session(&t, "spring-promo").await;

    let body = serde_json::json!({ "password": "a-new-secret" });
    let response =
        put_json_auth(t.app(), &format!("/api/v1/projects/{project_id}/share"), body, &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(t.app(), "/api/v1/share/spring-promo/videos", &session).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_end_session(pool: PgPool) {
    let t = build_test_app(pool);
    password_project(&t, "spring-promo").await;
    let session = password_session(&t, "spring-promo").await;

    let response = delete_auth(t.app(), "/api/v1/share/spring-promo/session", &session).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(t.app(), "/api/v1/share/spring-promo/videos", &session).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Share tokens never work as staff credentials.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_share_token_rejected_on_staff_routes(pool: PgPool) {
    let t = build_test_app(pool);
    password_project(&t, "spring-promo").await;
    let session = password_session(&t, "spring-promo").await;

    let response = get_auth(t.app(), "/api/v1/projects", &session).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// A session for one project does not open another.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_session_bound_to_project(pool: PgPool) {
    let t = build_test_app(pool);
    let (token, _, _) = password_project(&t, "spring-promo").await;
    create_project(&t, &token, "other-job").await;
    let session = password_session(&t, "spring-promo").await;

    let response = get_auth(t.app(), "/api/v1/share/other-job/videos", &session).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// One-time codes
// ---------------------------------------------------------------------------

async fn otp_project(t: &TestApp, slug: &str) -> (String, i64) {
    let token = admin_token(t).await;
    let project = create_project(t, &token, slug).await;
    let project_id = project["id"].as_i64().unwrap();
    add_recipient(t, &token, project_id, "client@acme.test").await;

    let body = serde_json::json!({ "auth_mode": "otp" });
    let response =
        put_json_auth(t.app(), &format!("/api/v1/projects/{project_id}/share"), body, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    (token, project_id)
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_otp_sign_in(pool: PgPool) {
    let t = build_test_app(pool);
    otp_project(&t, "code-job").await;

    let body = serde_json::json!({ "email": "Client@Acme.test" });
    let response = post_json(t.app(), "/api/v1/share/code-job/auth/otp/request", body).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(t.mailer.sent().len(), 1);
    assert_eq!(t.mailer.sent()[0].to, "client@acme.test");

    let code = last_code(&t);
    assert_eq!(code.len(), 6);

    let body = serde_json::json!({ "email": "client@acme.test", "code": code });
    let response = post_json(t.app(), "/api/v1/share/code-job/auth/otp/verify", body.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["access_method"], "otp");
    assert_eq!(json["data"]["display_name"], "Client Contact");

    // Codes are single-use.
    let response = post_json(t.app(), "/api/v1/share/code-job/auth/otp/verify", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Unknown addresses get the same answer and no email.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_otp_request_for_unknown_email(pool: PgPool) {
    let t = build_test_app(pool);
    otp_project(&t, "code-job").await;

    let body = serde_json::json!({ "email": "stranger@elsewhere.test" });
    let response = post_json(t.app(), "/api/v1/share/code-job/auth/otp/request", body).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(t.mailer.sent().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_expired_otp_rejected(pool: PgPool) {
    let t = build_test_app(pool);
    otp_project(&t, "code-job").await;

    let body = serde_json::json!({ "email": "client@acme.test" });
    post_json(t.app(), "/api/v1/share/code-job/auth/otp/request", body).await;
    let code = last_code(&t);

    sqlx::query("UPDATE share_otps SET expires_at = NOW() - INTERVAL '1 minute'")
        .execute(&t.pool)
        .await
        .unwrap();

    let body = serde_json::json!({ "email": "client@acme.test", "code": code });
    let response = post_json(t.app(), "/api/v1/share/code-job/auth/otp/verify", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_wrong_otp_counts_attempts(pool: PgPool) {
    let t = build_test_app(pool);
    otp_project(&t, "code-job").await;

    let body = serde_json::json!({ "email": "client@acme.test" });
    post_json(t.app(), "/api/v1/share/code-job/auth/otp/request", body).await;
    let code = last_code(&t);
    let wrong = if code == "000000" { "111111" } else { "000000" };

    for _ in 0..5 {
        let body = serde_json::json!({ "email": "client@acme.test", "code": wrong });
        let response = post_json(t.app(), "/api/v1/share/code-job/auth/otp/verify", body).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // The code is dead after five misses.
    let body = serde_json::json!({ "email": "client@acme.test", "code": code });
    let response = post_json(t.app(), "/api/v1/share/code-job/auth/otp/verify", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_otp_requests_rate_limited_per_email(pool: PgPool) {
    let t = build_test_app(pool);
    otp_project(&t, "code-job").await;

    for _ in 0..3 {
        let body = serde_json::json!({ "email": "client@acme.test" });
        let response = post_json(t.app(), "/api/v1/share/code-job/auth/otp/request", body).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }
    let body = serde_json::json!({ "email": "client@acme.test" });
    let response = post_json(t.app(), "/api/v1/share/code-job/auth/otp/request", body).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_password_rejected_in_otp_mode(pool: PgPool) {
    let t = build_test_app(pool);
    otp_project(&t, "code-job").await;

    let body = serde_json::json!({ "password": SHARE_PASSWORD });
    let response = post_json(t.app(), "/api/v1/share/code-job/auth/password", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Guests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_guest_disabled_by_default(pool: PgPool) {
    let t = build_test_app(pool);
    password_project(&t, "spring-promo").await;

    let response = post_json(
        t.app(),
        "/api/v1/share/spring-promo/auth/guest",
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_guest_is_view_only_and_sees_latest(pool: PgPool) {
    let t = build_test_app(pool);
    let (token, project_id, _) = password_project(&t, "spring-promo").await;
    let v2 = upload_video(&t, &token, project_id, "Hero cut", b"second cut").await;
    let v2_id = v2["id"].as_i64().unwrap();

    let body = serde_json::json!({ "guest_mode": true });
    put_json_auth(t.app(), &format!("/api/v1/projects/{project_id}/share"), body, &token).await;

    let response = post_json(
        t.app(),
        "/api/v1/share/spring-promo/auth/guest",
        serde_json::json!({ "name": "Reviewer" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["scope"], "guest");
    let guest = json["data"]["token"].as_str().unwrap().to_string();

    let json = body_json(get_auth(t.app(), "/api/v1/share/spring-promo/videos", &guest).await).await;
    let versions = json["data"][0]["versions"].as_array().unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0]["id"], v2_id);

    let response = get_auth(t.app(), "/api/v1/share/spring-promo/comments", &guest).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = serde_json::json!({ "video_id": v2_id, "content": "Looks great" });
    let response =
        post_json_auth(t.app(), "/api/v1/share/spring-promo/comments", body, &guest).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json_auth(
        t.app(),
        &format!("/api/v1/share/spring-promo/videos/{v2_id}/approve"),
        serde_json::json!({}),
        &guest,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Comments and approval
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_client_comment_and_internal_notes(pool: PgPool) {
    let t = build_test_app(pool);
    let (token, project_id, video_id) = password_project(&t, "spring-promo").await;
    let session = password_session(&t, "spring-promo").await;

    let body = serde_json::json!({
        "video_id": video_id,
        "content": "Trim the intro",
        "timecode_secs": 0.0,
    });
    let response =
        post_json_auth(t.app(), "/api/v1/share/spring-promo/comments", body, &session).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["author_kind"], "client");
    assert_eq!(json["data"]["author_name"], "Dana");

    let body = serde_json::json!({
        "video_id": video_id,
        "content": "Internal: check the grade",
        "is_internal": true,
    });
    let response = post_json_auth(
        t.app(),
        &format!("/api/v1/projects/{project_id}/comments"),
        body,
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json =
        body_json(get_auth(t.app(), "/api/v1/share/spring-promo/comments", &session).await).await;
    let comments = json["data"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["content"], "Trim the intro");

    let json = body_json(
        get_auth(t.app(), &format!("/api/v1/projects/{project_id}/comments"), &token).await,
    )
    .await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_client_deletes_only_own_comment(pool: PgPool) {
    let t = build_test_app(pool);
    let (_, _, video_id) = password_project(&t, "spring-promo").await;
    let first = password_session(&t, "spring-promo").await;
    let second = password_session(&t, "spring-promo").await;

    let body = serde_json::json!({ "video_id": video_id, "content": "Mine" });
    let json = body_json(
        post_json_auth(t.app(), "/api/v1/share/spring-promo/comments", body, &first).await,
    )
    .await;
    let comment_id = json["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/share/spring-promo/comments/{comment_id}");

    let response = delete_auth(t.app(), &uri, &second).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = delete_auth(t.app(), &uri, &first).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_share_only_blocks_comments(pool: PgPool) {
    let t = build_test_app(pool);
    let (token, project_id, video_id) = password_project(&t, "spring-promo").await;
    let session = password_session(&t, "spring-promo").await;

    let body = serde_json::json!({ "status": "share_only" });
    put_json_auth(t.app(), &format!("/api/v1/projects/{project_id}"), body, &token).await;

    let response = get_auth(t.app(), "/api/v1/share/spring-promo/videos", &session).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = serde_json::json!({ "video_id": video_id, "content": "Can I still comment?" });
    let response =
        post_json_auth(t.app(), "/api/v1/share/spring-promo/comments", body, &session).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

/// Approving every group approves the project.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_client_approval_rolls_up(pool: PgPool) {
    let t = build_test_app(pool);
    let (token, project_id, video_id) = password_project(&t, "spring-promo").await;
    let session = password_session(&t, "spring-promo").await;

    let response = post_json_auth(
        t.app(),
        &format!("/api/v1/share/spring-promo/videos/{video_id}/approve"),
        serde_json::json!({}),
        &session,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["approved"], true);

    let json =
        body_json(get_auth(t.app(), &format!("/api/v1/projects/{project_id}"), &token).await)
            .await;
    assert_eq!(json["data"]["status"], "approved");
}

/// Staff tokens open share routes with full access.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_staff_token_on_share_route(pool: PgPool) {
    let t = build_test_app(pool);
    let (token, _, video_id) = password_project(&t, "spring-promo").await;

    let body = serde_json::json!({ "video_id": video_id, "content": "Reply from the studio" });
    let response =
        post_json_auth(t.app(), "/api/v1/share/spring-promo/comments", body, &token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["author_kind"], "staff");
}

// ---------------------------------------------------------------------------
// Caller addresses
// ---------------------------------------------------------------------------

/// A direct caller cannot refresh its budget by inventing forwarding headers.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_forwarded_for_ignored_from_untrusted_peer(pool: PgPool) {
    let t = build_test_app(pool);
    password_project(&t, "spring-promo").await;
    let uri = "/api/v1/share/spring-promo/auth/password";
    let caller = peer("203.0.113.9:40000");

    for i in 0..10 {
        let xff = format!("10.0.0.{i}");
        let body = serde_json::json!({ "password": "guessing" });
        let response =
            post_json_from(t.app(), uri, body, caller, &[("x-forwarded-for", &xff)]).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let body = serde_json::json!({ "password": "guessing" });
    let response = post_json_from(
        t.app(),
        uri,
        body,
        caller,
        &[("x-forwarded-for", "10.0.0.99"), ("x-real-ip", "10.0.0.98")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

/// Behind a trusted proxy each forwarded client has its own budget, and
/// hops prepended by the client do not change who it is.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_trusted_proxy_keys_on_forwarded_client(pool: PgPool) {
    let proxy = peer("10.1.0.1:443");
    let t = build_test_app_with(pool, |config| config.trusted_proxies = vec![proxy.ip()]);
    password_project(&t, "spring-promo").await;
    let uri = "/api/v1/share/spring-promo/auth/password";
    let guess = || serde_json::json!({ "password": "guessing" });

    for _ in 0..10 {
        let response =
            post_json_from(t.app(), uri, guess(), proxy, &[("x-forwarded-for", "198.51.100.7")])
                .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = post_json_from(
        t.app(),
        uri,
        guess(),
        proxy,
        &[("x-forwarded-for", "1.2.3.4, 198.51.100.7")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response =
        post_json_from(t.app(), uri, guess(), proxy, &[("x-forwarded-for", "198.51.100.8")]).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Code attempts and recipient removal
// ---------------------------------------------------------------------------

/// Parallel guesses from many addresses still get five tries in total.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_parallel_wrong_codes_share_attempt_cap(pool: PgPool) {
    let t = build_test_app(pool);
    otp_project(&t, "code-job").await;

    let body = serde_json::json!({ "email": "client@acme.test" });
    post_json(t.app(), "/api/v1/share/code-job/auth/otp/request", body).await;
    let code = last_code(&t);
    let wrong = if code == "000000" { "111111" } else { "000000" };

    let mut guesses = tokio::task::JoinSet::new();
    for i in 0..12 {
        let app = t.app();
        let caller = peer(&format!("203.0.113.{i}:5000"));
        guesses.spawn(async move {
            let body = serde_json::json!({ "email": "client@acme.test", "code": wrong });
            post_json_from(app, "/api/v1/share/code-job/auth/otp/verify", body, caller, &[])
                .await
                .status()
        });
    }
    while let Some(status) = guesses.join_next().await {
        assert_eq!(status.unwrap(), StatusCode::UNAUTHORIZED);
    }

    let attempts: i32 = sqlx::query_scalar("SELECT attempts FROM share_otps")
        .fetch_one(&t.pool)
        .await
        .unwrap();
    assert_eq!(attempts, 5);

    let body = serde_json::json!({ "email": "client@acme.test", "code": code });
    let response = post_json(t.app(), "/api/v1/share/code-job/auth/otp/verify", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Removing a recipient ends the session they opened, even while it is
/// cached.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_removed_recipient_loses_access(pool: PgPool) {
    let t = build_test_app(pool);
    let (token, project_id) = otp_project(&t, "code-job").await;
    let session = otp_session(&t, "code-job", "client@acme.test").await;

    let response = get_auth(t.app(), "/api/v1/share/code-job/videos", &session).await;
    assert_eq!(response.status(), StatusCode::OK);

    let recipients_uri = format!("/api/v1/projects/{project_id}/recipients");
    let json = body_json(get_auth(t.app(), &recipients_uri, &token).await).await;
    let recipient_id = json["data"][0]["id"].as_i64().unwrap();

    let response =
        delete_auth(t.app(), &format!("{recipients_uri}/{recipient_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(t.app(), "/api/v1/share/code-job/videos", &session).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Mixed sign-in, downloads, open links
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_both_mode_accepts_password_or_code(pool: PgPool) {
    let t = build_test_app(pool);
    let (token, project_id) = otp_project(&t, "either-way").await;
    let body = serde_json::json!({ "auth_mode": "both", "password": SHARE_PASSWORD });
    let response =
        put_json_auth(t.app(), &format!("/api/v1/projects/{project_id}/share"), body, &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get(t.app(), "/api/v1/share/either-way").await).await;
    assert_eq!(json["data"]["password_required"], true);
    assert_eq!(json["data"]["otp_available"], true);

    let by_password = password_session(&t, "either-way").await;
    let by_code = otp_session(&t, "either-way", "client@acme.test").await;
    for session in [&by_password, &by_code] {
        let response = get_auth(t.app(), "/api/v1/share/either-way/videos", session).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_asset_token_requires_downloads_enabled(pool: PgPool) {
    let t = build_test_app(pool);
    let (token, project_id, video_id) = password_project(&t, "spring-promo").await;
    let session = password_session(&t, "spring-promo").await;

    let response = post_multipart_auth(
        t.app(),
        &format!("/api/v1/videos/{video_id}/assets"),
        &[("category", "caption")],
        ("file", "subs.srt", b"1\n00:00:01,000 --> 00:00:02,000\nHi\n"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let asset_id = body_json(response).await["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/share/spring-promo/assets/{asset_id}/content-token");

    let response = post_json_auth(t.app(), &uri, serde_json::json!({}), &session).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = serde_json::json!({ "allow_asset_download": true });
    put_json_auth(t.app(), &format!("/api/v1/projects/{project_id}/share"), body, &token).await;

    let response = post_json_auth(t.app(), &uri, serde_json::json!({}), &session).await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// Revisiting an open link with a live session does not mint another.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_open_link_reuses_live_session(pool: PgPool) {
    let t = build_test_app(pool);
    let token = admin_token(&t).await;
    let project = create_project(&t, &token, "open-house").await;
    let id = project["id"].as_i64().unwrap();
    let body = serde_json::json!({ "auth_mode": "none" });
    put_json_auth(t.app(), &format!("/api/v1/projects/{id}/share"), body, &token).await;

    let json = body_json(get(t.app(), "/api/v1/share/open-house").await).await;
    let session = json["data"]["session"]["token"].as_str().unwrap().to_string();

    let json = body_json(get_auth(t.app(), "/api/v1/share/open-house", &session).await).await;
    assert!(json["data"]["session"].is_null());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM share_sessions")
        .fetch_one(&t.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// Clients cannot reply to internal staff notes or learn that they exist.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_client_cannot_reply_to_internal_note(pool: PgPool) {
    let t = build_test_app(pool);
    let (token, project_id, video_id) = password_project(&t, "spring-promo").await;
    let session = password_session(&t, "spring-promo").await;

    let body = serde_json::json!({
        "video_id": video_id,
        "content": "Internal: legal has not cleared the music",
        "is_internal": true,
    });
    let response = post_json_auth(
        t.app(),
        &format!("/api/v1/projects/{project_id}/comments"),
        body,
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let note_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let body = serde_json::json!({ "video_id": video_id, "content": "What?", "parent_id": note_id });
    let response =
        post_json_auth(t.app(), "/api/v1/share/spring-promo/comments", body, &session).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
