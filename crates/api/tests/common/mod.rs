#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use cutroom_api::auth::jwt::JwtConfig;
use cutroom_api::auth::password::hash_password;
use cutroom_api::config::{ServerConfig, ShareConfig};
use cutroom_api::rate_limit::RateLimiter;
use cutroom_api::router::build_app_router;
use cutroom_api::share::cache::ShareSessionCache;
use cutroom_api::state::AppState;
use cutroom_api::storage::Storage;
use cutroom_core::roles::{ROLE_ADMIN_ID, ROLE_EDITOR_ID};
use cutroom_db::models::user::{CreateUser, User};
use cutroom_db::repositories::UserRepo;
use cutroom_events::{EventBus, MailError, MailTransport, OutgoingEmail};

pub const TEST_PASSWORD: &str = "test_password_123!";

/// Mail transport that keeps every message in memory.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// A fully wired application plus the handles tests inspect.
pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub mailer: Arc<RecordingMailer>,
    pub storage: Arc<Storage>,
    pub event_bus: Arc<EventBus>,
    /// Keeps the storage directory alive for the test's duration.
    _storage_dir: TempDir,
}

impl TestApp {
    /// A fresh clone of the router for a single `oneshot` call.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(storage_root: &std::path::Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upload_timeout_secs: 60,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hs256".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        share: ShareConfig::default(),
        storage_root: storage_root.to_path_buf(),
        max_upload_bytes: 10 * 1024 * 1024,
        public_base_url: "http://localhost:5173".to_string(),
        json_logs: false,
        trusted_proxies: Vec::new(),
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool and a temporary storage directory.
pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, |_| {})
}

/// Like [`build_test_app`], with a hook to adjust the configuration.
pub fn build_test_app_with(pool: PgPool, configure: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let storage_dir = TempDir::new().expect("temp dir");
    let mut config = test_config(storage_dir.path());
    configure(&mut config);
    let mailer = Arc::new(RecordingMailer::default());
    let storage = Arc::new(Storage::new(
        config.storage_root.clone(),
        config.max_upload_bytes,
    ));
    let event_bus = Arc::new(EventBus::default());

    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        mailer: mailer.clone(),
        rate_limiter: Arc::new(RateLimiter::new()),
        share_sessions: Arc::new(ShareSessionCache::default()),
        storage: Arc::clone(&storage),
    };

    TestApp {
        router: build_app_router(state, &config),
        pool,
        mailer,
        storage,
        event_bus,
        _storage_dir: storage_dir,
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create a staff user directly in the database.
pub async fn create_user(pool: &PgPool, username: &str, role_id: i64) -> User {
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@studio.test"),
        display_name: None,
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        role_id,
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

/// Log in through the API and return the access token.
pub async fn login(app: Router, username: &str) -> String {
    let body = serde_json::json!({ "username": username, "password": TEST_PASSWORD });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["access_token"].as_str().unwrap().to_string()
}

pub async fn admin_token(t: &TestApp) -> String {
    create_user(&t.pool, "admin", ROLE_ADMIN_ID).await;
    login(t.app(), "admin").await
}

pub async fn editor_token(t: &TestApp) -> String {
    create_user(&t.pool, "editor", ROLE_EDITOR_ID).await;
    login(t.app(), "editor").await
}

/// Create a project through the API and return its JSON.
pub async fn create_project(t: &TestApp, token: &str, slug: &str) -> serde_json::Value {
    let body = serde_json::json!({ "title": format!("Project {slug}"), "share_slug": slug });
    let response = post_json_auth(t.app(), "/api/v1/projects", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

/// Upload a small video through the API and return its JSON.
pub async fn upload_video(
    t: &TestApp,
    token: &str,
    project_id: i64,
    name: &str,
    bytes: &[u8],
) -> serde_json::Value {
    let response = post_multipart_auth(
        t.app(),
        &format!("/api/v1/projects/{project_id}/videos"),
        &[("name", name)],
        ("file", &format!("{name}.mp4"), bytes),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn json_request(method: Method, uri: &str, body: serde_json::Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// POST JSON as if it arrived over a socket from `peer`, with extra headers.
pub async fn post_json_from(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    peer: SocketAddr,
    headers: &[(&str, &str)],
) -> Response<Body> {
    let mut request = json_request(Method::POST, uri, body, None);
    for (name, value) in headers {
        request.headers_mut().insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    request.extensions_mut().insert(ConnectInfo(peer));
    send(app, request).await
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, empty_request(Method::GET, uri, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request(Method::GET, uri, Some(token))).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, body, None)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::POST, uri, body, Some(token))).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request(Method::POST, uri, Some(token))).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, json_request(Method::PUT, uri, body, Some(token))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, empty_request(Method::DELETE, uri, Some(token))).await
}

/// POST a `multipart/form-data` body with text fields and one file.
pub async fn post_multipart_auth(
    app: Router,
    uri: &str,
    fields: &[(&str, &str)],
    file: (&str, &str, &[u8]),
    token: &str,
) -> Response<Body> {
    const BOUNDARY: &str = "cutroom-test-boundary";
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    let (field, file_name, bytes) = file;
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}
