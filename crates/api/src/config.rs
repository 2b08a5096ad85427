use std::net::IpAddr;
use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. Malformed values fail fast at startup.
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
    /// Timeout for multipart uploads in seconds (default: `3600`).
    pub upload_timeout_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Client share-link settings.
    pub share: ShareConfig,
    /// Directory holding uploaded videos and assets.
    pub storage_root: PathBuf,
    /// Largest accepted upload in bytes.
    pub max_upload_bytes: u64,
    /// Frontend origin used to build links in emails.
    pub public_base_url: String,
    /// Emit logs as JSON lines.
    pub json_logs: bool,
    /// Reverse proxies whose `X-Forwarded-For` is believed. Empty means
    /// the socket peer is always the client.
    pub trusted_proxies: Vec<IpAddr>,
}

/// Lifetimes for client-facing credentials.
#[derive(Debug, Clone)]
pub struct ShareConfig {
    /// How long a share session stays valid.
    pub session_ttl_hours: i64,
    /// How long a content (streaming/download) token stays valid.
    pub content_token_ttl_secs: i64,
    /// How long an emailed code stays valid.
    pub otp_expiry_mins: i64,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24,
            content_token_ttl_secs: 900,
            otp_expiry_mins: 10,
        }
    }
}

/// Default upload ceiling: 10 GiB.
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024 * 1024;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{name} has an invalid value: {raw}")),
        Err(_) => default,
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `HOST`                    | `0.0.0.0`               |
    /// | `PORT`                    | `3000`                  |
    /// | `CORS_ORIGINS`            | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `UPLOAD_TIMEOUT_SECS`     | `3600`                  |
    /// | `SHARE_SESSION_TTL_HOURS` | `24`                    |
    /// | `CONTENT_TOKEN_TTL_SECS`  | `900`                   |
    /// | `OTP_EXPIRY_MINS`         | `10`                    |
    /// | `STORAGE_ROOT`            | `storage`               |
    /// | `MAX_UPLOAD_BYTES`        | `10737418240`           |
    /// | `PUBLIC_BASE_URL`         | `http://localhost:5173` |
    /// | `LOG_FORMAT`              | `text` (`json` for JSON)|
    /// | `TRUSTED_PROXIES`         | empty (comma-separated) |
    ///
    /// JWT variables are documented on [`JwtConfig::from_env`].
    pub fn from_env() -> Self {
        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let trusted_proxies: Vec<IpAddr> = std::env::var("TRUSTED_PROXIES")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse()
                    .unwrap_or_else(|_| panic!("TRUSTED_PROXIES has an invalid address: {s}"))
            })
            .collect();

        let defaults = ShareConfig::default();
        let share = ShareConfig {
            session_ttl_hours: env_or("SHARE_SESSION_TTL_HOURS", defaults.session_ttl_hours),
            content_token_ttl_secs: env_or(
                "CONTENT_TOKEN_TTL_SECS",
                defaults.content_token_ttl_secs,
            ),
            otp_expiry_mins: env_or("OTP_EXPIRY_MINS", defaults.otp_expiry_mins),
        };

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            upload_timeout_secs: env_or("UPLOAD_TIMEOUT_SECS", 3600),
            jwt: JwtConfig::from_env(),
            share,
            storage_root: PathBuf::from(
                std::env::var("STORAGE_ROOT").unwrap_or_else(|_| "storage".into()),
            ),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into())
                .trim_end_matches('/')
                .to_string(),
            json_logs: std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
            trusted_proxies,
        }
    }

    /// Public link to a project's share page.
    pub fn share_url(&self, slug: &str) -> String {
        format!("{}/share/{slug}", self.public_base_url)
    }

    /// Staff link to a project in the admin UI.
    pub fn admin_project_url(&self, project_id: i64) -> String {
        format!("{}/admin/projects/{project_id}", self.public_base_url)
    }
}
