//! Token issuing and validation.
//!
//! Three kinds of HS256 token share one secret and are told apart by the
//! `aud` claim:
//!
//! - staff access tokens ([`Claims`], no audience),
//! - share tokens ([`ShareClaims`], `aud = "share"`) scoping a client to
//!   one project's share session,
//! - content tokens ([`ContentClaims`], `aud = "content"`) authorising a
//!   single video or asset stream.
//!
//! Refresh tokens and share session keys are opaque random strings; only
//! their SHA-256 hash is stored server-side.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use cutroom_core::hashing::sha256_hex;
use cutroom_core::types::DbId;

pub const AUDIENCE_SHARE: &str = "share";
pub const AUDIENCE_CONTENT: &str = "content";

/// Claims embedded in every staff access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// The user's internal database id.
    pub sub: DbId,
    /// The user's role name (`"admin"` or `"editor"`).
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    /// Unique token identifier (UUID v4).
    pub jti: String,
}

/// Claims of a client share token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShareClaims {
    /// Project id the session belongs to.
    pub sub: DbId,
    /// Plaintext session key. Its SHA-256 is the `share_sessions` key.
    pub sid: String,
    /// `full` or `guest`.
    pub scope: String,
    /// How the session was opened (`open`, `password`, `otp`, `guest`).
    pub method: String,
    /// Recipient id for sessions opened with an emailed code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rid: Option<DbId>,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

/// Claims of a short-lived streaming/download token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ContentClaims {
    pub aud: String,
    /// Project id.
    pub pid: DbId,
    /// Video id.
    pub vid: DbId,
    /// Asset id when the token is for a video asset rather than the video.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aid: Option<DbId>,
    pub exp: i64,
    pub iat: i64,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
    /// Refresh token lifetime in days (default: 7).
    pub refresh_token_expiry_days: i64,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
/// Default refresh token expiry in days.
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default |
    /// |----------------------------|----------|---------|
    /// | `JWT_SECRET`               | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `15`    |
    /// | `JWT_REFRESH_EXPIRY_DAYS`  | no       | `7`     |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        let refresh_token_expiry_days: i64 = std::env::var("JWT_REFRESH_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_EXPIRY_DAYS.to_string())
            .parse()
            .expect("JWT_REFRESH_EXPIRY_DAYS must be a valid i64");

        Self {
            secret,
            access_token_expiry_mins,
            refresh_token_expiry_days,
        }
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.secret.as_bytes())
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.secret.as_bytes())
    }
}

/// Validation for tokens carrying the given audience.
fn audience_validation(audience: &str) -> Validation {
    let mut validation = Validation::default();
    validation.set_audience(&[audience]);
    validation.set_required_spec_claims(&["exp", "aud"]);
    validation
}

/* --------------------------------------------------------------------------
Staff access tokens
-------------------------------------------------------------------------- */

/// Generate an HS256 access token for a staff user.
pub fn generate_access_token(
    user_id: DbId,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        exp: now + config.access_token_expiry_mins * 60,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };
    encode(&Header::default(), &claims, &config.encoding_key())
}

/// Validate and decode a staff access token.
///
/// Tokens carrying any audience (share or content tokens) are rejected.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(token, &config.decoding_key(), &Validation::default())?;
    Ok(token_data.claims)
}

/* --------------------------------------------------------------------------
Share tokens
-------------------------------------------------------------------------- */

/// Fields needed to mint a share token.
#[derive(Debug, Clone)]
pub struct ShareTokenInput<'a> {
    pub project_id: DbId,
    pub session_key: &'a str,
    pub scope: &'a str,
    pub method: &'a str,
    pub recipient_id: Option<DbId>,
    /// Session expiry as a Unix timestamp; mirrors `share_sessions.expires_at`.
    pub expires_at: i64,
}

pub fn generate_share_token(
    input: &ShareTokenInput<'_>,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = ShareClaims {
        sub: input.project_id,
        sid: input.session_key.to_string(),
        scope: input.scope.to_string(),
        method: input.method.to_string(),
        rid: input.recipient_id,
        aud: AUDIENCE_SHARE.to_string(),
        exp: input.expires_at,
        iat: chrono::Utc::now().timestamp(),
    };
    encode(&Header::default(), &claims, &config.encoding_key())
}

pub fn validate_share_token(
    token: &str,
    config: &JwtConfig,
) -> Result<ShareClaims, jsonwebtoken::errors::Error> {
    let data = decode::<ShareClaims>(
        token,
        &config.decoding_key(),
        &audience_validation(AUDIENCE_SHARE),
    )?;
    Ok(data.claims)
}

/* --------------------------------------------------------------------------
Content tokens
-------------------------------------------------------------------------- */

pub fn generate_content_token(
    project_id: DbId,
    video_id: DbId,
    asset_id: Option<DbId>,
    ttl_secs: i64,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = ContentClaims {
        aud: AUDIENCE_CONTENT.to_string(),
        pid: project_id,
        vid: video_id,
        aid: asset_id,
        exp: now + ttl_secs,
        iat: now,
    };
    encode(&Header::default(), &claims, &config.encoding_key())
}

pub fn validate_content_token(
    token: &str,
    config: &JwtConfig,
) -> Result<ContentClaims, jsonwebtoken::errors::Error> {
    let data = decode::<ContentClaims>(
        token,
        &config.decoding_key(),
        &audience_validation(AUDIENCE_CONTENT),
    )?;
    Ok(data.claims)
}

/* --------------------------------------------------------------------------
Opaque tokens
-------------------------------------------------------------------------- */

/// Generate a random opaque token and its SHA-256 hash.
///
/// Returns `(plaintext, sha256_hex)`. Used for refresh tokens and share
/// session keys; only the hash is persisted.
pub fn generate_opaque_token() -> (String, String) {
    let plaintext = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let hash = hash_token(&plaintext);
    (plaintext, hash)
}

/// SHA-256 hex digest of an opaque token.
pub fn hash_token(token: &str) -> String {
    sha256_hex(token.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        }
    }

    fn share_token(config: &JwtConfig, expires_at: i64) -> String {
        generate_share_token(
            &ShareTokenInput {
                project_id: 7,
                session_key: "session-key",
                scope: "full",
                method: "password",
                recipient_id: None,
                expires_at,
            },
            config,
        )
        .expect("share token")
    }

    #[test]
    fn access_token_round_trip() {
        let config = test_config();
        let token = generate_access_token(42, "admin", &config).unwrap();
        let claims = validate_token(&token, &config).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "admin");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_access_token_fails() {
        let config = test_config();
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            role: "editor".to_string(),
            exp: now - 300,
            iat: now - 600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::default(), &claims, &config.encoding_key()).unwrap();
        assert!(validate_token(&token, &config).is_err());
    }

    #[test]
    fn different_secret_fails() {
        let token = generate_access_token(1, "editor", &test_config()).unwrap();
        let other = JwtConfig {
            secret: "another-secret".to_string(),
            ..test_config()
        };
        assert!(validate_token(&token, &other).is_err());
    }

    #[test]
    fn share_token_carries_session() {
        let config = test_config();
        let exp = chrono::Utc::now().timestamp() + 3600;
        let claims = validate_share_token(&share_token(&config, exp), &config).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.sid, "session-key");
        assert_eq!(claims.scope, "full");
        assert_eq!(claims.exp, exp);
    }

    #[test]
    fn expired_share_token_fails() {
        let config = test_config();
        let exp = chrono::Utc::now().timestamp() - 300;
        assert!(validate_share_token(&share_token(&config, exp), &config).is_err());
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let config = test_config();
        let exp = chrono::Utc::now().timestamp() + 3600;
        let share = share_token(&config, exp);
        let content = generate_content_token(7, 3, None, 600, &config).unwrap();
        let access = generate_access_token(1, "admin", &config).unwrap();

        assert!(validate_token(&share, &config).is_err());
        assert!(validate_token(&content, &config).is_err());
        assert!(validate_share_token(&access, &config).is_err());
        assert!(validate_share_token(&content, &config).is_err());
        assert!(validate_content_token(&access, &config).is_err());
        assert!(validate_content_token(&share, &config).is_err());
    }

    #[test]
    fn content_token_for_asset() {
        let config = test_config();
        let token = generate_content_token(7, 3, Some(11), 600, &config).unwrap();
        let claims = validate_content_token(&token, &config).unwrap();
        assert_eq!((claims.pid, claims.vid, claims.aid), (7, 3, Some(11)));
    }

    #[test]
    fn opaque_token_hash_is_stable() {
        let (plaintext, hash) = generate_opaque_token();
        assert_eq!(hash, hash_token(&plaintext));
        assert_eq!(hash.len(), 64);
        assert_ne!(generate_opaque_token().0, plaintext);
    }
}
