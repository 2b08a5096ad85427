//! Caller metadata used for rate-limit keys and session audit columns.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;

use crate::state::AppState;

/// Longest user agent string kept on a session row.
const MAX_USER_AGENT_LENGTH: usize = 512;

/// Caller address and user agent.
///
/// The address is the socket peer. Forwarding headers are only read when
/// the peer is listed in `TRUSTED_PROXIES`; see [`resolve_client_ip`].
/// Falls back to `"unknown"` when no peer address is attached.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: Option<String>,
}

/// Pick the caller address for a request arriving from `peer`.
///
/// When `peer` is a trusted proxy, `X-Forwarded-For` is walked from the
/// right and the first hop that is not itself a trusted proxy wins. Hops
/// that do not parse stop the walk. `X-Real-IP` is used only when a trusted
/// proxy sent no `X-Forwarded-For`.
pub fn resolve_client_ip(
    peer: Option<IpAddr>,
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    trusted: &[IpAddr],
) -> Option<IpAddr> {
    let peer = peer?;
    if !trusted.contains(&peer) {
        return Some(peer);
    }

    if let Some(chain) = forwarded_for {
        let mut client = peer;
        for hop in chain.rsplit(',') {
            match hop.trim().parse::<IpAddr>() {
                Ok(ip) if trusted.contains(&ip) => client = ip,
                Ok(ip) => return Some(ip),
                Err(_) => break,
            }
        }
        return Some(client);
    }

    real_ip
        .and_then(|v| v.trim().parse().ok())
        .or(Some(peer))
}

impl FromRequestParts<AppState> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let ip = resolve_client_ip(
            peer,
            header("x-forwarded-for"),
            header("x-real-ip"),
            &state.config.trusted_proxies,
        )
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());

        let user_agent = header(USER_AGENT.as_str())
            .map(|v| v.chars().take(MAX_USER_AGENT_LENGTH).collect());

        Ok(ClientInfo { ip, user_agent })
    }
}
