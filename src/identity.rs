//! Client identification for rate limiting.
//!
//! Anonymous callers are keyed by network address, authenticated callers by
//! the API key they present.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{
    extract::ConnectInfo,
    http::{HeaderMap, Request},
};

use crate::error::RateLimitError;

pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
pub const API_KEY_HEADER: &str = "api_key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientClass {
    Anonymous,
    Authenticated,
}

impl ClientClass {
    /// Label used as the cache key prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientClass::Anonymous => "ip",
            ClientClass::Authenticated => "api_key",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity {
    pub class: ClientClass,
    /// IP address for anonymous clients, raw API key otherwise.
    pub id: String,
}

impl ClientIdentity {
    pub fn anonymous(ip: impl Into<String>) -> Self {
        Self {
            class: ClientClass::Anonymous,
            id: ip.into(),
        }
    }

    pub fn authenticated(api_key: impl Into<String>) -> Self {
        Self {
            class: ClientClass::Authenticated,
            id: api_key.into(),
        }
    }
}

/// Identifies the caller of `req` from its headers and `ConnectInfo`.
pub fn identify_request<B>(req: &Request<B>) -> Result<ClientIdentity, RateLimitError> {
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0);
    identify(req.headers(), remote_addr)
}

/// Resolves the client address, then lets a non-empty API key override it.
///
/// The address must resolve even when an API key is present.
pub fn identify(
    headers: &HeaderMap,
    remote_addr: Option<SocketAddr>,
) -> Result<ClientIdentity, RateLimitError> {
    let ip = client_ip(headers, remote_addr).ok_or(RateLimitError::Identification)?;

    // Any non-empty value authenticates, even outside visible ASCII.
    let api_key = headers
        .get(API_KEY_HEADER)
        .map(|h| h.as_bytes())
        .filter(|key| !key.is_empty());

    Ok(match api_key {
        Some(key) => ClientIdentity::authenticated(String::from_utf8_lossy(key)),
        None => ClientIdentity::anonymous(ip.to_string()),
    })
}

fn client_ip(headers: &HeaderMap, remote_addr: Option<SocketAddr>) -> Option<IpAddr> {
    // The last hop is the one appended by the proxy closest to us.
    let forwarded = headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.rsplit(',').next())
        .and_then(|ip| ip.trim().parse::<IpAddr>().ok());

    forwarded
        .or_else(|| remote_addr.map(|addr| addr.ip()))
        .map(normalize)
}

/// Unwraps IPv4-mapped IPv6 and folds every loopback form to `127.0.0.1`.
fn normalize(ip: IpAddr) -> IpAddr {
    match ip.to_canonical() {
        IpAddr::V6(v6) if v6.is_loopback() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        other => other,
    }
}
