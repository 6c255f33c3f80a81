//! Client identification utilities
//!
//! Per-client rate windows are keyed by the caller's IP address.
//!
//! `X-Forwarded-For` is client-controlled unless a reverse proxy overwrites
//! it, so it is consulted only when the deployment says it can be trusted.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Key used when no address can be determined
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = xff.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }
    direct_ip
}

/// Stable string identifying the caller, for rate-limit keys
///
/// With `trust_forwarded_for` off, only the peer address is used.
pub fn client_key(headers: &HeaderMap, direct_ip: Option<IpAddr>, trust_forwarded_for: bool) -> String {
    let ip = if trust_forwarded_for {
        extract_client_ip(headers, direct_ip)
    } else {
        direct_ip
    };
    ip.map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
