//! Requester address resolution.
//!
//! Lookup order: the edge proxy header, the generic forwarded-for header,
//! the Host header, then the socket peer. Ports are stripped.

use std::net::{IpAddr, SocketAddr};

use axum::http::{header, HeaderMap};

pub const CF_CONNECTING_IP: &str = "cf-connecting-ip";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
/// Set on the inbound request so handlers see the resolved address.
pub const X_REMOTE_IP: &str = "x-remote-ip";

/// Resolve the requester address. Empty when nothing is known.
pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(ip) = header_value(headers, CF_CONNECTING_IP) {
        return strip_port(ip).to_string();
    }
    if let Some(chain) = header_value(headers, X_FORWARDED_FOR) {
        // Client first, proxies after.
        let first = chain.split(',').next().unwrap_or_default();
        return strip_port(first).to_string();
    }
    if let Some(host) = header_value(headers, header::HOST.as_str()) {
        return strip_port(host).to_string();
    }
    peer.map(|addr| addr.ip().to_string()).unwrap_or_default()
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn strip_port(value: &str) -> &str {
    let value = value.trim();
    if value.parse::<IpAddr>().is_ok() {
        return value;
    }
    if value.parse::<SocketAddr>().is_ok() {
        // "1.2.3.4:80" or "[::1]:80"
        if let Some((host, _)) = value.rsplit_once(':') {
            return host.trim_start_matches('[').trim_end_matches(']');
        }
    }
    match value.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => value,
    }
}
