//! API utility functions
//!
//! Pure, stateless helpers for deriving the proxy's own address and shaping
//! passthrough responses.

use axum::http::{HeaderMap, HeaderValue, Uri, header};

use crate::config::ServerConfig;

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Base URL (`scheme://host[:port]`) that rewritten links point at.
///
/// A configured `public_base_url` wins. Otherwise the inbound `Host` header
/// (or the request authority) is used with `http`, or with the first
/// `X-Forwarded-Proto` value when the server is told to trust it.
pub fn proxy_base_url(headers: &HeaderMap, uri: &Uri, server: &ServerConfig) -> String {
    if let Some(base) = &server.public_base_url {
        return base.trim_end_matches('/').to_string();
    }

    let scheme = server
        .trust_forwarded_proto
        .then(|| header_str(headers, X_FORWARDED_PROTO))
        .flatten()
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| matches!(*value, "http" | "https"))
        .unwrap_or("http");

    let host = header_str(headers, header::HOST.as_str())
        .map(str::to_owned)
        .or_else(|| uri.authority().map(|authority| authority.to_string()))
        .unwrap_or_else(|| server.bind_addr.to_string());

    format!("{scheme}://{host}")
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

/// Origin content type, or `fallback` when the origin sent none.
pub fn content_type_or(origin: Option<&str>, fallback: &'static str) -> HeaderValue {
    origin
        .and_then(|value| HeaderValue::from_str(value).ok())
        .unwrap_or_else(|| HeaderValue::from_static(fallback))
}
