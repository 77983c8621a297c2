//! Wire models for the proxy's HTTP surface.
//!
//! `/proxy` and `/media` share one query shape:
//!
//! ```text
//! GET /proxy?url=https%3A%2F%2Fcdn.example.com%2Flive%2Fmaster.m3u8&ip=203.0.113.7&ua=MyPlayer%2F2.0
//! ```
//!
//! - `url` is required and must decode to an absolute http(s) URL
//! - `ip` is sent to the origin as `X-Forwarded-For`
//! - `ua` replaces the default `User-Agent` sent to the origin

use serde::{Deserialize, Serialize};

use crate::observability::MetricsSnapshot;

#[derive(Debug, Default, Deserialize, Clone)]
pub struct ProxyQuery {
    pub url: Option<String>,
    pub ip: Option<String>,
    pub ua: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub counters: MetricsSnapshot,
}
