//! Origin fetching.
//!
//! Both handlers reach the origin through the [`OriginFetch`] trait. The
//! production implementation is [`HttpOriginFetcher`] (reqwest); tests plug
//! in their own.

mod headers;
mod http;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, StatusCode, header};
use thiserror::Error;

use crate::request::Forwarding;

pub use headers::{DEFAULT_USER_AGENT, build_origin_headers};
pub use http::{FetcherConfig, HttpOriginFetcher};

/// Network-level failures. Non-2xx answers are not errors.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("invalid header value for {name}")]
    InvalidHeader { name: &'static str },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Which handler issued the fetch; decides headers and timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Manifest,
    Media,
}

impl FetchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMode::Manifest => "manifest",
            FetchMode::Media => "media",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub mode: FetchMode,
    pub forwarding: Forwarding,
}

impl FetchRequest {
    pub fn manifest(url: impl Into<String>, forwarding: Forwarding) -> Self {
        Self {
            url: url.into(),
            mode: FetchMode::Manifest,
            forwarding,
        }
    }

    pub fn media(url: impl Into<String>, forwarding: Forwarding) -> Self {
        Self {
            url: url.into(),
            mode: FetchMode::Media,
            forwarding,
        }
    }
}

/// What the origin answered, consumed immediately by the calling handler.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl UpstreamResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE)
    }

    pub fn content_length(&self) -> Option<&str> {
        self.header_str(header::CONTENT_LENGTH)
    }

    fn header_str(&self, name: header::HeaderName) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
    }
}

#[async_trait]
pub trait OriginFetch: Send + Sync {
    /// Single GET with no retry. Any received status is returned as `Ok`.
    async fn fetch(&self, request: FetchRequest) -> Result<UpstreamResponse, FetchError>;
}
