//! reqwest-backed origin fetcher

use async_trait::async_trait;
use axum::body::Body;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::{FetchError, FetchMode, FetchRequest, OriginFetch, UpstreamResponse};
use super::headers::build_origin_headers;

/// Fetcher configuration
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub manifest_timeout: Duration,
    pub media_timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            manifest_timeout: Duration::from_secs(10),
            media_timeout: Duration::from_secs(30),
            max_redirects: 5,
            user_agent: super::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetcherConfig {
    pub fn timeout_for(&self, mode: FetchMode) -> Duration {
        match mode {
            FetchMode::Manifest => self.manifest_timeout,
            FetchMode::Media => self.media_timeout,
        }
    }
}

/// Origin fetcher over a shared reqwest client
pub struct HttpOriginFetcher {
    client: Client,
    config: FetcherConfig,
}

impl HttpOriginFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl OriginFetch for HttpOriginFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<UpstreamResponse, FetchError> {
        let headers = build_origin_headers(request.mode, &request.forwarding, &self.config.user_agent)?;
        let timeout = self.config.timeout_for(request.mode);

        debug!(url = %request.url, mode = request.mode.as_str(), ?timeout, "Fetching from origin");

        let response = self
            .client
            .get(&request.url)
            .headers(headers)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                let url = request.url.clone();
                if e.is_timeout() {
                    FetchError::Timeout { url }
                } else if e.is_connect() {
                    FetchError::Connect { url, reason: e.to_string() }
                } else {
                    FetchError::RequestFailed { url, reason: e.to_string() }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %request.url, status = status.as_u16(), "Origin returned non-success status");
        }

        let headers = response.headers().clone();
        let body = Body::from_stream(response.bytes_stream());

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}
