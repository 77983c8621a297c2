use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::fetch::{DEFAULT_USER_AGENT, FetcherConfig};
use crate::observability::DEFAULT_LOG_FILTER;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Fixed base URL for rewritten links; derived from the request when unset
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Honour `X-Forwarded-Proto` when deriving the proxy scheme
    #[serde(default)]
    pub trust_forwarded_proto: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            public_base_url: None,
            trust_forwarded_proto: false,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

/// Origin fetch policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_manifest_timeout_secs")]
    pub manifest_timeout_secs: u64,
    #[serde(default = "default_media_timeout_secs")]
    pub media_timeout_secs: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Largest manifest body that will be buffered for rewriting
    #[serde(default = "default_max_manifest_bytes")]
    pub max_manifest_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            manifest_timeout_secs: default_manifest_timeout_secs(),
            media_timeout_secs: default_media_timeout_secs(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            max_manifest_bytes: default_max_manifest_bytes(),
        }
    }
}

impl UpstreamConfig {
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            manifest_timeout: Duration::from_secs(self.manifest_timeout_secs),
            media_timeout: Duration::from_secs(self.media_timeout_secs),
            max_redirects: self.max_redirects,
            user_agent: self.user_agent.clone(),
        }
    }
}

fn default_manifest_timeout_secs() -> u64 {
    10
}

fn default_media_timeout_secs() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    5
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_max_manifest_bytes() -> usize {
    16 * 1024 * 1024 // 16 MB
}

/// Limits on client-supplied query parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_url_len")]
    pub max_url_len: usize,
    #[serde(default = "default_max_ip_len")]
    pub max_ip_len: usize,
    #[serde(default = "default_max_user_agent_len")]
    pub max_user_agent_len: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_url_len: default_max_url_len(),
            max_ip_len: default_max_ip_len(),
            max_user_agent_len: default_max_user_agent_len(),
        }
    }
}

fn default_max_url_len() -> usize {
    8192
}

fn default_max_ip_len() -> usize {
    64
}

fn default_max_user_agent_len() -> usize {
    1024
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// tracing-subscriber filter directive, used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}
