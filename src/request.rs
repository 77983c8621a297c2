//! Per-request values: the parsed proxy request, its forwarding parameters,
//! and the origin location relative URIs are resolved against.

use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("missing {0} parameter")]
    MissingParameter(&'static str),

    #[error("invalid URL format: {0}")]
    InvalidUrl(String),
}

/// Optional values a client asks the proxy to present to the origin.
///
/// Both are carried on every outbound fetch and re-appended to every
/// rewritten link, so they survive the whole manifest to segment chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forwarding {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl Forwarding {
    /// Empty strings count as absent.
    pub fn new(ip: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip: ip.filter(|value| !value.is_empty()),
            user_agent: user_agent.filter(|value| !value.is_empty()),
        }
    }

    /// Appends `&ip=...&ua=...` for the parameters that are present.
    pub fn append_query(&self, link: &mut String) {
        if let Some(ip) = &self.ip {
            link.push_str("&ip=");
            link.push_str(&urlencoding::encode(ip));
        }
        if let Some(ua) = &self.user_agent {
            link.push_str("&ua=");
            link.push_str(&urlencoding::encode(ua));
        }
    }
}

/// Builds `{base}{route}?url=<target>[&ip=..][&ua=..]`.
///
/// Used both for rewritten manifest links (absolute `base`) and for the
/// `/proxy` to `/media` redirect (empty `base`, relative location).
pub fn proxied_link(base: &str, route: &str, target: &str, forwarding: &Forwarding) -> String {
    let mut link = String::with_capacity(base.len() + route.len() + target.len() * 3 + 8);
    link.push_str(base);
    link.push_str(route);
    link.push_str("?url=");
    link.push_str(&urlencoding::encode(target));
    forwarding.append_query(&mut link);
    link
}

/// A single inbound `/proxy` or `/media` request. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    pub target_url: String,
    pub forwarding: Forwarding,
}

impl ProxyRequest {
    pub fn new(
        target_url: Option<String>,
        ip: Option<String>,
        user_agent: Option<String>,
    ) -> Result<Self, RequestError> {
        let target_url = target_url
            .filter(|value| !value.is_empty())
            .ok_or(RequestError::MissingParameter("url"))?;

        Ok(Self {
            target_url,
            forwarding: Forwarding::new(ip, user_agent),
        })
    }

    /// Parses the target as an absolute http(s) URL.
    pub fn parsed_target(&self) -> Result<Url, RequestError> {
        let url = Url::parse(&self.target_url)
            .map_err(|err| RequestError::InvalidUrl(err.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(RequestError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(RequestError::InvalidUrl("URL has no host".to_string()));
        }

        Ok(url)
    }
}

/// Where a manifest was fetched from, split the way relative URIs need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    /// `scheme://host[:port]`, port only when not the scheme default.
    pub origin_authority: String,
    /// URL path up to and including the last `/`.
    pub directory_path: String,
}

impl ResolvedLocation {
    pub fn from_url(url: &Url) -> Result<Self, RequestError> {
        let host = url
            .host_str()
            .ok_or_else(|| RequestError::InvalidUrl("URL has no host".to_string()))?;

        let origin_authority = match url.port() {
            Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
            None => format!("{}://{}", url.scheme(), host),
        };

        let path = url.path();
        let directory_path = match path.rfind('/') {
            Some(idx) => path[..=idx].to_string(),
            None => "/".to_string(),
        };

        Ok(Self {
            origin_authority,
            directory_path,
        })
    }

    /// Turns a relative or site-relative URI into an absolute one.
    pub fn resolve(&self, reference: &str) -> String {
        if reference.starts_with('/') {
            format!("{}{}", self.origin_authority, reference)
        } else {
            format!(
                "{}{}{}",
                self.origin_authority, self.directory_path, reference
            )
        }
    }
}
