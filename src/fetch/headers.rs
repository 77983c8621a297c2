use axum::http::{HeaderMap, HeaderName, HeaderValue, header};

use super::{FetchError, FetchMode};
use crate::request::Forwarding;

/// Desktop browser user agent presented when the client supplies none.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36";

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Outbound header set for an origin fetch.
///
/// Manifest fetches send `Accept-Language`; media fetches send
/// `Accept-Encoding: identity` instead so segment bytes arrive uncompressed.
pub fn build_origin_headers(
    mode: FetchMode,
    forwarding: &Forwarding,
    default_user_agent: &str,
) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::new();

    if let Some(ip) = &forwarding.ip {
        let value = HeaderValue::from_str(ip).map_err(|_| FetchError::InvalidHeader {
            name: "X-Forwarded-For",
        })?;
        headers.insert(X_FORWARDED_FOR, value);
    }

    let user_agent = forwarding.user_agent.as_deref().unwrap_or(default_user_agent);
    let value = HeaderValue::from_str(user_agent).map_err(|_| FetchError::InvalidHeader {
        name: "User-Agent",
    })?;
    headers.insert(header::USER_AGENT, value);

    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    match mode {
        FetchMode::Manifest => {
            headers.insert(
                header::ACCEPT_LANGUAGE,
                HeaderValue::from_static("en-US,en;q=0.9"),
            );
        }
        FetchMode::Media => {
            headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        }
    }
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

    Ok(headers)
}
