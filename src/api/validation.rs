use axum::http::HeaderValue;

use super::error::ProxyError;
use super::models::ProxyQuery;
use crate::config::LimitsConfig;
use crate::request::ProxyRequest;

/// Turns raw query parameters into a [`ProxyRequest`].
///
/// `ip` and `ua` end up in outbound headers, so they must be valid header
/// values and within the configured lengths.
pub fn validate_query(query: ProxyQuery, limits: &LimitsConfig) -> Result<ProxyRequest, ProxyError> {
    let request = ProxyRequest::new(query.url, query.ip, query.ua)?;

    if request.target_url.len() > limits.max_url_len {
        return Err(ProxyError::InvalidUrl(format!(
            "URL exceeds {} bytes",
            limits.max_url_len
        )));
    }

    if let Some(ip) = &request.forwarding.ip {
        check_header_param("ip", ip, limits.max_ip_len)?;
    }
    if let Some(ua) = &request.forwarding.user_agent {
        check_header_param("ua", ua, limits.max_user_agent_len)?;
    }

    Ok(request)
}

fn check_header_param(name: &'static str, value: &str, max_len: usize) -> Result<(), ProxyError> {
    if value.len() > max_len {
        return Err(ProxyError::InvalidParameter {
            name,
            reason: format!("exceeds {max_len} bytes"),
        });
    }

    if HeaderValue::from_str(value).is_err() {
        return Err(ProxyError::InvalidParameter {
            name,
            reason: "not a valid header value".to_string(),
        });
    }

    Ok(())
}
