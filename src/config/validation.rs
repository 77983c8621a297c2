use super::models::Config;
use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Timeout must be positive: {field} = {value}")]
    InvalidTimeout { field: &'static str, value: u64 },

    #[error("Default user agent must be a non-empty header value")]
    InvalidUserAgent,

    #[error("public_base_url '{url}' is invalid: {reason}")]
    InvalidPublicBaseUrl { url: String, reason: String },

    #[error("max_manifest_bytes must be positive")]
    InvalidManifestLimit,

    #[error("Parameter limit must be positive: {field}")]
    InvalidParameterLimit { field: &'static str },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_server(config)?;
    validate_upstream(config)?;
    validate_limits(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<(), ValidationError> {
    let Some(raw) = &config.server.public_base_url else {
        return Ok(());
    };

    let invalid = |reason: &str| ValidationError::InvalidPublicBaseUrl {
        url: raw.clone(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed"));
    }

    Ok(())
}

fn validate_upstream(config: &Config) -> Result<(), ValidationError> {
    let upstream = &config.upstream;

    if upstream.manifest_timeout_secs == 0 {
        return Err(ValidationError::InvalidTimeout {
            field: "manifest_timeout_secs",
            value: upstream.manifest_timeout_secs,
        });
    }
    if upstream.media_timeout_secs == 0 {
        return Err(ValidationError::InvalidTimeout {
            field: "media_timeout_secs",
            value: upstream.media_timeout_secs,
        });
    }

    if upstream.user_agent.trim().is_empty()
        || HeaderValue::from_str(&upstream.user_agent).is_err()
    {
        return Err(ValidationError::InvalidUserAgent);
    }

    if upstream.max_manifest_bytes == 0 {
        return Err(ValidationError::InvalidManifestLimit);
    }

    Ok(())
}

fn validate_limits(config: &Config) -> Result<(), ValidationError> {
    let limits = &config.limits;

    for (field, value) in [
        ("max_url_len", limits.max_url_len),
        ("max_ip_len", limits.max_ip_len),
        ("max_user_agent_len", limits.max_user_agent_len),
    ] {
        if value == 0 {
            return Err(ValidationError::InvalidParameterLimit { field });
        }
    }

    Ok(())
}
