use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;

use super::models::ErrorResponse;
use crate::fetch::FetchError;
use crate::request::RequestError;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("missing {0} parameter")]
    MissingParameter(&'static str),
    #[error("invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("invalid {name} parameter: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("proxy error: {0}")]
    UpstreamUnreachable(String),
    #[error("manifest exceeds {limit} bytes")]
    ManifestTooLarge { limit: usize },
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            ProxyError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ProxyError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamUnreachable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::ManifestTooLarge { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ProxyError::MissingParameter(_) => "MISSING_PARAMETER",
            ProxyError::InvalidUrl(_) => "INVALID_URL",
            ProxyError::InvalidParameter { .. } => "INVALID_PARAMETER",
            ProxyError::UpstreamUnreachable(_) => "UPSTREAM_UNREACHABLE",
            ProxyError::ManifestTooLarge { .. } => "MANIFEST_TOO_LARGE",
            ProxyError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code(),
            message: self.to_string(),
        };

        (status, Json(json!(body))).into_response()
    }
}

impl From<RequestError> for ProxyError {
    fn from(value: RequestError) -> Self {
        match value {
            RequestError::MissingParameter(name) => ProxyError::MissingParameter(name),
            RequestError::InvalidUrl(reason) => ProxyError::InvalidUrl(reason),
        }
    }
}

impl From<FetchError> for ProxyError {
    fn from(value: FetchError) -> Self {
        match value {
            FetchError::InvalidHeader { name } => ProxyError::InvalidParameter {
                name,
                reason: "not a valid header value".to_string(),
            },
            other => ProxyError::UpstreamUnreachable(other.to_string()),
        }
    }
}
