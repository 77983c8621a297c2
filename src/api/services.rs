use axum::{
    Json,
    body::{Body, HttpBody},
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
};
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use tracing::{debug, error, info, warn};

use super::{
    error::ProxyError,
    models::{HealthResponse, ProxyQuery},
    state::AppState,
    utils::{content_type_or, proxy_base_url},
    validation::validate_query,
};
use crate::dispatch::{self, ResourceKind};
use crate::fetch::{FetchRequest, UpstreamResponse};
use crate::request::ResolvedLocation;
use crate::rewrite::{MANIFEST_CONTENT_TYPE, RewriteContext, is_manifest, rewrite_manifest};

const OCTET_STREAM: &str = "application/octet-stream";

/// Manifest endpoint (GET /proxy)
///
/// ## Flow:
/// 1. Validate `url`, `ip` and `ua`
/// 2. Media URLs are redirected to `/media` with the same parameters
/// 3. Resolve the origin authority and directory of `url`
/// 4. Fetch from origin as a manifest (10s default timeout)
/// 5. Non-2xx origin answers are forwarded with their status
/// 6. Bodies without `#EXTM3U` are forwarded untouched
/// 7. Otherwise every URI is rewritten to point back through the proxy
pub async fn proxy_manifest(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, ProxyError> {
    let request = validate_query(query, &state.config.limits)?;

    info!(
        url = %request.target_url,
        ip = request.forwarding.ip.as_deref().unwrap_or("not provided"),
        ua = request.forwarding.user_agent.as_deref().unwrap_or("not provided"),
        "Proxying manifest"
    );

    if dispatch::classify(&request.target_url) == ResourceKind::Media {
        let location = dispatch::media_redirect_location(&request);
        debug!(%location, "Detected media file, redirecting to /media");
        state.metrics.media_redirect();
        return Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response());
    }

    let target = request.parsed_target()?;
    let location = ResolvedLocation::from_url(&target)?;
    debug!(
        authority = %location.origin_authority,
        directory = %location.directory_path,
        "Resolved manifest location"
    );

    let upstream = fetch(
        &state,
        FetchRequest::manifest(request.target_url.clone(), request.forwarding.clone()),
    )
    .await?;

    if !upstream.status.is_success() {
        state.metrics.upstream_non_success();
        return forward_origin_error(upstream, "Source server error");
    }

    let UpstreamResponse { headers: origin_headers, body, .. } = upstream;
    let body = read_manifest_body(body, state.config.upstream.max_manifest_bytes).await?;
    debug!(bytes = body.len(), "Received manifest body");

    if !std::str::from_utf8(&body).is_ok_and(is_manifest) {
        warn!(url = %request.target_url, "Response does not appear to be an M3U8 playlist, forwarding as-is");
        state.metrics.manifest_passed_through();
        let content_type = origin_headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        return Ok((
            [(header::CONTENT_TYPE, content_type_or(content_type, OCTET_STREAM))],
            body,
        )
            .into_response());
    }
    let text = std::str::from_utf8(&body).unwrap_or_default();

    let base_url = proxy_base_url(&headers, &uri, &state.config.server);
    let ctx = RewriteContext::new(&base_url, location, request.forwarding);
    let rewritten = rewrite_manifest(text, &ctx);

    info!(
        url = %request.target_url,
        original_bytes = text.len(),
        rewritten_bytes = rewritten.len(),
        "Rewrote manifest"
    );
    state.metrics.manifest_rewritten();

    Ok(([(header::CONTENT_TYPE, MANIFEST_CONTENT_TYPE)], rewritten).into_response())
}

/// Media endpoint (GET /media)
///
/// Streams segments, keys and subtitles from the origin byte for byte.
/// The origin content type is kept; when absent it is inferred from the
/// URL extension.
pub async fn proxy_media(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> Result<Response, ProxyError> {
    let request = validate_query(query, &state.config.limits)?;
    let target = request.parsed_target()?;

    info!(url = %request.target_url, "Proxying media");

    let upstream = fetch(
        &state,
        FetchRequest::media(request.target_url.clone(), request.forwarding.clone()),
    )
    .await?;

    if !upstream.status.is_success() {
        state.metrics.upstream_non_success();
        return forward_origin_error(upstream, "Media source error");
    }

    let content_type = content_type_or(upstream.content_type(), dispatch::infer_content_type(&target));
    let content_length = upstream
        .content_length()
        .and_then(|value| HeaderValue::from_str(value).ok());
    debug!(content_type = ?content_type, content_length = ?content_length, "Streaming media");

    let response = stream_response(upstream.status, content_type, content_length, upstream.body)?;

    state.metrics.media_served();
    Ok(response)
}

/// Usage page (GET /)
pub async fn index() -> Html<&'static str> {
    Html(
        r#"<html>
  <head><title>M3U8 Proxy</title></head>
  <body>
    <h1>M3U8 Proxy Server</h1>
    <p>Server is running! Use the /proxy endpoint to proxy m3u8 playlists.</p>
    <p>Usage: <code>/proxy?url=https://example.com/playlist.m3u8&amp;ip=optional-ip&amp;ua=optional-user-agent</code></p>
  </body>
</html>
"#,
    )
}

/// Health check endpoint (GET /health)
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        counters: state.metrics.snapshot(),
    };

    (StatusCode::OK, Json(response))
}

/// Single origin fetch; network failures are logged and counted here.
async fn fetch(state: &AppState, request: FetchRequest) -> Result<UpstreamResponse, ProxyError> {
    let url = request.url.clone();
    let mode = request.mode;

    state.fetcher.fetch(request).await.map_err(|e| {
        error!(%url, mode = mode.as_str(), error = %e, "Origin fetch failed");
        state.metrics.upstream_failure();
        ProxyError::from(e)
    })
}

/// Reads a manifest body, refusing anything over `limit` bytes.
async fn read_manifest_body(body: Body, limit: usize) -> Result<Bytes, ProxyError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ProxyError::ManifestTooLarge { limit })
        }
        Err(err) => Err(ProxyError::UpstreamUnreachable(format!(
            "failed to read manifest body: {err}"
        ))),
    }
}

/// Forwards a non-2xx origin answer with its status, content type and body.
///
/// The body is streamed as is. Only an origin that declares an empty body
/// gets `"{prefix}: {reason}"` instead.
fn forward_origin_error(upstream: UpstreamResponse, prefix: &str) -> Result<Response, ProxyError> {
    let declared_empty =
        upstream.content_length().map(str::trim) == Some("0") || upstream.body.is_end_stream();
    warn!(status = upstream.status.as_u16(), declared_empty, "Forwarding origin error status");

    if declared_empty {
        let reason = upstream.status.canonical_reason().unwrap_or("Unknown");
        return Ok((upstream.status, format!("{prefix}: {reason}")).into_response());
    }

    let content_type = content_type_or(upstream.content_type(), OCTET_STREAM);
    let content_length = upstream
        .content_length()
        .and_then(|value| HeaderValue::from_str(value).ok());

    stream_response(upstream.status, content_type, content_length, upstream.body)
}

/// Streams an origin body back with the given status and entity headers.
fn stream_response(
    status: StatusCode,
    content_type: HeaderValue,
    content_length: Option<HeaderValue>,
    body: Body,
) -> Result<Response, ProxyError> {
    let mut response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type);
    if let Some(length) = content_length {
        response = response.header(header::CONTENT_LENGTH, length);
    }

    response
        .body(body)
        .map_err(|e| ProxyError::Internal(format!("failed to build response: {e}")))
}
