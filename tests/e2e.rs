//! End-to-end tests for m3u8proxy
//!
//! These tests verify the complete request chain over real sockets:
//! 1. A mock origin serves a master playlist, a media playlist, a key and segments
//! 2. The proxy is served with the reqwest-backed origin fetcher
//! 3. A client follows rewritten links from manifest to segment bytes
//! 4. Forwarded headers reach the origin on every hop

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use m3u8proxy::api;
use m3u8proxy::config::Config;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

const SEGMENT_BYTES: &[u8] = &[0x47, 0x40, 0x11, 0x10, 0x00, 0x42, 0xf0, 0x25];

/// Headers the mock origin saw, per path
type SeenHeaders = Arc<Mutex<Vec<(String, HeaderMap)>>>;

async fn origin_handler(
    State(seen): State<SeenHeaders>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let path = uri.path().to_string();

    if path == "/slow.m3u8" {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }

    let response = match path.as_str() {
        "/live/master.m3u8" => (
            [(header::CONTENT_TYPE, "application/x-mpegURL")],
            "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=800000\nlow/index.m3u8\n",
        )
            .into_response(),
        "/live/low/index.m3u8" => "#EXTM3U\n#EXT-X-TARGETDURATION:4\n#EXT-X-KEY:METHOD=AES-128,URI=\"/keys/k1.key\"\n#EXTINF:4,\nseg1.ts\n#EXT-X-ENDLIST\n"
            .into_response(),
        "/live/low/seg1.ts" => SEGMENT_BYTES.into_response(),
        "/keys/k1.key" => vec![7u8; 16].into_response(),
        "/gone.m3u8" => (StatusCode::GONE, "stream ended").into_response(),
        "/slow.m3u8" => "#EXTM3U\n#EXT-X-ENDLIST\n".into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    };

    seen.lock().unwrap().push((path, headers));
    response
}

async fn start_mock_origin() -> (String, SeenHeaders) {
    let seen: SeenHeaders = Arc::default();
    let app = Router::new()
        .fallback(origin_handler)
        .with_state(seen.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), seen)
}

async fn start_proxy() -> String {
    let mut config = Config::default();
    config.upstream.manifest_timeout_secs = 5;
    config.upstream.media_timeout_secs = 5;

    start_proxy_with(config).await
}

async fn start_proxy_with(config: Config) -> String {
    let state = api::build_state(config).unwrap();
    let app = api::router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        api::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Decoded `url` parameter of a proxied link
fn target_of(link: &str) -> String {
    Url::parse(link)
        .unwrap()
        .query_pairs()
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
        .unwrap()
}

fn proxied_url(proxy: &str, route: &str, target: &str, suffix: &str) -> String {
    format!("{proxy}{route}?url={}{suffix}", urlencoding::encode(target))
}

#[tokio::test]
async fn test_manifest_to_segment_chain() {
    let (origin, seen) = start_mock_origin().await;
    let proxy = start_proxy().await;
    let client = client();
    let forwarding = "&ip=203.0.113.7&ua=E2EPlayer%2F1.0";

    // Master playlist: relative variant becomes a proxied link
    let master = client
        .get(proxied_url(&proxy, "/proxy", &format!("{origin}/live/master.m3u8"), forwarding))
        .send()
        .await
        .unwrap();
    assert_eq!(master.status(), StatusCode::OK);
    assert_eq!(
        master.headers()[header::CONTENT_TYPE],
        "application/vnd.apple.mpegurl"
    );

    let master_text = master.text().await.unwrap();
    let variant_link = master_text.lines().nth(2).unwrap().to_string();
    assert!(variant_link.starts_with(&format!("{proxy}/proxy?url=")));
    assert!(variant_link.ends_with(forwarding));
    assert_eq!(target_of(&variant_link), format!("{origin}/live/low/index.m3u8"));

    // Media playlist: relative segment resolved, relative key URI in a directive left as-is
    let media_text = client
        .get(&variant_link)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let lines: Vec<&str> = media_text.lines().collect();
    assert_eq!(lines[1], "#EXT-X-TARGETDURATION:4");
    assert_eq!(lines[2], "#EXT-X-KEY:METHOD=AES-128,URI=\"/keys/k1.key\"");
    let segment_link = lines[4];
    assert_eq!(target_of(segment_link), format!("{origin}/live/low/seg1.ts"));

    // Segment link goes through /proxy, which redirects to /media
    let redirect = client.get(segment_link).send().await.unwrap();
    assert_eq!(redirect.status(), StatusCode::FOUND);
    let location = redirect.headers()[header::LOCATION].to_str().unwrap().to_string();
    assert!(location.starts_with("/media?url="));
    assert!(location.ends_with(forwarding));

    let segment = client
        .get(format!("{proxy}{location}"))
        .send()
        .await
        .unwrap();
    assert_eq!(segment.status(), StatusCode::OK);
    assert_eq!(segment.headers()[header::CONTENT_TYPE], "application/octet-stream");
    assert_eq!(segment.bytes().await.unwrap().as_ref(), SEGMENT_BYTES);

    let seen = seen.lock().unwrap();
    let paths: Vec<&str> = seen.iter().map(|(path, _)| path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["/live/master.m3u8", "/live/low/index.m3u8", "/live/low/seg1.ts"]
    );

    for (path, headers) in seen.iter() {
        assert_eq!(headers["x-forwarded-for"], "203.0.113.7", "{path}");
        assert_eq!(headers[header::USER_AGENT], "E2EPlayer/1.0", "{path}");
    }

    let (_, manifest_headers) = &seen[0];
    assert_eq!(manifest_headers[header::ACCEPT_LANGUAGE], "en-US,en;q=0.9");
    let (_, segment_headers) = &seen[2];
    assert_eq!(segment_headers[header::ACCEPT_ENCODING], "identity");
}

#[tokio::test]
async fn test_media_route_fetches_key() {
    let (origin, seen) = start_mock_origin().await;
    let proxy = start_proxy().await;

    let response = client()
        .get(proxied_url(&proxy, "/media", &format!("{origin}/keys/k1.key"), ""))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "16");
    assert_eq!(response.bytes().await.unwrap().as_ref(), &[7u8; 16]);

    let seen = seen.lock().unwrap();
    let (_, headers) = &seen[0];
    assert!(headers.get("x-forwarded-for").is_none());
    assert!(
        headers[header::USER_AGENT]
            .to_str()
            .unwrap()
            .starts_with("Mozilla/5.0")
    );
}

#[tokio::test]
async fn test_origin_status_forwarded() {
    let (origin, _) = start_mock_origin().await;
    let proxy = start_proxy().await;

    let response = client()
        .get(proxied_url(&proxy, "/proxy", &format!("{origin}/gone.m3u8"), ""))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GONE);
    assert_eq!(response.text().await.unwrap(), "stream ended");
}

#[tokio::test]
async fn test_unreachable_origin_reports_500() {
    let proxy = start_proxy().await;

    // Bind then drop to get a port nothing listens on
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let response = client()
        .get(proxied_url(
            &proxy,
            "/proxy",
            &format!("http://127.0.0.1:{port}/live.m3u8"),
            "",
        ))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value =
        serde_json::from_slice(&response.bytes().await.unwrap()).unwrap();
    assert_eq!(body["code"], "UPSTREAM_UNREACHABLE");
}

#[tokio::test]
async fn test_slow_origin_times_out_with_500() {
    let (origin, _) = start_mock_origin().await;
    let mut config = Config::default();
    config.upstream.manifest_timeout_secs = 1;
    let proxy = start_proxy_with(config).await;

    let started = std::time::Instant::now();
    let response = client()
        .get(proxied_url(&proxy, "/proxy", &format!("{origin}/slow.m3u8"), ""))
        .send()
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value =
        serde_json::from_slice(&response.bytes().await.unwrap()).unwrap();
    assert_eq!(body["code"], "UPSTREAM_UNREACHABLE");
    assert!(body["message"].as_str().unwrap().contains("timed out"));
}
