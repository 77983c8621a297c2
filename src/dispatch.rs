//! Routing of proxied resources between manifest rewriting and media passthrough.

use url::Url;

use crate::request::{ProxyRequest, proxied_link};

/// Route that serves binary passthrough.
pub const MEDIA_ROUTE: &str = "/media";
/// Route that serves (and rewrites) manifests.
pub const PROXY_ROUTE: &str = "/proxy";

const MEDIA_EXTENSIONS: [&str; 6] = ["ts", "key", "aac", "mp4", "m4s", "vtt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Terminal binary resource, never rewritten.
    Media,
    /// Anything else; only rewritten if the body turns out to be a manifest.
    ManifestCandidate,
}

/// Pure string classification, no content probing.
///
/// A URL is media when `.ts`, `.key`, `.aac`, `.mp4`, `.m4s` or `.vtt`
/// (any case) is followed by the end of the string or a `?`.
pub fn classify(target_url: &str) -> ResourceKind {
    let lowered = target_url.to_ascii_lowercase();

    let is_media = MEDIA_EXTENSIONS.iter().any(|ext| {
        let suffix = format!(".{ext}");
        lowered.ends_with(&suffix) || lowered.contains(&format!("{suffix}?"))
    });

    if is_media {
        ResourceKind::Media
    } else {
        ResourceKind::ManifestCandidate
    }
}

/// Relative `Location` for redirecting a media URL from `/proxy` to `/media`.
pub fn media_redirect_location(request: &ProxyRequest) -> String {
    proxied_link("", MEDIA_ROUTE, &request.target_url, &request.forwarding)
}

/// Content type for a media response whose origin sent none.
pub fn infer_content_type(target: &Url) -> &'static str {
    let path = target.path();
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.contains('/'))
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "ts" => "video/mp2t",
        "m4s" => "video/iso.segment",
        "mp4" => "video/mp4",
        "aac" => "audio/aac",
        "vtt" => "text/vtt",
        _ => "application/octet-stream",
    }
}
