//! Manifest rewriting engine.
//!
//! Rewriting is a pure function of the manifest text and a [`RewriteContext`].
//! Every URI it can recognise is turned into an absolute link back through the
//! proxy's `/proxy` route, carrying the forwarding parameters along:
//!
//! 1. absolute `http(s)://` URLs anywhere in a line, including inside
//!    directive attributes such as `URI="..."`;
//! 2. bare relative or site-relative URI lines ending in a playlist or
//!    media extension.
//!
//! The absolute pass always runs first on a line so the relative pass never
//! sees an unwrapped absolute URL. Text that matches neither pass is copied
//! through unchanged; malformed input never produces an error.

mod scanner;

use crate::dispatch::PROXY_ROUTE;
use crate::request::{Forwarding, ResolvedLocation, proxied_link};

/// Marker every HLS playlist starts with.
pub const MANIFEST_MARKER: &str = "#EXTM3U";

/// Content type served for rewritten manifests.
pub const MANIFEST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Everything the engine needs to rewrite one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteContext {
    /// `scheme://host[:port]` of the proxy itself, without trailing slash.
    pub proxy_base_url: String,
    pub location: ResolvedLocation,
    pub forwarding: Forwarding,
}

impl RewriteContext {
    pub fn new(proxy_base_url: &str, location: ResolvedLocation, forwarding: Forwarding) -> Self {
        Self {
            proxy_base_url: proxy_base_url.trim_end_matches('/').to_string(),
            location,
            forwarding,
        }
    }

    /// True when `url` already targets the proxy's own authority.
    fn is_proxy_link(&self, url: &str) -> bool {
        url.strip_prefix(&self.proxy_base_url)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?', '#']))
    }

    fn link_for(&self, target: &str) -> String {
        proxied_link(&self.proxy_base_url, PROXY_ROUTE, target, &self.forwarding)
    }
}

pub fn is_manifest(text: &str) -> bool {
    text.contains(MANIFEST_MARKER)
}

/// Rewrites every recognisable URI in `manifest`. Line terminators are kept.
pub fn rewrite_manifest(manifest: &str, ctx: &RewriteContext) -> String {
    let mut out = String::with_capacity(manifest.len() * 2);

    for raw in manifest.split_inclusive('\n') {
        let (line, terminator) = split_terminator(raw);
        let line = scanner::rewrite_absolute(line, ctx);
        let line = scanner::rewrite_relative(line, ctx);
        out.push_str(&line);
        out.push_str(terminator);
    }

    out
}

fn split_terminator(raw: &str) -> (&str, &str) {
    let content = raw
        .strip_suffix("\r\n")
        .or_else(|| raw.strip_suffix('\n'))
        .unwrap_or(raw);
    raw.split_at(content.len())
}
