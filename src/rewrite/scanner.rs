//! Line scanners for the two substitution passes.
//!
//! Both passes are line-local: absolute URLs end at whitespace (which
//! includes line breaks) and relative URIs are whole-line tokens.

use super::RewriteContext;

/// Extensions that mark a bare URI line as something the proxy must route.
const URI_EXTENSIONS: [&str; 7] = ["m3u8", "ts", "key", "aac", "mp4", "m4s", "vtt"];

fn is_url_terminator(c: char) -> bool {
    c.is_whitespace() || c == '"'
}

/// Byte range of the next `http://` / `https://` token in `text`.
fn next_absolute_url(text: &str) -> Option<(usize, usize)> {
    let mut offset = 0;

    while let Some(pos) = text[offset..].find("http") {
        let start = offset + pos;
        let after = &text[start + 4..];
        let scheme_len = if after.starts_with("://") {
            7
        } else if after.starts_with("s://") {
            8
        } else {
            offset = start + 4;
            continue;
        };

        let body = &text[start + scheme_len..];
        let len = body.find(is_url_terminator).unwrap_or(body.len());
        if len > 0 {
            return Some((start, start + scheme_len + len));
        }
        offset = start + scheme_len;
    }

    None
}

/// First pass: wrap every absolute URL not already pointing at the proxy.
pub(super) fn rewrite_absolute(line: &str, ctx: &RewriteContext) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some((start, end)) = next_absolute_url(rest) {
        let url = &rest[start..end];
        out.push_str(&rest[..start]);
        if ctx.is_proxy_link(url) {
            out.push_str(url);
        } else {
            out.push_str(&ctx.link_for(url));
        }
        rest = &rest[end..];
    }

    out.push_str(rest);
    out
}

/// Second pass: resolve and wrap a bare relative URI at the start of the line.
///
/// Directive and comment lines are left alone. The token stops at `:`, a quote
/// or whitespace, so links produced by the first pass never qualify.
pub(super) fn rewrite_relative(line: String, ctx: &RewriteContext) -> String {
    let body = line.trim_start();
    if body.is_empty() || body.starts_with('#') {
        return line;
    }

    let indent = line.len() - body.len();
    let token_len = body
        .find(|c: char| c == ':' || is_url_terminator(c))
        .unwrap_or(body.len());
    let token = &body[..token_len];

    if !has_routable_extension(token) {
        return line;
    }

    let absolute = ctx.location.resolve(token);
    let mut out = String::with_capacity(line.len() + absolute.len() * 2);
    out.push_str(&line[..indent]);
    out.push_str(&ctx.link_for(&absolute));
    out.push_str(&body[token_len..]);
    out
}

/// Checks the path part of a URI token (query and fragment excluded).
fn has_routable_extension(token: &str) -> bool {
    let path = token.split(['?', '#']).next().unwrap_or_default();

    URI_EXTENSIONS.iter().any(|ext| {
        path.len() > ext.len() + 1
            && path.is_char_boundary(path.len() - ext.len() - 1)
            && path[path.len() - ext.len() - 1..].eq_ignore_ascii_case(&format!(".{ext}"))
    })
}
