// src/checker/normalize.rs
// =============================================================================
// Turns a raw link candidate, as found in page markup, into a URL string the
// checkability filter can reason about.
//
// Rules, in order:
// 1. A candidate with a scheme other than http/https is rejected right away
//    ("unsupported scheme: mailto" etc.)
// 2. Absolute (`http://..`), scheme-relative (`//host/..`) and root-relative
//    (`/path`) candidates are kept as they are; anything else is resolved
//    against the page URL (`about` on `/contact/` -> `/contact/about`)
// 3. `.` and `..` path segments are collapsed, leaving the query and
//    fragment untouched
//
// Normalizing never fails. Whether the result is worth a request is decided
// later by the checkability filter.
// =============================================================================

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use super::checkable::CheckableValue;

/// Leading `scheme:` of a URI (RFC 3986 section 3.1)
static SCHEME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*):").unwrap());

/// Normalize `candidate` found on the page whose URL is `page_url`
pub fn normalize_url(candidate: &str, page_url: &str) -> CheckableValue {
    let candidate = candidate.trim();
    let value = CheckableValue::new(candidate);

    let scheme = SCHEME_REGEX
        .captures(candidate)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());

    if let Some(scheme) = scheme {
        if !scheme.eq_ignore_ascii_case("http") && !scheme.eq_ignore_ascii_case("https") {
            let scheme = scheme.to_ascii_lowercase();
            return value.skip(format!("unsupported scheme: {}", scheme));
        }
    }

    let resolved = if scheme.is_some() || candidate.starts_with('/') {
        candidate.to_string()
    } else {
        resolve_against_page(candidate, page_url)
    };

    CheckableValue {
        value: collapse_dot_segments(&resolved),
        ..value
    }
    .accept()
}

/// Split `url` into its "scheme://authority" (or "//authority") prefix and
/// everything after it. Paths without an authority get an empty prefix.
pub fn split_authority(url: &str) -> (&str, &str) {
    let after_scheme = match url.find("://") {
        Some(pos) if SCHEME_REGEX.is_match(url) => pos + 3,
        _ if url.starts_with("//") => 2,
        _ => return ("", url),
    };
    let end = url[after_scheme..]
        .find(['/', '?', '#'])
        .map(|i| after_scheme + i)
        .unwrap_or(url.len());
    url.split_at(end)
}

/// Split "path?query#fragment" into the path and the "?query#fragment" suffix
fn split_suffix(rest: &str) -> (&str, &str) {
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    rest.split_at(end)
}

fn resolve_against_page(candidate: &str, page_url: &str) -> String {
    let (prefix, rest) = split_authority(page_url);

    if candidate.is_empty() {
        return page_url.to_string();
    }
    if candidate.starts_with('#') {
        let without_fragment = page_url.split('#').next().unwrap_or(page_url);
        return format!("{}{}", without_fragment, candidate);
    }
    if candidate.starts_with('?') {
        let (path, _) = split_suffix(rest);
        return format!("{}{}{}", prefix, path, candidate);
    }

    let (path, _) = split_suffix(rest);
    let directory = match path.rfind('/') {
        Some(pos) => &path[..=pos],
        None => "/",
    };
    format!("{}{}{}", prefix, directory, candidate)
}

/// Collapse `.` and `..` segments in the path part of `url`
pub fn collapse_dot_segments(url: &str) -> String {
    let (prefix, rest) = split_authority(url);
    let (path, suffix) = split_suffix(rest);

    if !path.split('/').any(|segment| segment == "." || segment == "..") {
        return url.to_string();
    }

    format!("{}{}{}", prefix, remove_dot_segments(path), suffix)
}

fn remove_dot_segments(path: &str) -> String {
    let rooted = path.starts_with('/');
    let relative = path.strip_prefix('/').unwrap_or(path);

    let segments: Vec<&str> = relative.split('/').collect();
    let last = segments.len() - 1;
    let mut output: Vec<&str> = Vec::with_capacity(segments.len());
    let mut trailing_slash = false;

    for (i, segment) in segments.into_iter().enumerate() {
        match segment {
            "." => trailing_slash = i == last,
            ".." => {
                output.pop();
                trailing_slash = i == last;
            }
            other => {
                output.push(other);
                trailing_slash = false;
            }
        }
    }

    let mut result = String::with_capacity(path.len());
    if rooted {
        result.push('/');
    }
    result.push_str(&output.join("/"));
    if trailing_slash && !output.is_empty() {
        result.push('/');
    }
    result
}

/// Prefix a local path with the configured host ("https://example.com/")
pub fn prefix_host(host: &str, path: &str) -> String {
    format!(
        "{}/{}",
        host.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Does `url` start with http:// or https:// (any case)?
pub fn is_http_url(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Rewrite a `#!state` fragment into an `_escaped_fragment_=state` query
/// parameter (AJAX crawling scheme); plain fragments are dropped since they
/// never reach the server anyway.
pub fn expand_fragment(url: &str) -> String {
    let Some((base, fragment)) = url.split_once('#') else {
        return url.to_string();
    };
    match fragment.strip_prefix('!') {
        Some(state) => {
            let separator = if base.contains('?') { '&' } else { '?' };
            format!(
                "{}{}_escaped_fragment_={}",
                base,
                separator,
                urlencoding::encode(state)
            )
        }
        None => base.to_string(),
    }
}

/// Generic URI syntax check for an absolute http(s) URL
///
/// The url crate follows the WHATWG parser, so hostnames with hyphens
/// (`my-site.example`, `a--b.example`) pass, unlike some older validators.
pub fn is_valid_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|host| !host.is_empty())
                && !url.chars().any(char::is_whitespace)
        }
        Err(_) => false,
    }
}
