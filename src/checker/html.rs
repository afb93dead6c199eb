// src/checker/html.rs
// =============================================================================
// This module extracts link candidates from rendered page markup.
//
// Extraction is pattern based rather than DOM based: the site owner decides
// what counts as a link (href, src, data-src, srcset...) through the
// configured `link_regex`, and we simply collect every capture.
//
// Candidates are returned raw. Making them absolute is the normalizer's job,
// deciding whether they are worth a request is the filter's job.
// =============================================================================

use std::collections::HashSet;

use super::pattern::DelimitedRegex;

// Extracts all link candidates from markup
//
// Parameters:
//   html: the rendered page markup
//   pattern: compiled link extraction pattern
//
// Returns: unique candidates in the order they first appear
//
// Example:
//   html = "<a href='/docs'>Docs</a> <a href='/docs'>Again</a>"
//   result = ["/docs"]
pub fn extract_html_links(html: &str, pattern: &DelimitedRegex) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for candidate in pattern.captures(html) {
        // Same link twice on a page is one link
        if seen.insert(candidate) {
            links.push(candidate.to_string());
        }
    }

    links
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why a regex and not an HTML parser?
//    - Pages may emit links in attributes no selector list would anticipate
//    - The pattern is configuration, so sites can tune it without a rebuild
//
// 2. Why HashSet<&str> and then to_string()?
//    - The set borrows slices of the markup, so nothing is copied until we
//      know the candidate is new
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LINK_REGEX;

    fn default_pattern() -> DelimitedRegex {
        DelimitedRegex::parse(DEFAULT_LINK_REGEX).unwrap()
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<a href="https://www.rust-lang.org">Rust</a>"#;
        let links = extract_html_links(html, &default_pattern());
        assert_eq!(links, vec!["https://www.rust-lang.org"]);
    }

    #[test]
    fn test_duplicates_are_dropped_in_order() {
        let html = r#"
            <a href="/docs">Docs</a>
            <img src="/logo.png">
            <a href='/docs'>Docs again</a>
        "#;
        let links = extract_html_links(html, &default_pattern());
        assert_eq!(links, vec!["/docs", "/logo.png"]);
    }

    #[test]
    fn test_skip_same_page_anchors() {
        let html = r##"<a href="#top">Top</a><a href="mailto:test@example.com">Email</a>"##;
        let links = extract_html_links(html, &default_pattern());
        // anchors never match; mailto is left for the normalizer to reject
        assert_eq!(links, vec!["mailto:test@example.com"]);
    }

    #[test]
    fn test_custom_pattern() {
        let pattern = DelimitedRegex::parse(r#"~data-href="([^"]+)"~"#).unwrap();
        let html = r#"<div data-href="/lazy"></div><a href="/plain"></a>"#;
        assert_eq!(extract_html_links(html, &pattern), vec!["/lazy"]);
    }
}
