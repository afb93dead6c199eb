// src/checker/pattern.rs
// =============================================================================
// Delimited regular expressions, as written in the config file.
//
// Patterns look like `/(?:href|src)="([^"]*)"/i`: the first character is the
// delimiter, trailing letters are flags. Bracket-style delimiters close with
// their partner, so `{a+}i` is also valid.
//
// Supported flags:
//   i - case-insensitive      m - ^/$ match at line breaks
//   s - '.' matches newlines  x - ignore whitespace, allow comments
//   U - swap greediness
// =============================================================================

use regex::{Captures, Regex, RegexBuilder};

use crate::error::{CrawlError, CrawlResult};

/// A compiled delimited pattern
#[derive(Debug, Clone)]
pub struct DelimitedRegex {
    source: String,
    regex: Regex,
}

impl DelimitedRegex {
    pub fn parse(source: &str) -> CrawlResult<Self> {
        let invalid = |reason: &str| CrawlError::InvalidPattern {
            pattern: source.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = source.trim();
        let mut chars = trimmed.chars();
        let open = chars.next().ok_or_else(|| invalid("pattern is empty"))?;
        if open.is_alphanumeric() || open.is_whitespace() || open == '\\' {
            return Err(invalid("pattern must start with a delimiter"));
        }
        let close = match open {
            '(' => ')',
            '{' => '}',
            '[' => ']',
            '<' => '>',
            other => other,
        };

        let body_and_flags = &trimmed[open.len_utf8()..];
        let end = body_and_flags
            .rfind(close)
            .ok_or_else(|| invalid("missing closing delimiter"))?;
        let body = &body_and_flags[..end];
        let flags = &body_and_flags[end + close.len_utf8()..];

        let mut builder = RegexBuilder::new(body);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                'U' => builder.swap_greed(true),
                other => return Err(invalid(&format!("unknown flag '{}'", other))),
            };
        }

        let regex = builder.build().map_err(|e| invalid(&e.to_string()))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The pattern as written in the config
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }

    /// Every URL captured in `haystack`, in document order
    ///
    /// The captured value is the named group `url` if the pattern has one,
    /// otherwise the last group that took part in the match.
    pub fn captures<'h>(&self, haystack: &'h str) -> Vec<&'h str> {
        self.regex
            .captures_iter(haystack)
            .filter_map(|caps| self.pick(&caps))
            .collect()
    }

    fn pick<'h>(&self, caps: &Captures<'h>) -> Option<&'h str> {
        if let Some(url) = caps.name("url") {
            return Some(url.as_str());
        }
        (1..caps.len())
            .rev()
            .find_map(|i| caps.get(i))
            .map(|m| m.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LINK_REGEX;

    #[test]
    fn test_default_pattern_captures_both_quote_styles() {
        let pattern = DelimitedRegex::parse(DEFAULT_LINK_REGEX).unwrap();
        let html = r##"<a HREF="/docs">x</a><img src='https://cdn.example.com/a.png'><a href="#top">"##;
        assert_eq!(
            pattern.captures(html),
            vec!["/docs", "https://cdn.example.com/a.png"]
        );
    }

    #[test]
    fn test_named_group_wins() {
        let pattern = DelimitedRegex::parse(r#"#(['"])(?P<url>[^'"]+)(['"])#"#).unwrap();
        assert_eq!(pattern.captures(r#"x="/a" y='/b'"#), vec!["/a", "/b"]);
    }

    #[test]
    fn test_bracket_delimiters_and_flags() {
        let pattern = DelimitedRegex::parse("{^foo.bar$}ms").unwrap();
        assert!(pattern.is_match("x\nfoo\nbar"));
        assert_eq!(pattern.source(), "{^foo.bar$}ms");
    }

    #[test]
    fn test_rejects_bad_patterns() {
        assert!(DelimitedRegex::parse("").is_err());
        assert!(DelimitedRegex::parse("abc").is_err());
        assert!(DelimitedRegex::parse("/abc").is_err());
        assert!(DelimitedRegex::parse("/abc/q").is_err());
        assert!(DelimitedRegex::parse("/(unclosed/").is_err());
    }
}
