// src/config.rs
// =============================================================================
// Crawler configuration, loaded once at startup from a TOML file.
//
// Every setting is a named, typed field with a default, so a missing file or
// a partial file both produce a usable config. `validate()` must run before
// the crawler touches any state: it is the only place where bad values turn
// into fatal errors.
// =============================================================================

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::{CrawlError, CrawlResult};

/// Default extraction pattern: quoted href/src attribute values that don't
/// start with '#'. The URL is the last capture group that matched.
pub const DEFAULT_LINK_REGEX: &str = r##"/(?:href|src)=(?:"([^"#][^"]*)"|'([^'#][^']*)')/i"##;

/// Where the config is read from when no --config flag is given
pub const DEFAULT_CONFIG_PATH: &str = "link-crawler.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Page selector, e.g. "status!=trash, template!=admin, limit=500"
    pub selector: String,
    /// Delimited link extraction pattern (`/.../flags`)
    pub link_regex: String,
    /// Delimited patterns; matching URLs are never requested
    pub skip_link_regex: Vec<String>,
    /// URLs that are never requested
    pub skipped_links: Vec<String>,
    /// Freshness window, e.g. "1 DAY" or "12 hours"
    pub cache_max_age: String,
    /// Absolute base URL used for local links ("https://example.com/")
    pub http_host: Option<String>,
    /// Path prefix of the admin section
    pub admin_url: String,
    /// Templates whose pages are never checked
    pub admin_templates: Vec<String>,
    pub max_recursion_depth: usize,
    /// Seconds between outbound requests
    pub sleep_between_requests: f64,
    /// Seconds between pages
    pub sleep_between_pages: f64,
    /// Seconds between page batches
    pub sleep_between_batches: f64,
    pub batch_size: usize,
    /// "head" or "get"
    pub http_request_method: String,
    /// Network timeout in seconds
    pub request_timeout: f64,
    pub user_agent: String,
    /// "http" or "file"
    pub render_method: String,
    pub content_dir: Option<String>,
    pub pages_file: String,
    pub database: String,
    pub log_level: u8,
    pub log_on_screen: bool,
    pub log_dir: String,
    /// Previous run logs to keep; 0 truncates the log every run
    pub log_rotation: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            selector: "status!=trash, template!=admin".to_string(),
            link_regex: DEFAULT_LINK_REGEX.to_string(),
            skip_link_regex: Vec::new(),
            skipped_links: Vec::new(),
            cache_max_age: "1 DAY".to_string(),
            http_host: None,
            admin_url: "/admin/".to_string(),
            admin_templates: vec!["admin".to_string()],
            max_recursion_depth: 1,
            sleep_between_requests: 1.0,
            sleep_between_pages: 0.0,
            sleep_between_batches: 0.0,
            batch_size: 100,
            http_request_method: "head".to_string(),
            request_timeout: 10.0,
            user_agent: format!("link-crawler/{}", env!("CARGO_PKG_VERSION")),
            render_method: "http".to_string(),
            content_dir: None,
            pages_file: "pages.json".to_string(),
            database: "link-crawler.sqlite3".to_string(),
            log_level: 1,
            log_on_screen: false,
            log_dir: "logs".to_string(),
            log_rotation: 0,
        }
    }
}

impl CrawlerConfig {
    /// Load config from `path`; a missing file means "all defaults"
    pub fn load(path: impl AsRef<Path>) -> CrawlResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> CrawlResult<Self> {
        let config: CrawlerConfig = toml::from_str(text)?;
        Ok(config)
    }

    /// Check and normalize values. Call once, before any crawling.
    pub fn validate(&mut self) -> CrawlResult<()> {
        if self.link_regex.trim().is_empty() {
            self.link_regex = DEFAULT_LINK_REGEX.to_string();
        }

        if let Some(host) = self.http_host.take() {
            let host = host.trim();
            if !host.is_empty() {
                let parsed = Url::parse(host).map_err(|e| {
                    CrawlError::Config(format!("http_host '{}' is not a URL: {}", host, e))
                })?;
                if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
                    return Err(CrawlError::Config(format!(
                        "http_host '{}' must be an absolute http(s) URL",
                        host
                    )));
                }
                let mut host = host.to_string();
                if !host.ends_with('/') {
                    host.push('/');
                }
                self.http_host = Some(host);
            }
        }

        self.max_age()?;

        if self.batch_size == 0 {
            return Err(CrawlError::Config("batch_size must be greater than 0".to_string()));
        }

        for (name, value) in [
            ("sleep_between_requests", self.sleep_between_requests),
            ("sleep_between_pages", self.sleep_between_pages),
            ("sleep_between_batches", self.sleep_between_batches),
            ("request_timeout", self.request_timeout),
        ] {
            // Rejects negative, NaN and values too large for a Duration
            Duration::try_from_secs_f64(value).map_err(|e| {
                CrawlError::Config(format!(
                    "{} must be a non-negative number of seconds ({})",
                    name, e
                ))
            })?;
        }

        Ok(())
    }

    /// The freshness window as a duration
    pub fn max_age(&self) -> CrawlResult<chrono::Duration> {
        parse_max_age(&self.cache_max_age)
    }

    pub fn request_delay(&self) -> Duration {
        seconds(self.sleep_between_requests)
    }

    pub fn page_delay(&self) -> Duration {
        seconds(self.sleep_between_pages)
    }

    pub fn batch_delay(&self) -> Duration {
        seconds(self.sleep_between_batches)
    }

    pub fn timeout(&self) -> Duration {
        seconds(self.request_timeout)
    }
}

// validate() has already rejected anything that doesn't fit
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

/// Parse an interval like "1 DAY", "30 minutes" or "2 weeks"
pub fn parse_max_age(value: &str) -> CrawlResult<chrono::Duration> {
    let invalid = || CrawlError::Config(format!("invalid cache_max_age '{}'", value));

    let mut parts = value.split_whitespace();
    let amount: i64 = parts
        .next()
        .and_then(|n| n.parse().ok())
        .filter(|n| *n >= 0)
        .ok_or_else(invalid)?;
    let unit = parts.next().ok_or_else(invalid)?.to_ascii_lowercase();
    if parts.next().is_some() {
        return Err(invalid());
    }

    let unit_seconds: i64 = match unit.trim_end_matches('s') {
        "second" | "sec" => 1,
        "minute" | "min" => 60,
        "hour" => 3_600,
        "day" => 86_400,
        "week" => 604_800,
        "month" => 30 * 86_400,
        "year" => 365 * 86_400,
        _ => return Err(invalid()),
    };

    amount
        .checked_mul(unit_seconds)
        .and_then(chrono::Duration::try_seconds)
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = CrawlerConfig::from_toml("").unwrap();
        assert_eq!(config.max_recursion_depth, 1);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.link_regex, DEFAULT_LINK_REGEX);
        assert!(config.http_host.is_none());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = CrawlerConfig::from_toml(
            r#"
            http_host = "https://example.com"
            skipped_links = ["https://example.com/slow"]
            sleep_between_requests = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.skipped_links.len(), 1);
        assert_eq!(config.request_delay(), Duration::from_millis(500));
        assert_eq!(config.admin_url, "/admin/");
    }

    #[test]
    fn test_validate_normalizes_host() {
        let mut config = CrawlerConfig {
            http_host: Some("https://example.com".to_string()),
            ..Default::default()
        };
        config.validate().unwrap();
        assert_eq!(config.http_host.as_deref(), Some("https://example.com/"));
    }

    #[test]
    fn test_validate_rejects_relative_host() {
        let mut config = CrawlerConfig {
            http_host: Some("example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CrawlError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_negative_sleep() {
        let mut config = CrawlerConfig {
            sleep_between_pages: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_sleep_too_large_for_a_duration() {
        for (requests, timeout) in [(1e20, 30.0), (0.0, f64::INFINITY), (f64::NAN, 30.0)] {
            let mut config = CrawlerConfig {
                sleep_between_requests: requests,
                request_timeout: timeout,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(CrawlError::Config(_))),
                "{} / {}",
                requests,
                timeout
            );
        }
    }

    #[test]
    fn test_empty_link_regex_falls_back() {
        let mut config = CrawlerConfig {
            link_regex: "  ".to_string(),
            ..Default::default()
        };
        config.validate().unwrap();
        assert_eq!(config.link_regex, DEFAULT_LINK_REGEX);
    }

    #[test]
    fn test_parse_max_age() {
        assert_eq!(parse_max_age("1 DAY").unwrap(), chrono::Duration::days(1));
        assert_eq!(parse_max_age("12 hours").unwrap(), chrono::Duration::hours(12));
        assert_eq!(parse_max_age("2 Weeks").unwrap(), chrono::Duration::weeks(2));
        assert!(parse_max_age("soon").is_err());
        assert!(parse_max_age("1 fortnight").is_err());
        assert!(parse_max_age("-1 day").is_err());
        assert!(parse_max_age("10000000000000000 seconds").is_err());
    }
}
