// src/crawl/settings.rs
// =============================================================================
// Everything the crawler needs from the config, checked and compiled up front.
//
// Building CrawlSettings is the INIT step of a run: a bad pattern, selector
// or unknown request method fails here, before the database or the log file
// is touched.
// =============================================================================

use crate::checker::{DelimitedRegex, RequestMethod};
use crate::config::CrawlerConfig;
use crate::error::CrawlResult;
use crate::pages::PageQuery;

#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub config: CrawlerConfig,
    pub link_regex: DelimitedRegex,
    pub skip_regexes: Vec<DelimitedRegex>,
    pub query: PageQuery,
    pub max_age: chrono::Duration,
    pub method: RequestMethod,
}

impl CrawlSettings {
    pub fn new(mut config: CrawlerConfig) -> CrawlResult<Self> {
        config.validate()?;

        let link_regex = DelimitedRegex::parse(&config.link_regex)?;
        let skip_regexes = config
            .skip_link_regex
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| DelimitedRegex::parse(p))
            .collect::<CrawlResult<Vec<_>>>()?;
        let query: PageQuery = config.selector.parse()?;
        let max_age = config.max_age()?;
        let method = config.http_request_method.parse()?;

        Ok(Self {
            config,
            link_regex,
            skip_regexes,
            query,
            max_age,
            method,
        })
    }

    pub fn http_host(&self) -> Option<&str> {
        self.config.http_host.as_deref()
    }

    pub fn matches_skip_regex(&self, url: &str) -> bool {
        self.skip_regexes.iter().any(|r| r.is_match(url))
    }
}
