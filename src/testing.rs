// src/testing.rs
// =============================================================================
// In-process stand-ins for the network and the render source, shared by
// the unit tests of several modules.
// =============================================================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::checker::{HeaderFetch, HeaderResult};
use crate::config::CrawlerConfig;
use crate::crawl::{CrawlSettings, Crawler};
use crate::error::{CrawlError, CrawlResult};
use crate::pages::{Page, Renderer};
use crate::storage::SqliteStore;

#[derive(Default)]
struct FakeState {
    responses: HashMap<String, HeaderResult>,
    calls: Vec<String>,
}

/// Scripted header responses. Unknown URLs fail like an unreachable host.
///
/// Clones share state, so a test can keep one handle after boxing another
/// into a crawler.
#[derive(Clone, Default)]
pub struct FakeFetch {
    state: Arc<Mutex<FakeState>>,
}

impl FakeFetch {
    pub fn with(self, url: &str, status: Option<u16>, location: Option<&str>) -> Self {
        self.state.lock().unwrap().responses.insert(
            url.to_string(),
            HeaderResult {
                status,
                location: location.map(str::to_string),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl HeaderFetch for FakeFetch {
    async fn get_headers(&mut self, url: &str) -> HeaderResult {
        let mut state = self.state.lock().unwrap();
        state.calls.push(url.to_string());
        state.responses.get(url).cloned().unwrap_or_default()
    }
}

/// Fixed markup per page URL; pages without markup fail to render
#[derive(Default)]
pub struct StubRenderer {
    markup: HashMap<String, String>,
}

impl StubRenderer {
    pub fn with(mut self, page_url: &str, html: &str) -> Self {
        self.markup.insert(page_url.to_string(), html.to_string());
        self
    }
}

#[async_trait]
impl Renderer for StubRenderer {
    async fn render(&self, page: &Page) -> CrawlResult<String> {
        self.markup
            .get(&page.url)
            .cloned()
            .ok_or_else(|| CrawlError::render(&page.url, "no markup"))
    }
}

/// Crawler over an in-memory database, without request throttling
pub async fn test_crawler(config: CrawlerConfig, fetch: FakeFetch) -> Crawler<SqliteStore> {
    let config = CrawlerConfig {
        sleep_between_requests: 0.0,
        ..config
    };
    let settings = CrawlSettings::new(config).unwrap();
    let store = SqliteStore::open_in_memory().await.unwrap();
    Crawler::with_fetcher(settings, store, Box::new(fetch))
}
