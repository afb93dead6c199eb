// src/pages/mod.rs
// =============================================================================
// The pages we crawl and where they come from.
//
// Two collaborators live behind traits so the crawler doesn't care what
// system owns the content:
// - PageSource: answers "how many pages match?" and "give me pages N..M"
// - Renderer: turns one page into markup
//
// Bundled implementations:
// - ManifestPageSource: a JSON list of pages (manifest.rs)
// - HttpRenderer / FileRenderer: live site or static build output (render.rs)
// =============================================================================

mod manifest;
mod query;
mod render;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CrawlResult;

pub use manifest::ManifestPageSource;
pub use query::PageQuery;
pub use render::build_renderer;

fn default_status() -> String {
    "published".to_string()
}

fn default_viewable() -> bool {
    true
}

/// A content page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    /// Site-relative URL ("/contact/") or absolute URL
    pub url: String,
    #[serde(default)]
    pub template: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub parent: i64,
    #[serde(default = "default_viewable")]
    pub viewable: bool,
}

impl Page {
    pub fn new(id: i64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            template: String::new(),
            status: default_status(),
            parent: 0,
            viewable: true,
        }
    }
}

#[async_trait]
pub trait PageSource: Send + Sync {
    /// Number of pages matching `query` (ignoring its start/limit window)
    async fn count_pages(&self, query: &PageQuery) -> CrawlResult<usize>;

    /// Matching pages `offset..offset + limit`, in a stable order
    async fn find_pages(
        &self,
        query: &PageQuery,
        offset: usize,
        limit: usize,
    ) -> CrawlResult<Vec<Page>>;
}

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Markup of `page`; failures are `CrawlError::Render`
    async fn render(&self, page: &Page) -> CrawlResult<String>;
}
