// src/pages/render.rs
// =============================================================================
// Renderers produce the markup links are extracted from.
//
// - HttpRenderer fetches the page from the live site (http_host + page URL)
// - FileRenderer reads static build output: `/contact/` is read from
//   `<content_dir>/contact/index.html`
//
// A render failure only affects one page; the orchestrator logs it and moves
// on.
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::str::FromStr;

use super::{Page, Renderer};
use crate::checker::{is_http_url, prefix_host};
use crate::config::CrawlerConfig;
use crate::error::{CrawlError, CrawlResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMethod {
    Http,
    File,
}

impl FromStr for RenderMethod {
    type Err = CrawlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(RenderMethod::Http),
            "file" => Ok(RenderMethod::File),
            other => Err(CrawlError::Config(format!(
                "unknown render_method '{}' (expected 'http' or 'file')",
                other
            ))),
        }
    }
}

/// Build the renderer selected by `render_method`
pub fn build_renderer(config: &CrawlerConfig) -> CrawlResult<Box<dyn Renderer>> {
    match config.render_method.parse::<RenderMethod>()? {
        RenderMethod::Http => {
            let host = config.http_host.clone().ok_or_else(|| {
                CrawlError::Config("render_method 'http' requires http_host".to_string())
            })?;
            let client = Client::builder()
                .timeout(config.timeout())
                .user_agent(config.user_agent.clone())
                .build()?;
            Ok(Box::new(HttpRenderer::new(client, host)))
        }
        RenderMethod::File => {
            let root = config.content_dir.clone().ok_or_else(|| {
                CrawlError::Config("render_method 'file' requires content_dir".to_string())
            })?;
            Ok(Box::new(FileRenderer::new(root)))
        }
    }
}

pub struct HttpRenderer {
    client: Client,
    host: String,
}

impl HttpRenderer {
    pub fn new(client: Client, host: impl Into<String>) -> Self {
        Self {
            client,
            host: host.into(),
        }
    }

    fn page_url(&self, page: &Page) -> String {
        if is_http_url(&page.url) {
            page.url.clone()
        } else {
            prefix_host(&self.host, &page.url)
        }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, page: &Page) -> CrawlResult<String> {
        let url = self.page_url(page);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CrawlError::render(&page.url, e))?;

        if !response.status().is_success() {
            return Err(CrawlError::render(
                &page.url,
                format!("HTTP {}", response.status()),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| CrawlError::render(&page.url, e))
    }
}

pub struct FileRenderer {
    root: PathBuf,
}

impl FileRenderer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn page_path(&self, page: &Page) -> PathBuf {
        let relative = page.url.split(['?', '#']).next().unwrap_or_default();
        let path = self.root.join(relative.trim_matches('/'));
        if relative.ends_with('/') || relative.is_empty() || path.is_dir() {
            path.join("index.html")
        } else {
            path
        }
    }
}

#[async_trait]
impl Renderer for FileRenderer {
    async fn render(&self, page: &Page) -> CrawlResult<String> {
        let path = self.page_path(page);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| CrawlError::render(&page.url, format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_render_method_is_fatal() {
        let config = CrawlerConfig {
            render_method: "php-cli".to_string(),
            ..Default::default()
        };
        assert!(matches!(build_renderer(&config), Err(CrawlError::Config(_))));
    }

    #[test]
    fn test_http_renderer_needs_host() {
        let config = CrawlerConfig::default();
        assert!(build_renderer(&config).is_err());
    }

    #[tokio::test]
    async fn test_file_renderer_reads_index_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("contact")).unwrap();
        std::fs::write(dir.path().join("contact/index.html"), "<a href='/x'>").unwrap();
        std::fs::write(dir.path().join("index.html"), "home").unwrap();

        let renderer = FileRenderer::new(dir.path());
        assert_eq!(
            renderer.render(&Page::new(2, "/contact/")).await.unwrap(),
            "<a href='/x'>"
        );
        assert_eq!(renderer.render(&Page::new(1, "/")).await.unwrap(), "home");
        assert!(matches!(
            renderer.render(&Page::new(3, "/missing/")).await,
            Err(CrawlError::Render { .. })
        ));
    }

    #[tokio::test]
    async fn test_http_renderer_fetches_page() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/contact/")
            .with_status(200)
            .with_body("<a href=\"/about\">")
            .create_async()
            .await;
        server
            .mock("GET", "/broken/")
            .with_status(500)
            .create_async()
            .await;

        let renderer = HttpRenderer::new(Client::new(), server.url());
        let html = renderer.render(&Page::new(1, "/contact/")).await.unwrap();
        assert_eq!(html, "<a href=\"/about\">");
        assert!(renderer.render(&Page::new(2, "/broken/")).await.is_err());
    }
}
