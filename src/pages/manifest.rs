// src/pages/manifest.rs
// =============================================================================
// Page source backed by a JSON manifest:
//
//   [
//     { "id": 1, "url": "/", "template": "home" },
//     { "id": 2, "url": "/contact/", "parent": 1, "viewable": true }
//   ]
//
// Pages are matched in manifest order, so batches are stable between calls.
// =============================================================================

use async_trait::async_trait;
use std::path::Path;

use super::{Page, PageQuery, PageSource};
use crate::error::CrawlResult;

#[derive(Debug, Clone, Default)]
pub struct ManifestPageSource {
    pages: Vec<Page>,
}

impl ManifestPageSource {
    pub fn load(path: impl AsRef<Path>) -> CrawlResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let pages: Vec<Page> = serde_json::from_str(&text)?;
        Ok(Self::from_pages(pages))
    }

    pub fn from_pages(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    fn matching<'a>(&'a self, query: &'a PageQuery) -> impl Iterator<Item = &'a Page> + 'a {
        self.pages.iter().filter(move |page| query.matches(page))
    }
}

#[async_trait]
impl PageSource for ManifestPageSource {
    async fn count_pages(&self, query: &PageQuery) -> CrawlResult<usize> {
        Ok(self.matching(query).count())
    }

    async fn find_pages(
        &self,
        query: &PageQuery,
        offset: usize,
        limit: usize,
    ) -> CrawlResult<Vec<Page>> {
        Ok(self.matching(query).skip(offset).take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_and_page_through() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": 1, "url": "/"}},
                {{"id": 2, "url": "/admin/", "template": "admin"}},
                {{"id": 3, "url": "/a/"}},
                {{"id": 4, "url": "/b/", "status": "trash"}},
                {{"id": 5, "url": "/c/", "viewable": false}}
            ]"#
        )
        .unwrap();

        let source = ManifestPageSource::load(file.path()).unwrap();
        let query: PageQuery = "status!=trash, template!=admin".parse().unwrap();

        assert_eq!(source.count_pages(&query).await.unwrap(), 3);
        let ids: Vec<i64> = source
            .find_pages(&query, 1, 5)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![3, 5]);
    }

    #[test]
    fn test_bad_manifest_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"pages": "nope"}}"#).unwrap();
        assert!(ManifestPageSource::load(file.path()).is_err());
    }
}
