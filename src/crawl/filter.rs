// src/crawl/filter.rs
// =============================================================================
// Decides whether a link found on a page gets a network check.
//
// The checks run in a fixed order and the first one that matches wins. Some
// of them have side effects (cache marks, page associations) that happen
// before later checks get a say, so the order is part of the behavior:
//
//  1. evaluated earlier this run        -> "run-time skipped links"
//  2. mark the URL as evaluated
//     (candidates with a non-http scheme stop here)
//  3. admin section                     -> "admin URL"
//  4. the page itself                   -> "link points to current page"
//  5. decode "&amp;"
//  6. expand "#!" fragments, drop plain fragments
//  7. permanent skip list / fresh links -> "found from skipped links"
//  8. skip regexes                      -> "matches skipped links regex"
//  9. "//host" gets "https:", local paths get http_host (once, then the
//     checks start over) or              -> "local URL and no http_host specified"
// 10. URL syntax                        -> "URL didn't pass validation"
// 11. requested earlier this run        -> "already checked"
// 12. checkable
//
// URLs that end up checked (12) or associated with the page (7 with a known
// link, 11) leave the run-time skip set again, so the next page that links
// to them gets its association too.
// =============================================================================

use super::crawler::Crawler;
use crate::checker::{expand_fragment, is_http_url, is_valid_url, prefix_host, CheckableValue};
use crate::error::CrawlResult;
use crate::pages::Page;
use crate::storage::LinkStore;

pub(super) const RUN_TIME_SKIPPED: &str = "run-time skipped links";
const ADMIN_URL: &str = "admin URL";
const CURRENT_PAGE: &str = "link points to current page";
const FOUND_IN_SKIPPED: &str = "found from skipped links";
const MATCHES_SKIP_REGEX: &str = "matches skipped links regex";
const LOCAL_WITHOUT_HOST: &str = "local URL and no http_host specified";
const FAILED_VALIDATION: &str = "URL didn't pass validation";
const ALREADY_CHECKED: &str = "already checked";

fn skipped(url: &str, unique: bool, reason: impl Into<String>) -> CheckableValue {
    CheckableValue {
        unique,
        ..CheckableValue::new(url)
    }
    .skip(reason)
}

// Everything before a plain (non "#!") fragment
fn without_plain_fragment(url: &str) -> &str {
    match url.split_once('#') {
        Some((base, fragment)) if !fragment.starts_with('!') => base,
        _ => url,
    }
}

impl<S: LinkStore> Crawler<S> {
    /// Run the checkability filter for a normalized candidate
    ///
    /// `raw` is the candidate as it appeared in the markup.
    pub async fn is_checkable_url(
        &mut self,
        candidate: CheckableValue,
        raw: &str,
        page: &Page,
    ) -> CrawlResult<CheckableValue> {
        let rejected = (!candidate.is_checkable()).then(|| candidate.message.clone());
        let mut url = candidate.value;
        let mut marked: Vec<String> = Vec::new();
        let mut host_prefixed = false;

        loop {
            if self.cache.is_skipped(&url) {
                return Ok(skipped(&url, false, RUN_TIME_SKIPPED));
            }
            let unique = self.cache.first_sight(&url);
            self.cache.mark_skipped(&url);
            marked.push(url.clone());

            if let Some(reason) = &rejected {
                return Ok(skipped(&url, unique, reason.as_str()));
            }
            if self.is_admin_url(&url) {
                return Ok(skipped(&url, unique, ADMIN_URL));
            }
            if self.points_to_current_page(&url, raw, page) {
                return Ok(skipped(&url, unique, CURRENT_PAGE));
            }

            url = expand_fragment(&url.replace("&amp;", "&"));

            if self.cache.in_persistent(&url) {
                if let Some(id) = self.cache.persistent_id(&url, &self.store).await? {
                    self.store.associate(id, page.id).await?;
                    self.release(&marked);
                }
                return Ok(skipped(&url, unique, FOUND_IN_SKIPPED));
            }
            if self.settings.matches_skip_regex(&url) {
                return Ok(skipped(&url, unique, MATCHES_SKIP_REGEX));
            }

            if url.starts_with("//") {
                url = format!("https:{}", url);
            } else if !is_http_url(&url) && !host_prefixed {
                match self.settings.http_host() {
                    Some(host) => {
                        url = prefix_host(host, &url);
                        host_prefixed = true;
                        continue;
                    }
                    None => return Ok(skipped(&url, unique, LOCAL_WITHOUT_HOST)),
                }
            }

            if !is_valid_url(&url) {
                return Ok(skipped(&url, unique, FAILED_VALIDATION));
            }

            if let Some(id) = self.cache.checked_id(&url) {
                self.store.associate(id, page.id).await?;
                self.stats.links_checked += 1;
                self.release(&marked);
                return Ok(skipped(&url, false, ALREADY_CHECKED));
            }

            self.release(&marked);
            return Ok(CheckableValue {
                unique,
                ..CheckableValue::new(url)
            }
            .accept());
        }
    }

    fn release(&mut self, marked: &[String]) {
        for url in marked {
            self.cache.unmark_skipped(url);
        }
    }

    fn is_admin_url(&self, url: &str) -> bool {
        let admin = self.settings.config.admin_url.as_str();
        if admin.is_empty() {
            return false;
        }
        url.starts_with(admin)
            || self
                .settings
                .http_host()
                .is_some_and(|host| url.starts_with(&prefix_host(host, admin)))
    }

    fn points_to_current_page(&self, url: &str, raw: &str, page: &Page) -> bool {
        let raw = raw.trim();
        if raw == "." || raw == "./" {
            return true;
        }
        let url = without_plain_fragment(url);
        url == page.url
            || self
                .settings
                .http_host()
                .is_some_and(|host| url == prefix_host(host, &page.url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{normalize_url, HeaderResult};
    use crate::config::CrawlerConfig;
    use crate::storage::{CachedLink, SqliteStore};
    use crate::testing::{test_crawler, FakeFetch};

    async fn new_crawler(config: CrawlerConfig) -> Crawler<SqliteStore> {
        test_crawler(config, FakeFetch::default()).await
    }

    fn with_host() -> CrawlerConfig {
        CrawlerConfig {
            http_host: Some("https://example.com/".to_string()),
            ..Default::default()
        }
    }

    async fn check(crawler: &mut Crawler<SqliteStore>, raw: &str, page: &Page) -> CheckableValue {
        crawler
            .is_checkable_url(normalize_url(raw, &page.url), raw, page)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_relative_link_without_host() {
        let mut crawler = new_crawler(CrawlerConfig::default()).await;
        let value = check(&mut crawler, "./about", &Page::new(1, "/contact/")).await;
        assert!(!value.is_checkable());
        assert_eq!(value.value, "/contact/about");
        assert_eq!(value.message, "local URL and no http_host specified");
    }

    #[tokio::test]
    async fn test_relative_link_with_host() {
        let mut crawler = new_crawler(with_host()).await;
        let value = check(&mut crawler, "./about", &Page::new(1, "/contact/")).await;
        assert!(value.is_checkable());
        assert!(value.unique);
        assert_eq!(value.value, "https://example.com/contact/about");
    }

    #[tokio::test]
    async fn test_hashbang_is_expanded() {
        let mut crawler = new_crawler(CrawlerConfig::default()).await;
        let page = Page::new(1, "http://example.com/page");
        let value = check(&mut crawler, "#!state=foo", &page).await;
        assert!(value.is_checkable());
        assert_eq!(
            value.value,
            "http://example.com/page?_escaped_fragment_=state%3Dfoo"
        );
    }

    #[tokio::test]
    async fn test_repeated_skip_is_run_time_skipped() {
        let mut crawler = new_crawler(CrawlerConfig::default()).await;
        let page = Page::new(1, "/");

        let first = check(&mut crawler, "mailto:someone@example.com", &page).await;
        assert_eq!(first.message, "unsupported scheme: mailto");
        assert!(first.unique);

        let second = check(&mut crawler, "mailto:someone@example.com", &page).await;
        assert_eq!(second.message, "run-time skipped links");
        assert!(!second.unique);
    }

    #[tokio::test]
    async fn test_admin_and_current_page() {
        let mut crawler = new_crawler(with_host()).await;
        let page = Page::new(1, "/contact/");

        for raw in ["/admin/page/edit/?id=1", "https://example.com/admin/"] {
            assert_eq!(check(&mut crawler, raw, &page).await.message, "admin URL");
        }
        // Each of these resolves to the page URL, so use a fresh run for each
        for raw in [".", "./", "#top", "https://example.com/contact/"] {
            let mut crawler = new_crawler(with_host()).await;
            assert_eq!(
                check(&mut crawler, raw, &page).await.message,
                "link points to current page",
                "{}",
                raw
            );
        }
    }

    #[tokio::test]
    async fn test_entities_and_scheme_relative() {
        let mut crawler = new_crawler(CrawlerConfig::default()).await;
        let page = Page::new(1, "/");

        let value = check(&mut crawler, "https://a.test/?x=1&amp;y=2", &page).await;
        assert_eq!(value.value, "https://a.test/?x=1&y=2");

        let value = check(&mut crawler, "//cdn.example.com/x.js", &page).await;
        assert!(value.is_checkable());
        assert_eq!(value.value, "https://cdn.example.com/x.js");
    }

    #[tokio::test]
    async fn test_skip_list_records_association() {
        let config = CrawlerConfig {
            skipped_links: vec!["https://skip.example/".to_string()],
            ..Default::default()
        };
        let mut crawler = new_crawler(config).await;
        crawler
            .store
            .upsert_link("https://skip.example/", &HeaderResult::default(), 1)
            .await
            .unwrap();
        crawler.cache.load_persistent(
            &crawler.settings.config.skipped_links,
            vec![CachedLink {
                id: 99,
                url: "https://unstored.example/".to_string(),
            }],
        );

        for page in [Page::new(1, "/a/"), Page::new(2, "/b/")] {
            let value = check(&mut crawler, "https://skip.example/", &page).await;
            assert_eq!(value.message, "found from skipped links");
        }
        assert_eq!(crawler.store.pages_of("https://skip.example/").await, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_skip_regex_and_validation() {
        let config = CrawlerConfig {
            skip_link_regex: vec!["/\\.pdf$/i".to_string()],
            ..Default::default()
        };
        let mut crawler = new_crawler(config).await;
        let page = Page::new(1, "/");

        let value = check(&mut crawler, "https://a.test/file.PDF", &page).await;
        assert_eq!(value.message, "matches skipped links regex");

        let value = check(&mut crawler, "http://exa mple.com/", &page).await;
        assert_eq!(value.message, "URL didn't pass validation");
    }

    #[tokio::test]
    async fn test_already_checked_counts_and_associates() {
        let mut crawler = new_crawler(CrawlerConfig::default()).await;
        let id = crawler
            .store
            .upsert_link("https://a.test/", &HeaderResult::default(), 1)
            .await
            .unwrap();
        crawler.cache.record_checked("https://a.test/", id);

        for page in [Page::new(5, "/x/"), Page::new(6, "/y/"), Page::new(7, "/z/")] {
            let value = check(&mut crawler, "https://a.test/", &page).await;
            assert_eq!(value.message, "already checked");
            assert!(!value.unique);
        }
        assert_eq!(crawler.stats.links_checked, 3);
        assert_eq!(crawler.store.pages_of("https://a.test/").await, vec![5, 6, 7]);
    }
}
