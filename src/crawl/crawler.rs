// src/crawl/crawler.rs
// =============================================================================
// The crawl orchestrator.
//
// One run, start to finish:
// 1. Clear the run cache, log START
// 2. Evict stale links from storage, rebuild the persistent cache tier
// 3. Walk the matching pages batch by batch; for every checkable page render
//    it, extract its links and check each one
// 4. Log the summary, store a run history row, return the summary
//
// Everything happens in order: one page, one link, one request at a time.
// A page that fails to render, or a link whose result can't be stored, is
// logged and skipped. Only storage or page source failures outside a single
// link abort the run.
// =============================================================================

use chrono::Utc;
use futures::TryStreamExt;
use std::pin::pin;
use tracing::{debug, warn};

use super::batch::{page_batches, PageWindow};
use super::cache::LinkCache;
use super::filter::RUN_TIME_SKIPPED;
use super::settings::CrawlSettings;
use super::stats::{RunStats, RunSummary};
use crate::checker::{
    extract_html_links, follow_redirects, normalize_url, status_label, CheckableValue,
    HeaderFetch, HeaderResolver, HeaderResult, RedirectHop, Throttle,
};
use crate::error::CrawlResult;
use crate::logging::RunLog;
use crate::pages::{Page, PageSource, Renderer};
use crate::storage::LinkStore;

/// A crawl session. Owns its caches, so sessions never share state.
pub struct Crawler<S> {
    pub(super) settings: CrawlSettings,
    pub(super) store: S,
    pub(super) fetcher: Box<dyn HeaderFetch>,
    pub(super) cache: LinkCache,
    pub(super) stats: RunStats,
    pub(super) log: RunLog,
}

impl<S: LinkStore> Crawler<S> {
    /// Crawler that checks links over HTTP
    pub fn new(settings: CrawlSettings, store: S) -> CrawlResult<Self> {
        let resolver = HeaderResolver::new(&settings.config, settings.method)?;
        Ok(Self::with_fetcher(settings, store, Box::new(resolver)))
    }

    pub fn with_fetcher(settings: CrawlSettings, store: S, fetcher: Box<dyn HeaderFetch>) -> Self {
        let log = RunLog::new(settings.config.log_level);
        Self {
            settings,
            store,
            fetcher,
            cache: LinkCache::new(),
            stats: RunStats::new(),
            log,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one full crawl over the pages `source` returns for the selector
    pub async fn start<P, R>(&mut self, source: &P, renderer: &R) -> CrawlResult<RunSummary>
    where
        P: PageSource + ?Sized,
        R: Renderer + ?Sized,
    {
        self.cache.clear_run();
        self.stats = RunStats::new();

        let query = self.settings.query.clone();
        self.log.write(1, format!("START: {}", query.source()));

        // Stale results go first, so the persistent tier only holds rows
        // that are still fresh (or flagged skip)
        // A window reaching past the earliest representable date keeps everything
        let cutoff = Utc::now()
            .checked_sub_signed(self.settings.max_age)
            .map_or(i64::MIN, |t| t.timestamp());
        let evicted = self.store.evict_expired(cutoff).await?;
        let cached = self.store.cached_links(cutoff).await?;
        self.cache
            .load_persistent(&self.settings.config.skipped_links, cached);
        debug!(evicted, cached = self.cache.persistent_len(), "link cache ready");

        let total = source.count_pages(&query).await?;
        let window = PageWindow::new(total, &query);
        self.stats.pages = window.len as u64;

        let mut page_throttle = Throttle::new(self.settings.config.page_delay());
        let mut batches = pin!(page_batches(
            source,
            &query,
            window,
            self.settings.config.batch_size,
            self.settings.config.batch_delay(),
        ));

        while let Some(batch) = batches.try_next().await? {
            for page in batch {
                page_throttle.wait().await;

                self.log.write(2, format!("FOUND Page: {}", page.url));
                if self.check_page(&page, renderer).await {
                    self.stats.pages_checked += 1;
                }
            }
        }

        let summary = self.stats.finish(query.source());
        self.log.write(1, summary.end_line());
        self.log.write_all(1, summary.status_lines());
        self.store.insert_run_history(&summary.to_history()).await?;

        Ok(summary)
    }

    /// Is this page worth rendering at all?
    pub fn is_checkable_page(&self, page: &Page) -> CheckableValue {
        let value = CheckableValue::new(page.url.as_str());
        if self.settings.config.admin_templates.contains(&page.template) {
            return value.skip(format!("template={}", page.template));
        }
        if !page.viewable {
            return value.skip("not viewable");
        }
        value.accept()
    }

    /// Check every link on `page`; false if the page itself was skipped
    pub async fn check_page<R>(&mut self, page: &Page, renderer: &R) -> bool
    where
        R: Renderer + ?Sized,
    {
        let verdict = self.is_checkable_page(page);
        if !verdict.is_checkable() {
            self.log
                .write(3, format!("NON-CHECKABLE Page: {} ({})", page.url, verdict.message));
            return false;
        }

        let html = match renderer.render(page).await {
            Ok(html) => html,
            Err(e) => {
                warn!(page = %page.url, error = %e, "page skipped");
                self.log.write(1, format!("RENDER FAILED Page: {} ({})", page.url, e));
                return false;
            }
        };

        let links = extract_html_links(&html, &self.settings.link_regex);
        for candidate in links {
            self.stats.links += 1;
            match self.check_url(&candidate, page).await {
                Ok(Some(_)) => self.stats.links_checked += 1,
                Ok(None) => {}
                Err(e) => {
                    warn!(url = %candidate, page = %page.url, error = %e, "link skipped");
                    self.log.write(1, format!("ERROR URL: {} ({})", candidate, e));
                }
            }
        }

        true
    }

    /// Check one link candidate found on `page`
    ///
    /// Returns the stored result, or None when the link wasn't requested.
    pub async fn check_url(
        &mut self,
        candidate: &str,
        page: &Page,
    ) -> CrawlResult<Option<HeaderResult>> {
        let normalized = normalize_url(candidate, &page.url);
        let shown = normalized.value.clone();

        let value = self.is_checkable_url(normalized, candidate, page).await?;
        if value.unique {
            self.stats.unique_links += 1;
        }
        if !value.is_checkable() {
            let level = if value.message == RUN_TIME_SKIPPED { 4 } else { 3 };
            self.log
                .write(level, format!("SKIPPED URL: {} ({})", value.value, value.message));
            return Ok(None);
        }

        let url = value.value;
        let first = self.fetcher.get_headers(&url).await;
        let chain = follow_redirects(
            self.fetcher.as_mut(),
            &url,
            first,
            self.settings.config.max_recursion_depth,
        )
        .await;

        let checked = Utc::now().timestamp();
        let id = match self.store.upsert_link(&url, &chain.result, checked).await {
            Ok(id) => id,
            Err(e) => {
                // Requested but not stored; don't request it again this run
                self.cache.mark_skipped(&url);
                return Err(e);
            }
        };
        self.cache.record_checked(&url, id);
        self.store.associate(id, page.id).await?;
        self.stats.record_status(chain.result.status);

        self.log.write(
            3,
            format!(
                "CHECKED URL: {} ({})",
                mark_prefix(&shown, &url),
                status_label(chain.result.status)
            ),
        );
        self.log.write_all(4, chain.hops.iter().map(RedirectHop::describe));
        if chain.looped {
            self.log.write(4, format!("REDIRECT LOOP: {}", url));
        }

        Ok(Some(chain.result))
    }
}

// "https://example.com/about" checked for "/about" reads
// "[https://example.com]/about"
fn mark_prefix(shown: &str, url: &str) -> String {
    match url.strip_suffix(shown) {
        Some(prefix) if !prefix.is_empty() && !shown.is_empty() => {
            format!("[{}]{}", prefix, shown)
        }
        _ => url.to_string(),
    }
}
