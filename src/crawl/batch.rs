// src/crawl/batch.rs
// =============================================================================
// Batch page iteration.
//
// The crawl covers a window of the pages matching the selector: everything,
// or `start`/`limit` of it. The window is fetched in batches of at most
// `batch_size` pages, each with its own find_pages call, so the full result
// set is never held in memory. Between batches we sleep for the configured
// batch delay.
// =============================================================================

use futures::stream::{self, Stream};
use std::time::Duration;

use crate::checker::Throttle;
use crate::error::CrawlResult;
use crate::pages::{Page, PageQuery, PageSource};

/// The slice of matching pages a run covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: usize,
    pub len: usize,
}

impl PageWindow {
    /// Window for `total` matching pages, honoring the query's start/limit
    pub fn new(total: usize, query: &PageQuery) -> Self {
        let offset = query.start.unwrap_or(0).min(total);
        let available = total - offset;
        let len = query.limit.map_or(available, |limit| limit.min(available));
        Self { offset, len }
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Stream the pages of `window` in batches
pub fn page_batches<'a, P>(
    source: &'a P,
    query: &'a PageQuery,
    window: PageWindow,
    batch_size: usize,
    delay: Duration,
) -> impl Stream<Item = CrawlResult<Vec<Page>>> + 'a
where
    P: PageSource + ?Sized,
{
    let batch_size = batch_size.max(1);

    let state = (window.offset, Throttle::new(delay));

    stream::try_unfold(state, move |(offset, mut throttle)| async move {
        if offset >= window.end() {
            return Ok(None);
        }
        throttle.wait().await;

        let limit = batch_size.min(window.end() - offset);
        let pages = source.find_pages(query, offset, limit).await?;
        if pages.is_empty() {
            // The source has fewer pages than it counted a moment ago
            return Ok(None);
        }
        Ok(Some((pages, (offset + limit, throttle))))
    })
}
