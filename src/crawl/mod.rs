// src/crawl/mod.rs
// =============================================================================
// This module runs a crawl over the pages of a site.
//
// Submodules:
// - settings: config compiled into regexes, a page query and durations
// - batch: pages in bounded batches, with a delay between batches
// - cache: run-scoped and persistent link caches
// - filter: the ordered "should this link be requested?" checks
// - stats: counters and the end-of-run summary
// - crawler: the orchestrator tying it all together
//
// A crawl is strictly sequential. It never follows links into new pages; it
// only checks the links found on the pages the page source hands out.
// =============================================================================

mod batch;
mod cache;
mod crawler;
mod filter;
mod settings;
mod stats;

pub use crawler::Crawler;
pub use settings::CrawlSettings;
pub use stats::RunSummary;
