// src/storage/mod.rs
// =============================================================================
// Persistent storage for check results.
//
// The crawler talks to storage only through the LinkStore trait. SqliteStore
// is the bundled implementation.
//
// Tables:
// - links: one row per URL with its last status, redirect location and a
//   permanent `skip` flag
// - links_pages: which page contains which link
// - run_history: one summary row per completed run
// =============================================================================

mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::checker::HeaderResult;
use crate::error::CrawlResult;

pub use sqlite::SqliteStore;

/// A link row that belongs in the persistent skip cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedLink {
    pub id: i64,
    pub url: String,
}

/// Summary of one completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHistory {
    /// Unix timestamps (seconds, UTC)
    pub time_start: i64,
    pub time_end: i64,
    pub pages: u64,
    pub pages_checked: u64,
    pub links: u64,
    pub links_checked: u64,
    pub unique_links: u64,
    /// Status code (or "error") -> number of links
    pub status_breakdown: BTreeMap<String, u64>,
}

#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Insert or update the row for `url`; returns the row id
    async fn upsert_link(&self, url: &str, result: &HeaderResult, checked: i64) -> CrawlResult<i64>;

    /// Record that page `page_id` contains link `link_id` (idempotent)
    async fn associate(&self, link_id: i64, page_id: i64) -> CrawlResult<()>;

    async fn find_link_id(&self, url: &str) -> CrawlResult<Option<i64>>;

    /// Delete non-skip links checked before `cutoff`, with their page
    /// relations; returns the number of links removed
    async fn evict_expired(&self, cutoff: i64) -> CrawlResult<u64>;

    /// Links flagged `skip` or checked after `cutoff`
    async fn cached_links(&self, cutoff: i64) -> CrawlResult<Vec<CachedLink>>;

    async fn insert_run_history(&self, history: &RunHistory) -> CrawlResult<i64>;
}
