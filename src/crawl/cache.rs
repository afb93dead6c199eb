// src/crawl/cache.rs
// =============================================================================
// The two cache tiers of a crawl session.
//
// Run tier (empty at the start of every run):
// - checked: URL -> link id, for URLs requested during this run
// - skipped: URLs evaluated this run that didn't end up checked or associated
// - seen: every URL evaluated this run, used for the unique link count
//
// Persistent tier (rebuilt once per run, after eviction):
// - URLs from the `skipped_links` config, plus links flagged `skip` or
//   checked within the freshness window. Config-only URLs start out Pending
//   and get their link id from storage the first time they're hit.
// =============================================================================

use std::collections::{HashMap, HashSet};

use crate::error::CrawlResult;
use crate::storage::{CachedLink, LinkStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipEntry {
    /// Listed, id not looked up yet
    Pending,
    Known(i64),
    /// Looked up, no row in storage
    Unknown,
}

#[derive(Debug, Default)]
pub struct LinkCache {
    checked: HashMap<String, i64>,
    skipped: HashSet<String>,
    seen: HashSet<String>,
    persistent: HashMap<String, SkipEntry>,
}

impl LinkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_run(&mut self) {
        self.checked.clear();
        self.skipped.clear();
        self.seen.clear();
    }

    /// Replace the persistent tier
    pub fn load_persistent(&mut self, configured: &[String], rows: Vec<CachedLink>) {
        self.persistent.clear();
        for url in configured {
            self.persistent.insert(url.clone(), SkipEntry::Pending);
        }
        for row in rows {
            self.persistent.insert(row.url, SkipEntry::Known(row.id));
        }
    }

    pub fn persistent_len(&self) -> usize {
        self.persistent.len()
    }

    pub fn is_skipped(&self, url: &str) -> bool {
        self.skipped.contains(url)
    }

    pub fn mark_skipped(&mut self, url: &str) {
        self.skipped.insert(url.to_string());
    }

    pub fn unmark_skipped(&mut self, url: &str) {
        self.skipped.remove(url);
    }

    /// Record `url` as evaluated; true the first time
    pub fn first_sight(&mut self, url: &str) -> bool {
        self.seen.insert(url.to_string())
    }

    pub fn checked_id(&self, url: &str) -> Option<i64> {
        self.checked.get(url).copied()
    }

    pub fn record_checked(&mut self, url: &str, id: i64) {
        self.checked.insert(url.to_string(), id);
    }

    pub fn in_persistent(&self, url: &str) -> bool {
        self.persistent.contains_key(url)
    }

    /// Link id of a persistent tier URL, looking it up on first use
    pub async fn persistent_id<S>(&mut self, url: &str, store: &S) -> CrawlResult<Option<i64>>
    where
        S: LinkStore + ?Sized,
    {
        let entry = match self.persistent.get(url).copied() {
            None => return Ok(None),
            Some(SkipEntry::Pending) => {
                let entry = match store.find_link_id(url).await? {
                    Some(id) => SkipEntry::Known(id),
                    None => SkipEntry::Unknown,
                };
                self.persistent.insert(url.to_string(), entry);
                entry
            }
            Some(entry) => entry,
        };

        Ok(match entry {
            SkipEntry::Known(id) => Some(id),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::HeaderResult;
    use crate::storage::SqliteStore;

    #[test]
    fn test_clear_run_keeps_persistent_tier() {
        let mut cache = LinkCache::new();
        cache.load_persistent(&["https://skip.example/".to_string()], Vec::new());
        cache.record_checked("https://a.example/", 1);
        cache.mark_skipped("https://b.example/");
        assert!(cache.first_sight("https://b.example/"));
        assert!(!cache.first_sight("https://b.example/"));

        cache.clear_run();

        assert_eq!(cache.checked_id("https://a.example/"), None);
        assert!(!cache.is_skipped("https://b.example/"));
        assert!(cache.first_sight("https://b.example/"));
        assert!(cache.in_persistent("https://skip.example/"));
    }

    #[tokio::test]
    async fn test_pending_entries_are_looked_up_once() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        let id = store
            .upsert_link("https://known.example/", &HeaderResult::default(), 1)
            .await
            .unwrap();

        let mut cache = LinkCache::new();
        cache.load_persistent(
            &[
                "https://known.example/".to_string(),
                "https://never.example/".to_string(),
            ],
            vec![CachedLink {
                id: 42,
                url: "https://row.example/".to_string(),
            }],
        );
        assert_eq!(cache.persistent_len(), 3);

        assert_eq!(
            cache.persistent_id("https://known.example/", &store).await.unwrap(),
            Some(id)
        );
        assert_eq!(
            cache.persistent.get("https://known.example/"),
            Some(&SkipEntry::Known(id))
        );
        assert_eq!(cache.persistent_id("https://never.example/", &store).await.unwrap(), None);
        assert_eq!(
            cache.persistent.get("https://never.example/"),
            Some(&SkipEntry::Unknown)
        );
        assert_eq!(cache.persistent_id("https://row.example/", &store).await.unwrap(), Some(42));
        assert_eq!(cache.persistent_id("https://other.example/", &store).await.unwrap(), None);
    }
}
