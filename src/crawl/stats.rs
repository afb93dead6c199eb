// src/crawl/stats.rs
// =============================================================================
// Run statistics and the summary produced at the end of a run.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::checker::status_label;
use crate::storage::RunHistory;

#[derive(Debug, Clone)]
pub struct RunStats {
    started: Instant,
    time_start: DateTime<Utc>,
    pub pages: u64,
    pub pages_checked: u64,
    pub links: u64,
    pub links_checked: u64,
    pub unique_links: u64,
    /// Status label -> number of requests answered with it
    pub statuses: BTreeMap<String, u64>,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            time_start: Utc::now(),
            pages: 0,
            pages_checked: 0,
            links: 0,
            links_checked: 0,
            unique_links: 0,
            statuses: BTreeMap::new(),
        }
    }

    pub fn record_status(&mut self, status: Option<u16>) {
        *self.statuses.entry(status_label(status)).or_insert(0) += 1;
    }

    pub fn finish(&self, selector: &str) -> RunSummary {
        RunSummary {
            selector: selector.to_string(),
            time_start: self.time_start,
            time_end: Utc::now(),
            elapsed_seconds: self.started.elapsed().as_secs_f64(),
            pages: self.pages,
            pages_checked: self.pages_checked,
            links: self.links,
            links_checked: self.links_checked,
            unique_links: self.unique_links,
            statuses: self.statuses.clone(),
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

/// What a completed run did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub selector: String,
    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,
    pub elapsed_seconds: f64,
    pub pages: u64,
    pub pages_checked: u64,
    pub links: u64,
    pub links_checked: u64,
    pub unique_links: u64,
    pub statuses: BTreeMap<String, u64>,
}

impl RunSummary {
    /// Number of URLs actually requested
    pub fn requests(&self) -> u64 {
        self.statuses.values().sum()
    }

    pub fn end_line(&self) -> String {
        format!(
            "END: {}/{} pages and {}/{} links checked ({} unique) in {:.2} seconds",
            self.pages_checked,
            self.pages,
            self.links_checked,
            self.links,
            self.unique_links,
            self.elapsed_seconds
        )
    }

    /// "STATUS 200: 12 (85.7%)" per status, in label order
    pub fn status_lines(&self) -> Vec<String> {
        let total = self.requests();
        self.statuses
            .iter()
            .map(|(label, count)| {
                let pct = if total == 0 {
                    0.0
                } else {
                    *count as f64 * 100.0 / total as f64
                };
                format!("STATUS {}: {} ({:.1}%)", label, count, pct)
            })
            .collect()
    }

    pub fn to_history(&self) -> RunHistory {
        RunHistory {
            time_start: self.time_start.timestamp(),
            time_end: self.time_end.timestamp(),
            pages: self.pages,
            pages_checked: self.pages_checked,
            links: self.links,
            links_checked: self.links_checked,
            unique_links: self.unique_links,
            status_breakdown: self.statuses.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lines() {
        let mut stats = RunStats::new();
        stats.pages = 3;
        stats.pages_checked = 2;
        stats.links = 10;
        stats.links_checked = 7;
        stats.unique_links = 6;
        for status in [Some(200), Some(200), Some(200), Some(404), None, Some(200)] {
            stats.record_status(status);
        }

        let summary = stats.finish("status!=trash");
        assert_eq!(summary.requests(), 6);
        assert!(summary
            .end_line()
            .starts_with("END: 2/3 pages and 7/10 links checked (6 unique) in "));
        assert_eq!(
            summary.status_lines(),
            vec![
                "STATUS 200: 4 (66.7%)",
                "STATUS 404: 1 (16.7%)",
                "STATUS error: 1 (16.7%)",
            ]
        );

        let history = summary.to_history();
        assert_eq!(history.links_checked, 7);
        assert_eq!(history.status_breakdown.get("error"), Some(&1));
        assert!(history.time_end >= history.time_start);
    }

    #[test]
    fn test_empty_run_has_no_status_lines() {
        let summary = RunStats::new().finish("");
        assert_eq!(summary.requests(), 0);
        assert!(summary.status_lines().is_empty());
    }
}
