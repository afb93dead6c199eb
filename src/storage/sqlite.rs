// src/storage/sqlite.rs
// =============================================================================
// SQLite implementation of LinkStore.
//
// - One file database in WAL mode with foreign keys on, so deleting a link
//   also drops its page associations
// - The schema is applied on open; every statement is idempotent
// - Link rows are keyed by URL and upserted, so a recheck keeps the link id
// =============================================================================

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use super::{CachedLink, LinkStore, RunHistory};
use crate::checker::HeaderResult;
use crate::error::CrawlResult;

const MIGRATION_SQL: &str = include_str!("../../migrations/001_initial_schema.sql");

/// Link storage backed by a SQLite database
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database file at `path` and run migrations
    pub async fn open(path: impl AsRef<Path>) -> CrawlResult<Self> {
        let path = path.as_ref();
        info!("Opening link database at: {}", path.display());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Private in-memory database (one connection, so it stays alive)
    pub async fn open_in_memory() -> CrawlResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> CrawlResult<()> {
        for statement in MIGRATION_SQL.split(';') {
            let stmt = statement.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(pool).await?;
            }
        }
        Ok(())
    }

    /// Set or clear the permanent skip flag of `url`, creating the row if
    /// the link hasn't been seen yet
    pub async fn set_skip(&self, url: &str, skip: bool) -> CrawlResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO links (url, skip, checked) VALUES (?, ?, ?)
             ON CONFLICT(url) DO UPDATE SET skip = excluded.skip
             RETURNING id",
        )
        .bind(url)
        .bind(skip)
        .bind(Utc::now().timestamp())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl LinkStore for SqliteStore {
    async fn upsert_link(&self, url: &str, result: &HeaderResult, checked: i64) -> CrawlResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO links (url, status, location, checked) VALUES (?, ?, ?, ?)
             ON CONFLICT(url) DO UPDATE SET
                status = excluded.status,
                location = excluded.location,
                checked = excluded.checked
             RETURNING id",
        )
        .bind(url)
        .bind(result.status.map(i64::from))
        .bind(result.location.as_deref())
        .bind(checked)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn associate(&self, link_id: i64, page_id: i64) -> CrawlResult<()> {
        sqlx::query("INSERT OR IGNORE INTO links_pages (links_id, pages_id) VALUES (?, ?)")
            .bind(link_id)
            .bind(page_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_link_id(&self, url: &str) -> CrawlResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM links WHERE url = ? LIMIT 1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn evict_expired(&self, cutoff: i64) -> CrawlResult<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM links_pages WHERE links_id IN
                (SELECT id FROM links WHERE skip = 0 AND checked < ?)",
        )
        .bind(cutoff)
        .execute(&mut *tx)
        .await?;

        let removed = sqlx::query("DELETE FROM links WHERE skip = 0 AND checked < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(removed)
    }

    async fn cached_links(&self, cutoff: i64) -> CrawlResult<Vec<CachedLink>> {
        let rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT id, url FROM links WHERE skip = 1 OR checked > ?",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, url)| CachedLink { id, url })
            .collect())
    }

    async fn insert_run_history(&self, history: &RunHistory) -> CrawlResult<i64> {
        let breakdown = serde_json::to_string(&history.status_breakdown)?;

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO run_history
                (time_start, time_end, pages, pages_checked, links, links_checked, unique_links, status_breakdown)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(history.time_start)
        .bind(history.time_end)
        .bind(history.pages as i64)
        .bind(history.pages_checked as i64)
        .bind(history.links as i64)
        .bind(history.links_checked as i64)
        .bind(history.unique_links as i64)
        .bind(breakdown)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }
}

/// Read-side helpers for assertions
#[cfg(test)]
impl SqliteStore {
    pub async fn link(&self, url: &str) -> Option<(Option<i64>, Option<String>, bool)> {
        sqlx::query_as::<_, (Option<i64>, Option<String>, bool)>(
            "SELECT status, location, skip FROM links WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .unwrap()
    }

    pub async fn link_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM links")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn pages_of(&self, url: &str) -> Vec<i64> {
        sqlx::query_scalar(
            "SELECT lp.pages_id FROM links_pages lp JOIN links l ON l.id = lp.links_id
             WHERE l.url = ? ORDER BY lp.pages_id",
        )
        .bind(url)
        .fetch_all(&self.pool)
        .await
        .unwrap()
    }

    pub async fn association_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM links_pages")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn history(&self) -> Vec<(i64, i64, String)> {
        sqlx::query_as("SELECT links, unique_links, status_breakdown FROM run_history ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .unwrap()
    }
}
