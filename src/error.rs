// src/error.rs
// =============================================================================
// Error types shared by the crawler.
//
// Only configuration problems are fatal. Network failures are not errors at
// all (they become a link with no status), and render failures are caught by
// the orchestrator per page.
// =============================================================================

/// Errors raised by the crawler and its collaborators
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    /// Missing or invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// A delimited regex that could not be parsed or compiled
    #[error("invalid pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Page selector that could not be parsed
    #[error("invalid selector term '{0}'")]
    Selector(String),

    /// Page markup could not be produced
    #[error("render failed for page {page}: {reason}")]
    Render { page: String, reason: String },

    /// SQL error from sqlx
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP client could not be set up
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CrawlError {
    /// Shorthand for a render failure of the page at `page`
    pub fn render(page: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        CrawlError::Render {
            page: page.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for crawler operations
pub type CrawlResult<T> = Result<T, CrawlError>;
