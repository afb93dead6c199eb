// src/logging.rs
// =============================================================================
// Run log setup.
//
// Crawler messages are ordinary `tracing` events sent to RUN_LOG_TARGET.
// `init_logging` (called from main only) routes them to:
// - <log_dir>/link_crawler.log, recreated for every run
// - stdout as well, when log_on_screen is set
// Everything else (library warnings, debug output) goes to stderr, filtered
// by RUST_LOG and defaulting to "warn".
//
// Verbosity is decided before an event is emitted: RunLog drops messages
// above the configured level and indents the rest by 4 spaces per level, so
// a level 3 line sits deeper than a level 1 line in the file.
// =============================================================================

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, Level};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::CrawlerConfig;
use crate::error::{CrawlError, CrawlResult};

/// tracing target of all run log messages
pub const RUN_LOG_TARGET: &str = "link_crawler::run";

pub const LOG_FILE_NAME: &str = "link_crawler.log";

/// Highest verbosity level; redirect hops are logged here
pub const MAX_LOG_LEVEL: u8 = 4;

/// Level-aware writer for the run log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLog {
    level: u8,
}

impl RunLog {
    pub fn new(level: u8) -> Self {
        Self {
            level: level.min(MAX_LOG_LEVEL),
        }
    }

    pub fn enabled(&self, level: u8) -> bool {
        level > 0 && self.level >= level
    }

    pub fn write(&self, level: u8, message: impl AsRef<str>) {
        if self.enabled(level) {
            info!(target: RUN_LOG_TARGET, "{}", indent(level, message.as_ref()));
        }
    }

    pub fn write_all<I, M>(&self, level: u8, messages: I)
    where
        I: IntoIterator<Item = M>,
        M: AsRef<str>,
    {
        for message in messages {
            self.write(level, message);
        }
    }
}

fn indent(level: u8, message: &str) -> String {
    format!("{}{}", " ".repeat(4 * level as usize), message)
}

fn rotated_name(n: usize) -> String {
    format!("link_crawler.{}.log", n)
}

/// Make room for a new run log in `dir` and return its path
///
/// With `keep > 0` the previous logs shift one step (`.1` -> `.2`, ...),
/// the oldest one past `keep` is removed and the current log becomes `.1`.
/// With `keep == 0` nothing moves and the caller simply truncates the file.
pub fn rotate_logs(dir: &Path, keep: usize) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let current = dir.join(LOG_FILE_NAME);

    if keep > 0 {
        let oldest = dir.join(rotated_name(keep));
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for n in (1..keep).rev() {
            let from = dir.join(rotated_name(n));
            if from.exists() {
                fs::rename(&from, dir.join(rotated_name(n + 1)))?;
            }
        }
        if current.exists() {
            fs::rename(&current, dir.join(rotated_name(1)))?;
        }
    }

    Ok(current)
}

/// Install the global subscriber. Call once, after the config validated.
pub fn init_logging(config: &CrawlerConfig) -> CrawlResult<()> {
    let run_events = || Targets::new().with_target(RUN_LOG_TARGET, Level::INFO);

    let file_layer = if config.log_level > 0 {
        let path = rotate_logs(Path::new(&config.log_dir), config.log_rotation)?;
        let file = File::create(&path)?;
        Some(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false)
                .with_level(false)
                .with_filter(run_events()),
        )
    } else {
        None
    };

    let screen_layer = (config.log_level > 0 && config.log_on_screen).then(|| {
        fmt::layer()
            .with_writer(io::stdout)
            .with_target(false)
            .with_level(false)
            .with_filter(run_events())
    });

    let stderr_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_filter(stderr_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(screen_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| CrawlError::Config(format!("failed to install logger: {}", e)))
}
