// src/cli.rs
// =============================================================================
// Command-line interface, parsed with clap's derive API.
//
// Every flag is optional: running `link-crawler` with no arguments loads
// link-crawler.toml (if present) and performs one full crawl. That is the
// invocation meant for cron and other schedulers.
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(
    name = "link-crawler",
    version,
    about = "Crawls the pages of a site and records broken and redirected links",
    long_about = "link-crawler renders every page matching a selector, extracts its links and \
                  checks each distinct URL once per run. Results go to a SQLite database and \
                  a run log; recently checked links are not requested again."
)]
pub struct Cli {
    /// Path of the TOML config file (a missing file means built-in defaults)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Page selector to use instead of the configured one
    ///
    /// Example: --selector "template=news, limit=50"
    #[arg(long)]
    pub selector: Option<String>,

    /// Mirror the run log to stdout
    #[arg(long)]
    pub log_on_screen: bool,

    /// Print the run summary as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Flag a URL as permanently skipped before the crawl starts
    ///
    /// Can be given several times.
    #[arg(long = "skip", value_name = "URL")]
    pub skip: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_is_a_full_run() {
        let cli = Cli::try_parse_from(["link-crawler"]).unwrap();
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(cli.selector.is_none());
        assert!(!cli.json);
        assert!(cli.skip.is_empty());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "link-crawler",
            "--config",
            "site.toml",
            "--selector",
            "template=news",
            "--log-on-screen",
            "--json",
            "--skip",
            "https://a.test/",
            "--skip",
            "https://b.test/",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        assert_eq!(cli.selector.as_deref(), Some("template=news"));
        assert!(cli.log_on_screen && cli.json);
        assert_eq!(cli.skip, vec!["https://a.test/", "https://b.test/"]);
    }
}
