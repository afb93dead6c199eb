// src/main.rs
// =============================================================================
// This is the entry point of the link-crawler binary.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Load and validate the config (all config errors surface here, before
//    anything is written)
// 3. Set up the collaborators: page manifest, renderer, SQLite store, run log
// 4. Run one full crawl and print its summary
// 5. Exit with 0 after a completed run, 2 when the run couldn't start or
//    failed as a whole
// =============================================================================

mod checker; // src/checker/ - link extraction, normalization, HTTP checks
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - TOML config
mod crawl; // src/crawl/ - caches, filter and the crawl orchestrator
mod error; // src/error.rs - error type shared by all modules
mod logging; // src/logging.rs - run log
mod pages; // src/pages/ - page source and renderers
mod storage; // src/storage/ - SQLite link store

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use config::CrawlerConfig;
use crawl::{CrawlSettings, Crawler, RunSummary};
use pages::{build_renderer, ManifestPageSource};
use storage::SqliteStore;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let mut config = CrawlerConfig::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    if let Some(selector) = cli.selector {
        config.selector = selector;
    }
    if cli.log_on_screen {
        config.log_on_screen = true;
    }

    let settings = CrawlSettings::new(config).context("invalid configuration")?;
    let renderer = build_renderer(&settings.config).context("invalid configuration")?;
    let source = ManifestPageSource::load(&settings.config.pages_file).with_context(|| {
        format!("failed to load page manifest {}", settings.config.pages_file)
    })?;

    let store = SqliteStore::open(&settings.config.database)
        .await
        .with_context(|| format!("failed to open database {}", settings.config.database))?;
    for url in &cli.skip {
        store
            .set_skip(url, true)
            .await
            .with_context(|| format!("failed to flag {} as skipped", url))?;
    }

    logging::init_logging(&settings.config)?;

    let mut crawler = Crawler::new(settings, store)?;
    let summary = crawler.start(&source, renderer.as_ref()).await?;
    crawler.store().close().await;

    print_summary(&summary, cli.json)?;
    Ok(0)
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("📊 Summary ({}):", summary.selector);
    println!("   📄 Pages: {}/{} checked", summary.pages_checked, summary.pages);
    println!(
        "   🔗 Links: {}/{} checked, {} unique",
        summary.links_checked, summary.links, summary.unique_links
    );
    for line in summary.status_lines() {
        println!("   {}", line);
    }
    println!("   ⏱️  {:.2} seconds", summary.elapsed_seconds);
    Ok(())
}
