pub mod config;
pub mod crawlers;
pub mod error;
pub mod filter;
pub mod output;
pub mod parsers;
pub mod registry;
pub mod tree;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{CrawlConfig, ExtractionMode, FailurePolicy};
pub use crawlers::{CrawlOutcome, FetchedPage, Orchestrator, PageFetcher, WebDriverFetcher};
pub use error::{CrawlError, CrawlResult};
pub use tree::{CookieData, CookieRecord, IframeRecord, PageNode};

use std::path::PathBuf;
use std::time::{Duration, Instant};

use filter::UrlFilter;
use output::OutputWriter;

/// Totals reported once a run has written its output
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    pub pages_fetched: usize,
    pub cookies: usize,
    pub iframes: usize,
    pub elapsed: Duration,
}

/// Crawl the configured seed through a WebDriver session and write the results
pub async fn run(config: &CrawlConfig) -> CrawlResult<RunSummary> {
    let (filter, writer) = prepare(config)?;

    let screenshot_dir = config.screenshots.then(|| writer.screenshot_dir());
    let fetcher = WebDriverFetcher::connect(config, screenshot_dir).await?;

    crawl_and_write(config, filter, writer, fetcher).await
}

/// Like [`run`], but with a caller-supplied fetcher
pub async fn run_with_fetcher<F: PageFetcher>(
    config: &CrawlConfig,
    fetcher: F,
) -> CrawlResult<RunSummary> {
    let (filter, writer) = prepare(config)?;
    crawl_and_write(config, filter, writer, fetcher).await
}

/// Validate the configuration, then empty the run directory
fn prepare(config: &CrawlConfig) -> CrawlResult<(UrlFilter, OutputWriter)> {
    config.validate()?;
    let filter = UrlFilter::new(&config.seed_url, &config.filter)?;

    let mut writer = OutputWriter::new(config.run_dir());
    if config.output_dir.is_some() {
        writer = writer.explicit();
    }
    writer.prepare()?;

    Ok((filter, writer))
}

async fn crawl_and_write<F: PageFetcher>(
    config: &CrawlConfig,
    filter: UrlFilter,
    writer: OutputWriter,
    fetcher: F,
) -> CrawlResult<RunSummary> {
    let start_time = Instant::now();
    ::log::info!(
        "Crawling {} to depth {}",
        config.seed_url,
        config.max_depth
    );

    let outcome = Orchestrator::new(fetcher, filter, config.max_depth)
        .with_failure_policy(config.on_fetch_error)
        .run()
        .await?;

    writer.write(
        &outcome.root,
        &outcome.context.cookies,
        &outcome.context.iframes,
    )?;

    let summary = RunSummary {
        output_dir: writer.dir().to_path_buf(),
        pages_fetched: outcome.pages_fetched,
        cookies: outcome.context.cookies.len(),
        iframes: outcome.context.iframes.len(),
        elapsed: start_time.elapsed(),
    };
    ::log::info!(
        "Crawling complete - fetched {} pages, {} cookies, {} iframes in {:.2} seconds",
        summary.pages_fetched,
        summary.cookies,
        summary.iframes,
        summary.elapsed.as_secs_f64()
    );
    Ok(summary)
}
