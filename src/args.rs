use clap::{Parser, ValueEnum};
use page_tree::{CrawlConfig, CrawlResult, ExtractionMode, FailurePolicy};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "page-tree")]
#[command(about = "Maps the page tree of a site, recording cookies and iframes along the way")]
#[command(version)]
pub struct Args {
    /// Seed URL to start from
    pub seed_url: Option<String>,

    /// JSON configuration file; command-line flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum crawl depth (link hops from the seed)
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Run directory (default: output/<seed url with separators replaced>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Save a screenshot of every fetched page
    #[arg(long)]
    pub screenshots: bool,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,

    /// WebDriver server URL (also read from WEBDRIVER_URL)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Navigation timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Milliseconds to wait after navigation before reading the page
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// What to do when a page cannot be loaded
    #[arg(long, value_enum)]
    pub on_error: Option<FailurePolicyArg>,

    /// How links and iframes are read from a page
    #[arg(long, value_enum)]
    pub extraction: Option<ExtractionArg>,

    /// Extra regex pattern for links to skip (repeatable)
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,

    /// Drop the built-in exclusions for downloads and calendar exports
    #[arg(long)]
    pub no_default_excludes: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FailurePolicyArg {
    Abort,
    Leaf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExtractionArg {
    Script,
    Source,
}

impl From<FailurePolicyArg> for FailurePolicy {
    fn from(arg: FailurePolicyArg) -> Self {
        match arg {
            FailurePolicyArg::Abort => FailurePolicy::Abort,
            FailurePolicyArg::Leaf => FailurePolicy::Leaf,
        }
    }
}

impl From<ExtractionArg> for ExtractionMode {
    fn from(arg: ExtractionArg) -> Self {
        match arg {
            ExtractionArg::Script => ExtractionMode::Script,
            ExtractionArg::Source => ExtractionMode::Source,
        }
    }
}

impl Args {
    /// Build the run configuration: file, then environment, then flags
    pub fn into_config(self) -> CrawlResult<CrawlConfig> {
        let mut config = match &self.config {
            Some(path) => CrawlConfig::from_file(path)?,
            None => CrawlConfig::default(),
        };
        config.apply_env();

        if let Some(seed_url) = self.seed_url {
            config.seed_url = seed_url;
        }
        if let Some(depth) = self.depth {
            config.max_depth = depth;
        }
        if let Some(output) = self.output {
            config.output_dir = Some(output);
        }
        if self.screenshots {
            config.screenshots = true;
        }
        if self.headed {
            config.headless = false;
        }
        if let Some(webdriver_url) = self.webdriver_url {
            config.webdriver_url = webdriver_url;
        }
        if let Some(timeout) = self.timeout {
            config.navigation_timeout_secs = Some(timeout);
        }
        if let Some(settle_ms) = self.settle_ms {
            config.settle_millis = settle_ms;
        }
        if let Some(on_error) = self.on_error {
            config.on_fetch_error = on_error.into();
        }
        if let Some(extraction) = self.extraction {
            config.extraction = extraction.into();
        }
        if self.no_default_excludes {
            config.filter.exclude_patterns.clear();
        }
        config.filter.exclude_patterns.extend(self.exclude);

        Ok(config)
    }
}
