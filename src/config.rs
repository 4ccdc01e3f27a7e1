use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::{CrawlError, CrawlResult};
use crate::filter::UrlFilterConfig;
use crate::utils::sanitize_filename;

/// What happens to a page whose navigation fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Propagate the error and end the run
    #[default]
    Abort,
    /// Keep the page as a leaf carrying the error message
    Leaf,
}

/// How links and iframes are read from a loaded page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Query the live DOM, including open shadow roots
    #[default]
    Script,
    /// Parse the serialized page source
    Source,
}

/// Configuration for a crawl run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// URL to start crawling from
    #[serde(default = "default_seed_url")]
    pub seed_url: String,

    /// Deepest link-hop count that is still fetched
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Run directory; derived from the seed URL when absent
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Save a screenshot of every fetched page
    #[serde(default)]
    pub screenshots: bool,

    /// Ask the browser to run without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Navigation timeout; no client-side limit when absent
    #[serde(default)]
    pub navigation_timeout_secs: Option<u64>,

    /// Pause after navigation so client-side rendering can finish
    #[serde(default = "default_settle_millis")]
    pub settle_millis: u64,

    #[serde(default)]
    pub on_fetch_error: FailurePolicy,

    #[serde(default)]
    pub extraction: ExtractionMode,

    #[serde(flatten)]
    pub filter: UrlFilterConfig,
}

/// Directory that run directories are created in by default
pub const DEFAULT_OUTPUT_ROOT: &str = "output";

fn default_seed_url() -> String {
    "https://example.com/".to_string()
}

fn default_max_depth() -> usize {
    2
}

fn default_headless() -> bool {
    true
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_settle_millis() -> u64 {
    500
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::new(&default_seed_url())
    }
}

impl CrawlConfig {
    /// Create a new configuration with default values
    pub fn new(seed_url: &str) -> Self {
        Self {
            seed_url: seed_url.to_string(),
            max_depth: default_max_depth(),
            output_dir: None,
            screenshots: false,
            headless: default_headless(),
            webdriver_url: default_webdriver_url(),
            navigation_timeout_secs: None,
            settle_millis: default_settle_millis(),
            on_fetch_error: FailurePolicy::default(),
            extraction: ExtractionMode::default(),
            filter: UrlFilterConfig::default(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> CrawlResult<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            CrawlError::Configuration(format!("cannot open {}: {}", path.display(), e))
        })?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|e| {
            CrawlError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> CrawlResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| CrawlError::Configuration(format!("malformed config: {}", e)))
    }

    /// Override the WebDriver URL with the `WEBDRIVER_URL` environment variable if set
    pub fn apply_env(&mut self) {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
    }

    /// Check everything that can be checked before the first fetch
    pub fn validate(&self) -> CrawlResult<Url> {
        let seed = Url::parse(&self.seed_url).map_err(|e| {
            CrawlError::Configuration(format!("invalid seed url {:?}: {}", self.seed_url, e))
        })?;
        if !matches!(seed.scheme(), "http" | "https") {
            return Err(CrawlError::Configuration(format!(
                "seed url must be http or https, got {}",
                seed.scheme()
            )));
        }
        if seed.host().is_none() {
            return Err(CrawlError::Configuration(format!(
                "seed url has no host: {}",
                self.seed_url
            )));
        }
        Url::parse(&self.webdriver_url).map_err(|e| {
            CrawlError::Configuration(format!(
                "invalid webdriver url {:?}: {}",
                self.webdriver_url, e
            ))
        })?;
        if self.navigation_timeout_secs == Some(0) {
            return Err(CrawlError::Configuration(
                "navigation timeout must be positive".to_string(),
            ));
        }
        Ok(seed)
    }

    /// Run directory, either configured or derived from the seed URL
    pub fn run_dir(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => Path::new(DEFAULT_OUTPUT_ROOT).join(sanitize_filename(&self.seed_url)),
        }
    }

    pub fn navigation_timeout(&self) -> Option<Duration> {
        self.navigation_timeout_secs.map(Duration::from_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_millis)
    }
}
