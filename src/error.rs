use std::path::PathBuf;

use thiserror::Error;

pub type CrawlResult<T> = Result<T, CrawlError>;

/// Errors that abort a crawl run
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The fetcher could not load a URL, or it did not settle in time
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// Connecting to or talking to the WebDriver session failed outside of a navigation
    #[error("webdriver error: {0}")]
    WebDriver(String),

    /// Output directory preparation or a file write failed
    #[error("file system error at {}: {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed seed URL, invalid depth, bad regex, unreadable config file
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl CrawlError {
    pub fn navigation(url: &str, reason: impl ToString) -> Self {
        CrawlError::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn file_system(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CrawlError::FileSystem {
            path: path.into(),
            source,
        }
    }

    /// Whether a degraded-leaf policy may absorb this error
    pub fn is_navigation(&self) -> bool {
        matches!(self, CrawlError::Navigation { .. })
    }
}

impl From<regex::Error> for CrawlError {
    fn from(err: regex::Error) -> Self {
        CrawlError::Configuration(format!("invalid url pattern: {err}"))
    }
}
