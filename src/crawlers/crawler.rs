use async_trait::async_trait;
use url::Url;

use crate::error::CrawlResult;
use crate::tree::CookieData;

/// Everything a fetcher reports about one loaded page
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    /// Location actually loaded, after redirects
    pub location: Url,
    pub title: String,
    /// Raw outbound links, unfiltered, in document order
    pub links: Vec<String>,
    pub iframe_sources: Vec<String>,
    /// Cookies visible once the page settled
    pub cookies: Vec<CookieData>,
}

/// Loads pages for the orchestrator
///
/// Calls are strictly sequential; an implementation never sees two
/// outstanding fetches.
#[async_trait(?Send)]
pub trait PageFetcher {
    /// Navigate to `url` and report what the page exposes
    async fn fetch(&mut self, url: &str) -> CrawlResult<FetchedPage>;

    /// Release the underlying engine
    async fn close(&mut self) -> CrawlResult<()> {
        Ok(())
    }
}
