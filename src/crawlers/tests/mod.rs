mod orchestrator_tests;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::crawlers::crawler::{FetchedPage, PageFetcher};
use crate::crawlers::web::bounded;
use crate::error::{CrawlError, CrawlResult};
use crate::tree::CookieData;

/// How long a stalled page is waited on before the fetch gives up
pub const STALL_LIMIT: Duration = Duration::from_millis(20);

/// In-memory site: URL -> page, with a shared log of every fetch
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    pages: HashMap<String, FetchedPage>,
    stalled: HashSet<String>,
    calls: Rc<RefCell<Vec<String>>>,
    closed: Rc<RefCell<bool>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page titled after its last path segment
    pub fn page(mut self, url: &str, links: &[&str]) -> Self {
        let title = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url).to_uppercase();
        self.pages.insert(
            url.to_string(),
            FetchedPage {
                location: Url::parse(url).unwrap(),
                title,
                links: links.iter().map(|s| s.to_string()).collect(),
                iframe_sources: Vec::new(),
                cookies: Vec::new(),
            },
        );
        self
    }

    pub fn with_cookies(mut self, url: &str, cookies: &[(&str, &str)]) -> Self {
        let page = self.pages.get_mut(url).unwrap();
        page.cookies = cookies
            .iter()
            .map(|(name, value)| CookieData::new(*name, *value))
            .collect();
        self
    }

    pub fn with_iframes(mut self, url: &str, sources: &[&str]) -> Self {
        let page = self.pages.get_mut(url).unwrap();
        page.iframe_sources = sources.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Pretend `url` redirected to `location`
    pub fn redirected(mut self, url: &str, location: &str) -> Self {
        let page = self.pages.get_mut(url).unwrap();
        page.location = Url::parse(location).unwrap();
        self
    }

    /// Make `url` hang until the navigation timeout fires
    pub fn stalled(mut self, url: &str) -> Self {
        self.stalled.insert(url.to_string());
        self
    }

    pub fn calls(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.calls)
    }

    pub fn closed(&self) -> Rc<RefCell<bool>> {
        Rc::clone(&self.closed)
    }
}

#[async_trait(?Send)]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&mut self, url: &str) -> CrawlResult<FetchedPage> {
        self.calls.borrow_mut().push(url.to_string());
        if self.stalled.contains(url) {
            let hang = std::future::pending::<Result<FetchedPage, String>>();
            return bounded(url, Some(STALL_LIMIT), hang).await;
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| CrawlError::navigation(url, "net::ERR_NAME_NOT_RESOLVED"))
    }

    async fn close(&mut self) -> CrawlResult<()> {
        *self.closed.borrow_mut() = true;
        Ok(())
    }
}
