use std::fmt::Display;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use fantoccini::cookies::Cookie;
use fantoccini::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::time::timeout;

use crate::config::{CrawlConfig, ExtractionMode};
use crate::crawlers::crawler::{FetchedPage, PageFetcher};
use crate::error::{CrawlError, CrawlResult};
use crate::parsers::{self, Extracted};
use crate::tree::CookieData;
use crate::utils::sanitize_filename;

/// Collects anchors and iframes from the live DOM, descending into open shadow roots.
const EXTRACT_SCRIPT: &str = r#"
const links = [];
const iframes = [];
const visit = (root) => {
    for (const el of root.querySelectorAll('*')) {
        if (el.tagName === 'A' && typeof el.href === 'string' && el.href) {
            links.push(el.href);
        } else if (el.tagName === 'IFRAME' && el.src) {
            iframes.push(el.src);
        }
        if (el.shadowRoot) {
            visit(el.shadowRoot);
        }
    }
};
visit(document);
return { links, iframes };
"#;

#[derive(Debug, Deserialize)]
struct ScriptExtraction {
    #[serde(default)]
    links: Vec<String>,
    #[serde(default)]
    iframes: Vec<String>,
}

/// Page fetcher driving a browser through a WebDriver server
pub struct WebDriverFetcher {
    client: Client,
    extraction: ExtractionMode,
    navigation_timeout: Option<Duration>,
    settle_delay: Duration,
    screenshot_dir: Option<PathBuf>,
    closed: bool,
}

impl WebDriverFetcher {
    /// Connects to the WebDriver instance named in `config`
    ///
    /// Screenshots are written to `screenshot_dir` when it is set.
    pub async fn connect(config: &CrawlConfig, screenshot_dir: Option<PathBuf>) -> CrawlResult<Self> {
        let mut builder = ClientBuilder::native();
        if config.headless {
            builder.capabilities(headless_capabilities());
        }

        let client = builder.connect(&config.webdriver_url).await.map_err(|e| {
            ::log::error!(
                "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
            );
            CrawlError::WebDriver(format!(
                "failed to connect to WebDriver at {}: {}",
                config.webdriver_url, e
            ))
        })?;
        ::log::debug!("Connected to WebDriver at {}", config.webdriver_url);

        if let Some(dir) = &screenshot_dir {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| CrawlError::file_system(dir, e))?;
        }

        Ok(Self {
            client,
            extraction: config.extraction,
            navigation_timeout: config.navigation_timeout(),
            settle_delay: config.settle_delay(),
            screenshot_dir,
            closed: false,
        })
    }

    /// Navigate, bounded by the configured timeout if any
    async fn navigate(&self, url: &str) -> CrawlResult<()> {
        bounded(url, self.navigation_timeout, self.client.goto(url)).await
    }

    async fn extract(&self, url: &str, location: &url::Url) -> CrawlResult<Extracted> {
        match self.extraction {
            ExtractionMode::Script => {
                let value = self
                    .client
                    .execute(EXTRACT_SCRIPT, Vec::new())
                    .await
                    .map_err(|e| CrawlError::navigation(url, format!("link query failed: {e}")))?;
                let found: ScriptExtraction = serde_json::from_value(value).map_err(|e| {
                    CrawlError::navigation(url, format!("unexpected link query result: {e}"))
                })?;
                Ok(Extracted::new(found.links, found.iframes))
            }
            ExtractionMode::Source => {
                let source = self
                    .client
                    .source()
                    .await
                    .map_err(|e| CrawlError::navigation(url, format!("getting source failed: {e}")))?;
                Ok(parsers::html::parse(&source, location))
            }
        }
    }

    /// Save a PNG of the current viewport; failures only cost the image
    async fn capture(&self, url: &str, dir: &Path) {
        let path = dir.join(format!("{}.png", sanitize_filename(url)));
        match self.client.screenshot().await {
            Ok(png) => {
                if let Err(e) = tokio::fs::write(&path, png).await {
                    ::log::warn!("Failed to write screenshot {}: {}", path.display(), e);
                }
            }
            Err(e) => ::log::warn!("Failed to capture screenshot of {}: {}", url, e),
        }
    }
}

#[async_trait(?Send)]
impl PageFetcher for WebDriverFetcher {
    async fn fetch(&mut self, url: &str) -> CrawlResult<FetchedPage> {
        let started = Instant::now();

        self.navigate(url).await?;
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        let location = self
            .client
            .current_url()
            .await
            .map_err(|e| CrawlError::navigation(url, e))?;
        let title = self
            .client
            .title()
            .await
            .map_err(|e| CrawlError::navigation(url, e))?;
        let extracted = self.extract(url, &location).await?;
        let cookies = self
            .client
            .get_all_cookies()
            .await
            .map_err(|e| CrawlError::navigation(url, format!("reading cookies failed: {e}")))?
            .iter()
            .map(cookie_data)
            .collect::<Vec<_>>();

        if let Some(dir) = &self.screenshot_dir {
            self.capture(url, dir).await;
        }

        ::log::debug!(
            "Fetched {} in {:.2} seconds: {} links, {} iframes, {} cookies",
            url,
            started.elapsed().as_secs_f64(),
            extracted.links.len(),
            extracted.iframes.len(),
            cookies.len()
        );

        Ok(FetchedPage {
            location,
            title,
            links: extracted.links,
            iframe_sources: extracted.iframes,
            cookies,
        })
    }

    async fn close(&mut self) -> CrawlResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.client
            .clone()
            .close()
            .await
            .map_err(|e| CrawlError::WebDriver(format!("failed to close session: {e}")))
    }
}

/// Await one navigation step for `url`
///
/// Both the step's own failure and running past `limit` become
/// `CrawlError::Navigation`, so the failure policy applies to either.
pub(crate) async fn bounded<T, E: Display>(
    url: &str,
    limit: Option<Duration>,
    step: impl Future<Output = Result<T, E>>,
) -> CrawlResult<T> {
    let result = match limit {
        Some(limit) => timeout(limit, step)
            .await
            .map_err(|_| CrawlError::navigation(url, format!("timed out after {:?}", limit)))?,
        None => step.await,
    };
    result.map_err(|e| CrawlError::navigation(url, e))
}

/// Capabilities asking Chrome and Firefox to run without a window
fn headless_capabilities() -> Map<String, Value> {
    let mut caps = Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({ "args": ["--headless=new", "--disable-gpu"] }),
    );
    caps.insert(
        "moz:firefoxOptions".to_string(),
        json!({ "args": ["-headless"] }),
    );
    caps
}

/// Convert a WebDriver cookie into the attributes recorded in `cookies.json`
pub fn cookie_data(cookie: &Cookie<'_>) -> CookieData {
    CookieData {
        name: cookie.name().to_string(),
        value: cookie.value().to_string(),
        domain: cookie.domain().map(str::to_string),
        path: cookie.path().map(str::to_string),
        secure: cookie.secure(),
        http_only: cookie.http_only(),
        same_site: cookie.same_site().map(|s| s.to_string()),
        expires: cookie
            .expires()
            .and_then(|e| e.datetime())
            .map(|t| t.unix_timestamp()),
    }
}
