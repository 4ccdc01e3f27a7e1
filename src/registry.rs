use std::collections::HashMap;

use serde::{Serialize, Serializer};

use crate::tree::{CookieData, CookieRecord, IframeRecord, PageNode};

/// What the crawl learned about a URL the first time it was fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitedPage {
    pub title: Option<String>,
    /// Child URLs in discovery order
    pub children: Vec<String>,
    pub error: Option<String>,
}

impl VisitedPage {
    /// Snapshot a node right after its fresh fetch
    pub fn from_node(node: &PageNode) -> Self {
        Self {
            title: node.title.clone(),
            children: node.children().iter().map(|c| c.url.clone()).collect(),
            error: node.error.clone(),
        }
    }
}

/// URL -> page record for every URL fetched during the run
///
/// Entries are written once and never replaced or removed.
#[derive(Debug, Default)]
pub struct VisitedRegistry {
    pages: HashMap<String, VisitedPage>,
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.pages.contains_key(url)
    }

    pub fn get(&self, url: &str) -> Option<&VisitedPage> {
        self.pages.get(url)
    }

    /// Record `url`; returns false and leaves the first entry in place if already present
    pub fn insert(&mut self, url: &str, page: VisitedPage) -> bool {
        if self.pages.contains_key(url) {
            ::log::warn!("Ignoring second registry write for {}", url);
            return false;
        }
        self.pages.insert(url.to_string(), page);
        true
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Fill `node` from the registry entry for its URL
    ///
    /// With `backfill_children`, children receive their own titles when those
    /// URLs are known too, but nothing below them: a reused node exposes one
    /// extra level only. Without it children stay bare stubs, which is what a
    /// node at the depth limit gets. Returns false when the URL has not been
    /// visited.
    pub fn fill_from_memo(&self, node: &mut PageNode, backfill_children: bool) -> bool {
        let Some(page) = self.pages.get(&node.url) else {
            return false;
        };

        node.title = page.title.clone();
        node.error = page.error.clone();
        if page.error.is_some() {
            node.children = None;
            return true;
        }

        let children = page
            .children
            .iter()
            .map(|url| {
                let mut child = PageNode::stub(url.as_str());
                if backfill_children {
                    if let Some(known) = self.pages.get(url) {
                        child.title = known.title.clone();
                    }
                }
                child
            })
            .collect();
        node.children = Some(children);
        true
    }
}

/// Insertion-ordered, write-once map used for first-seen artifacts
#[derive(Debug, Clone)]
pub struct FirstSeen<R> {
    index: HashMap<String, usize>,
    entries: Vec<(String, R)>,
}

impl<R> Default for FirstSeen<R> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<R> FirstSeen<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `record` under `key` unless the key was already seen.
    /// The record is only built when the key is new.
    pub fn observe(&mut self, key: &str, record: impl FnOnce() -> R) -> bool {
        if self.index.contains_key(key) {
            return false;
        }
        self.index.insert(key.to_string(), self.entries.len());
        self.entries.push((key.to_string(), record()));
        true
    }

    pub fn get(&self, key: &str) -> Option<&R> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &R)> {
        self.entries.iter().map(|(k, r)| (k.as_str(), r))
    }
}

impl<R: Serialize> Serialize for FirstSeen<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

pub type CookieRegistry = FirstSeen<CookieRecord>;
pub type IframeRegistry = FirstSeen<IframeRecord>;

/// State owned by one crawl run
#[derive(Debug, Default)]
pub struct CrawlContext {
    pub visited: VisitedRegistry,
    pub cookies: CookieRegistry,
    pub iframes: IframeRegistry,
}

impl CrawlContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every cookie whose name was not seen before
    pub fn record_cookies(&mut self, page_url: &str, cookies: Vec<CookieData>) -> usize {
        let mut added = 0;
        for cookie in cookies {
            let name = cookie.name.clone();
            if self.cookies.observe(&name, || CookieRecord {
                cookie,
                first_found: page_url.to_string(),
            }) {
                ::log::debug!("New cookie {} on {}", name, page_url);
                added += 1;
            }
        }
        added
    }

    /// Register every iframe source not seen before
    pub fn record_iframes(&mut self, page_url: &str, sources: &[String]) -> usize {
        let mut added = 0;
        for src in sources {
            if self.iframes.observe(src, || IframeRecord {
                src: src.clone(),
                first_found: page_url.to_string(),
            }) {
                ::log::debug!("New iframe {} on {}", src, page_url);
                added += 1;
            }
        }
        added
    }
}
