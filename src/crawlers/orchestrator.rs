use crate::config::FailurePolicy;
use crate::crawlers::crawler::{FetchedPage, PageFetcher};
use crate::error::CrawlResult;
use crate::filter::UrlFilter;
use crate::registry::{CrawlContext, VisitedPage};
use crate::tree::PageNode;

/// Result of a completed traversal
#[derive(Debug)]
pub struct CrawlOutcome {
    pub root: PageNode,
    pub context: CrawlContext,
    /// Number of fetcher invocations, failed ones included
    pub pages_fetched: usize,
}

/// Depth-bounded, memoizing traversal driver
///
/// Pages are visited depth-first in pre-order: a page is fetched and
/// registered, then each of its children is explored to exhaustion before
/// the next sibling starts. A URL already in the visited registry is filled
/// from there and never fetched again.
pub struct Orchestrator<F: PageFetcher> {
    fetcher: F,
    filter: UrlFilter,
    max_depth: usize,
    on_fetch_error: FailurePolicy,
    context: CrawlContext,
    pages_fetched: usize,
}

impl<F: PageFetcher> Orchestrator<F> {
    pub fn new(fetcher: F, filter: UrlFilter, max_depth: usize) -> Self {
        Self {
            fetcher,
            filter,
            max_depth,
            on_fetch_error: FailurePolicy::Abort,
            context: CrawlContext::new(),
            pages_fetched: 0,
        }
    }

    /// Choose what happens when a navigation fails
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_fetch_error = policy;
        self
    }

    pub fn context(&self) -> &CrawlContext {
        &self.context
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Crawl from the filter's seed URL at depth 0, then release the fetcher
    pub async fn run(mut self) -> CrawlResult<CrawlOutcome> {
        let mut root = PageNode::stub(self.filter.seed_url());
        let crawled = self.crawl(&mut root, 0).await;

        // Close the session even when the crawl failed; the crawl error wins
        let closed = self.fetcher.close().await;
        crawled?;
        if let Err(e) = closed {
            ::log::warn!("Failed to close fetcher: {}", e);
        }

        Ok(CrawlOutcome {
            root,
            context: self.context,
            pages_fetched: self.pages_fetched,
        })
    }

    /// Populate `node`, found at `depth`, and everything reachable below it
    ///
    /// Works through an explicit stack of (path below `node`, depth) pairs;
    /// children are pushed in reverse so they pop in discovery order.
    pub async fn crawl(&mut self, node: &mut PageNode, depth: usize) -> CrawlResult<()> {
        let mut stack: Vec<(Vec<usize>, usize)> = vec![(Vec::new(), depth)];

        while let Some((path, depth)) = stack.pop() {
            let Some(target) = node.descendant_mut(&path) else {
                continue;
            };

            if !self.visit(target, depth).await? {
                continue;
            }

            for index in (0..target.children().len()).rev() {
                let mut child_path = path.clone();
                child_path.push(index);
                stack.push((child_path, depth + 1));
            }
        }

        Ok(())
    }

    /// Handle one node without descending; returns true when its children
    /// still have to be crawled
    async fn visit(&mut self, node: &mut PageNode, depth: usize) -> CrawlResult<bool> {
        if depth > self.max_depth {
            ::log::trace!("Depth {} exceeds limit, leaving stub: {}", depth, node.url);
            return Ok(false);
        }

        // children of a node at the limit are past it and stay bare
        let backfill = depth < self.max_depth;
        if self.context.visited.fill_from_memo(node, backfill) {
            ::log::info!("Reusing {}", node.url);
            return Ok(false);
        }

        ::log::info!("Loading {} (depth {})", node.url, depth);
        self.pages_fetched += 1;
        match self.fetcher.fetch(&node.url).await {
            Ok(page) => {
                self.register(node, page);
                Ok(true)
            }
            Err(e) if e.is_navigation() && self.on_fetch_error == FailurePolicy::Leaf => {
                ::log::warn!("Keeping {} as a failed leaf: {}", node.url, e);
                node.title = None;
                node.children = None;
                node.error = Some(e.to_string());
                self.context
                    .visited
                    .insert(&node.url, VisitedPage::from_node(node));
                Ok(false)
            }
            Err(e) => {
                ::log::error!("Aborting crawl at {}: {}", node.url, e);
                Err(e)
            }
        }
    }

    /// Apply a fresh fetch to `node` and the registries
    fn register(&mut self, node: &mut PageNode, page: FetchedPage) {
        let links = self
            .filter
            .scope_links(&node.url, &page.location, &page.links);
        ::log::debug!(
            "{}: {} of {} links in scope",
            node.url,
            links.len(),
            page.links.len()
        );

        node.title = Some(page.title);
        node.children = Some(links.into_iter().map(PageNode::stub).collect());

        self.context.record_iframes(&node.url, &page.iframe_sources);
        self.context.record_cookies(&node.url, page.cookies);
        self.context
            .visited
            .insert(&node.url, VisitedPage::from_node(node));
    }
}
