use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CrawlResult;

/// Configuration for scoping discovered links
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlFilterConfig {
    /// Regex patterns for URLs to include (if empty, all same-origin URLs are included unless excluded)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns for URLs to exclude (these take precedence over include patterns)
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
}

/// Non-page resources: document downloads, calendar exports and pseudo links
pub fn default_exclude_patterns() -> Vec<String> {
    vec![
        r"(?i)\.(pdf|docx?|xlsx?|pptx?|odt|csv|zip|gz|rar)([?#].*)?$".to_string(),
        r"(?i)\.ics([?#].*)?$".to_string(),
        r"[?&](outlook-)?ical=".to_string(),
        r"^(mailto|tel|javascript):".to_string(),
    ]
}

impl Default for UrlFilterConfig {
    fn default() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

/// Decides which links found on a page become children in the tree
#[derive(Debug)]
pub struct UrlFilter {
    seed_url: String,
    include_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
}

impl UrlFilter {
    /// Create a filter for a crawl starting at `seed_url`
    pub fn new(seed_url: &str, config: &UrlFilterConfig) -> CrawlResult<Self> {
        let mut include_regexes = Vec::with_capacity(config.include_patterns.len());
        for pattern in &config.include_patterns {
            include_regexes.push(Regex::new(pattern)?);
        }

        let mut exclude_regexes = Vec::with_capacity(config.exclude_patterns.len());
        for pattern in &config.exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }

        Ok(Self {
            seed_url: seed_url.to_string(),
            include_regexes,
            exclude_regexes,
        })
    }

    pub fn seed_url(&self) -> &str {
        &self.seed_url
    }

    /// Determine if `link`, found on the page requested as `page_url` and
    /// loaded at `location`, should become a child of that page
    pub fn should_follow(&self, link: &str, page_url: &str, location: &Url) -> bool {
        // Exact string comparisons, no normalization
        if link == self.seed_url || link == page_url || link == location.as_str() {
            return false;
        }

        // Check regex exclusions (these take precedence)
        if self.exclude_regexes.iter().any(|re| re.is_match(link)) {
            return false;
        }

        // If include patterns are specified, at least one must match
        if !self.include_regexes.is_empty() && !self.include_regexes.iter().any(|re| re.is_match(link))
        {
            return false;
        }

        match Url::parse(link) {
            Ok(parsed) => parsed.origin() == location.origin(),
            Err(_) => false,
        }
    }

    /// Filter a page's raw links, keeping discovery order and dropping exact duplicates
    pub fn scope_links(&self, page_url: &str, location: &Url, links: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut scoped = Vec::new();
        for link in links {
            if !self.should_follow(link, page_url, location) {
                ::log::debug!("URL filter rejected: {}", link);
                continue;
            }
            if seen.insert(link.as_str()) {
                scoped.push(link.clone());
            }
        }
        scoped
    }
}
