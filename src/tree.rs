use serde::{Deserialize, Serialize};

/// One page in the crawl tree
///
/// A freshly discovered link is a stub carrying only its `url`. `title` and
/// `children` stay `None` until the page is fetched or copied from an earlier
/// visit of the same URL, so a stub and a fetched page without links
/// serialize differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageNode {
    /// Exact navigation target
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<PageNode>>,

    /// Set when the page could not be loaded and was kept as a leaf
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageNode {
    /// Create an unexplored stub for `url`
    pub fn stub(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            children: None,
            error: None,
        }
    }

    /// Children of this node, empty for stubs
    pub fn children(&self) -> &[PageNode] {
        self.children.as_deref().unwrap_or_default()
    }

    /// Whether this node was never fetched nor filled from the registry
    pub fn is_stub(&self) -> bool {
        self.title.is_none() && self.children.is_none() && self.error.is_none()
    }

    /// Follow a path of child indices down from this node
    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut PageNode> {
        let mut node = self;
        for &index in path {
            node = node.children.as_mut()?.get_mut(index)?;
        }
        Some(node)
    }

    /// This node and every descendant in depth-first pre-order, paired with
    /// their depth below this node
    pub fn walk(&self) -> Vec<(usize, &PageNode)> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.children().iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}

/// Cookie attributes as reported by the browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieData {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
    /// Expiry as unix seconds; absent for session cookies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,
}

impl CookieData {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            secure: None,
            http_only: None,
            same_site: None,
            expires: None,
        }
    }
}

/// A cookie together with the page it was first seen on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    #[serde(flatten)]
    pub cookie: CookieData,
    pub first_found: String,
}

/// An iframe source together with the page it was first seen on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IframeRecord {
    pub src: String,
    pub first_found: String,
}
