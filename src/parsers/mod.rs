pub mod html;


/// Link and iframe references pulled out of a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    /// Absolute `a[href]` targets in document order
    pub links: Vec<String>,
    /// Absolute `iframe[src]` values in document order
    pub iframes: Vec<String>,
}

impl Extracted {
    pub fn new(links: Vec<String>, iframes: Vec<String>) -> Self {
        Self { links, iframes }
    }
}
