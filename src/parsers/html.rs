use crate::parsers::Extracted;
use scraper::{Html, Selector};
use url::Url;

/// Parses serialized HTML and extracts anchors and iframes, resolved against `base`
///
/// Only the light DOM is visible here; content inside shadow roots is not
/// part of the page source.
pub fn parse(html: &str, base: &Url) -> Extracted {
    let doc = Html::parse_document(html);

    let base = document_base(&doc, base);

    let links = resolve_all(&doc, "a[href]", "href", &base);
    let iframes = resolve_all(&doc, "iframe[src]", "src", &base);

    ::log::debug!(
        "HTML parser found {} links and {} iframes",
        links.len(),
        iframes.len()
    );

    Extracted::new(links, iframes)
}

/// Honour a `<base href>` the way a browser does when resolving relative links
fn document_base(doc: &Html, fallback: &Url) -> Url {
    let selector = Selector::parse("base[href]").expect("static selector");
    doc.select(&selector)
        .next()
        .and_then(|e| e.value().attr("href"))
        .and_then(|href| fallback.join(href.trim()).ok())
        .unwrap_or_else(|| fallback.clone())
}

fn resolve_all(doc: &Html, selector: &str, attr: &str, base: &Url) -> Vec<String> {
    let selector = Selector::parse(selector).expect("static selector");
    doc.select(&selector)
        .filter_map(|e| e.value().attr(attr))
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .filter_map(|raw| base.join(raw).ok())
        .map(|u| u.to_string())
        .collect()
}
