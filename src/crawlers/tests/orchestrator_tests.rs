use super::ScriptedFetcher;
use crate::config::FailurePolicy;
use crate::crawlers::orchestrator::{CrawlOutcome, Orchestrator};
use crate::error::CrawlError;
use crate::filter::{UrlFilter, UrlFilterConfig};
use crate::tree::PageNode;

const A: &str = "https://example.com/a";
const B: &str = "https://example.com/b";
const C: &str = "https://example.com/c";
const D: &str = "https://example.com/d";
const E: &str = "https://example.com/e";

fn orchestrator(fetcher: ScriptedFetcher, seed: &str, max_depth: usize) -> Orchestrator<ScriptedFetcher> {
    let filter = UrlFilter::new(seed, &UrlFilterConfig::default()).unwrap();
    Orchestrator::new(fetcher, filter, max_depth)
}

async fn crawl(fetcher: ScriptedFetcher, seed: &str, max_depth: usize) -> CrawlOutcome {
    orchestrator(fetcher, seed, max_depth).run().await.unwrap()
}

fn urls(nodes: &[PageNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.url.as_str()).collect()
}

fn abc_site() -> ScriptedFetcher {
    ScriptedFetcher::new()
        .page(A, &[B, C])
        .page(B, &[A])
        .page(C, &[B])
}

#[tokio::test]
async fn test_seed_link_filtered_and_depth_bound_respected() {
    let fetcher = abc_site();
    let calls = fetcher.calls();
    let outcome = crawl(fetcher, A, 1).await;
    let root = &outcome.root;

    assert_eq!(root.title.as_deref(), Some("A"));
    assert_eq!(urls(root.children()), vec![B, C]);

    let b = &root.children()[0];
    assert_eq!(b.title.as_deref(), Some("B"));
    assert_eq!(b.children, Some(Vec::new()));

    // c sits at the depth limit: its child is one hop too deep to be touched
    let c = &root.children()[1];
    assert_eq!(c.title.as_deref(), Some("C"));
    assert_eq!(urls(c.children()), vec![B]);
    assert!(c.children()[0].is_stub());

    assert_eq!(*calls.borrow(), vec![A, B, C]);
}

#[tokio::test]
async fn test_revisit_within_depth_copies_title() {
    let fetcher = abc_site();
    let calls = fetcher.calls();
    let outcome = crawl(fetcher, A, 2).await;

    let c = &outcome.root.children()[1];
    let b_again = &c.children()[0];
    assert_eq!(b_again.url, B);
    assert_eq!(b_again.title.as_deref(), Some("B"));
    assert_eq!(b_again.children, Some(Vec::new()));

    assert_eq!(*calls.borrow(), vec![A, B, C]);
}

#[tokio::test]
async fn test_each_url_fetched_at_most_once() {
    let fetcher = ScriptedFetcher::new()
        .page(A, &[B, C, D])
        .page(B, &[D, C])
        .page(C, &[D, B])
        .page(D, &[B, C]);
    let calls = fetcher.calls();
    let outcome = crawl(fetcher, A, 6).await;

    assert_eq!(*calls.borrow(), vec![A, B, D, C]);
    assert_eq!(outcome.pages_fetched, 4);
    assert_eq!(outcome.context.visited.len(), 4);

    let nodes = outcome.root.walk();
    assert!(nodes.len() > 4);
    for (_, node) in nodes {
        assert!(outcome.context.visited.contains(&node.url), "{}", node.url);
    }
}

#[tokio::test]
async fn test_revisit_backfills_exactly_one_level() {
    let fetcher = ScriptedFetcher::new()
        .page(A, &[B, C])
        .page(B, &[D])
        .page(D, &[E])
        .page(E, &[])
        .page(C, &[B]);
    let outcome = crawl(fetcher, A, 5).await;

    let c = &outcome.root.children()[1];
    let b_again = &c.children()[0];
    assert_eq!(b_again.title.as_deref(), Some("B"));

    let d_under_reused_b = &b_again.children()[0];
    assert_eq!(d_under_reused_b.url, D);
    assert_eq!(d_under_reused_b.title.as_deref(), Some("D"));
    // d's own children are known but intentionally not copied
    assert!(d_under_reused_b.children.is_none());

    // the original occurrence keeps its full subtree
    let d = &outcome.root.children()[0].children()[0];
    assert_eq!(urls(d.children()), vec![E]);
}

#[tokio::test]
async fn test_no_page_is_its_own_child_and_seed_never_reappears() {
    let fetcher = ScriptedFetcher::new()
        .page(A, &[A, B])
        .page(B, &[B, A, C])
        .page(C, &[A, "https://example.com/a?ref=c"])
        .page("https://example.com/a?ref=c", &[]);
    let outcome = crawl(fetcher, A, 4).await;

    for (depth, node) in outcome.root.walk() {
        for child in node.children() {
            assert_ne!(child.url, node.url);
            assert_ne!(child.url, A);
        }
        if depth > 0 {
            assert_ne!(node.url, A);
        }
    }
    // exact string equality: a query variant of the seed is a different page
    let c = &outcome.root.children()[0].children()[0];
    assert_eq!(urls(c.children()), vec!["https://example.com/a?ref=c"]);
}

#[tokio::test]
async fn test_nothing_beyond_max_depth_is_populated() {
    let fetcher = ScriptedFetcher::new()
        .page(A, &[B])
        .page(B, &[C])
        .page(C, &[D])
        .page(D, &[E])
        .page(E, &[]);
    let calls = fetcher.calls();

    for max_depth in 0..4 {
        calls.borrow_mut().clear();
        let outcome = crawl(fetcher.clone(), A, max_depth).await;
        for (depth, node) in outcome.root.walk() {
            if depth > max_depth {
                assert!(node.is_stub(), "depth {depth} node {} populated", node.url);
            }
        }
        assert_eq!(calls.borrow().len(), max_depth + 1);
    }
}

#[tokio::test]
async fn test_page_reused_at_max_depth_exposes_no_deeper_titles() {
    let fetcher = ScriptedFetcher::new()
        .page(A, &[B, C])
        .page(B, &[D])
        .page(D, &[])
        .page(C, &[B]);
    let calls = fetcher.calls();
    let outcome = crawl(fetcher, A, 2).await;

    for (depth, node) in outcome.root.walk() {
        if depth > 2 {
            assert!(node.is_stub(), "depth {depth} node {} populated", node.url);
        }
    }

    // b is reused at the limit: its title is copied, its child stays bare
    let b_again = &outcome.root.children()[1].children()[0];
    assert_eq!(b_again.url, B);
    assert_eq!(b_again.title.as_deref(), Some("B"));
    assert_eq!(urls(b_again.children()), vec![D]);
    assert!(b_again.children()[0].is_stub());

    // the first occurrence still shows d as fetched
    let d = &outcome.root.children()[0].children()[0];
    assert_eq!(d.title.as_deref(), Some("D"));
    assert_eq!(*calls.borrow(), vec![A, B, D, C]);
}

#[tokio::test]
async fn test_duplicate_and_out_of_scope_links_dropped() {
    let fetcher = ScriptedFetcher::new().page(
        A,
        &[
            C,
            B,
            C,
            "https://other.org/x",
            "https://example.com/files/report.pdf",
        ],
    );
    let outcome = crawl(fetcher, A, 0).await;

    assert_eq!(urls(outcome.root.children()), vec![C, B]);
    assert!(outcome.root.children().iter().all(PageNode::is_stub));
}

#[tokio::test]
async fn test_links_scoped_to_location_after_redirect() {
    let fetcher = ScriptedFetcher::new()
        .page(A, &["https://www.example.com/x", B])
        .redirected(A, "https://www.example.com/a");
    let outcome = crawl(fetcher, A, 0).await;

    assert_eq!(urls(outcome.root.children()), vec!["https://www.example.com/x"]);
}

#[tokio::test]
async fn test_cookie_first_seen_follows_traversal_order() {
    let fetcher = ScriptedFetcher::new()
        .page(A, &[B, C])
        .page(B, &[D])
        .page(D, &[])
        .page(C, &[])
        .with_cookies(A, &[("session", "from-a")])
        .with_cookies(B, &[("session", "from-b"), ("cart", "from-b")])
        .with_cookies(D, &[("tracker", "from-d")])
        .with_cookies(C, &[("tracker", "from-c"), ("cart", "from-c")]);
    let outcome = crawl(fetcher, A, 3).await;
    let cookies = &outcome.context.cookies;

    assert_eq!(cookies.get("session").unwrap().first_found, A);
    assert_eq!(cookies.get("session").unwrap().cookie.value, "from-a");
    assert_eq!(cookies.get("cart").unwrap().first_found, B);
    // d is reached through b before c is visited
    assert_eq!(cookies.get("tracker").unwrap().first_found, D);

    let order: Vec<_> = cookies.iter().map(|(name, _)| name).collect();
    assert_eq!(order, vec!["session", "cart", "tracker"]);
}

#[tokio::test]
async fn test_iframe_first_seen() {
    let video = "https://player.example.net/embed/1";
    let fetcher = ScriptedFetcher::new()
        .page(A, &[B])
        .page(B, &[])
        .with_iframes(B, &[video, video])
        .with_iframes(A, &[video]);
    let outcome = crawl(fetcher, A, 1).await;

    let iframes = &outcome.context.iframes;
    assert_eq!(iframes.len(), 1);
    assert_eq!(iframes.get(video).unwrap().first_found, A);
}

#[tokio::test]
async fn test_memoized_page_contributes_no_new_artifacts() {
    let fetcher = ScriptedFetcher::new()
        .page(A, &[B, C])
        .page(B, &[])
        .page(C, &[B])
        .with_cookies(B, &[("b-only", "1")]);
    let outcome = crawl(fetcher, A, 3).await;

    let record = outcome.context.cookies.get("b-only").unwrap();
    assert_eq!(record.first_found, B);
    assert_eq!(outcome.context.cookies.len(), 1);
}

#[tokio::test]
async fn test_navigation_failure_aborts_by_default() {
    let fetcher = ScriptedFetcher::new().page(A, &[B, C]).page(C, &[]);
    let calls = fetcher.calls();
    let closed = fetcher.closed();

    let err = orchestrator(fetcher, A, 2).run().await.unwrap_err();
    assert!(matches!(err, CrawlError::Navigation { ref url, .. } if url == B));
    // c is never reached once b fails
    assert_eq!(*calls.borrow(), vec![A, B]);
    assert!(*closed.borrow());
}

#[tokio::test]
async fn test_leaf_policy_keeps_failed_page_once() {
    let fetcher = ScriptedFetcher::new().page(A, &[B, C]).page(C, &[B]);
    let calls = fetcher.calls();

    let outcome = orchestrator(fetcher, A, 3)
        .with_failure_policy(FailurePolicy::Leaf)
        .run()
        .await
        .unwrap();

    let b = &outcome.root.children()[0];
    assert!(b.error.as_deref().unwrap().contains("ERR_NAME_NOT_RESOLVED"));
    assert!(b.title.is_none() && b.children.is_none());

    let b_again = &outcome.root.children()[1].children()[0];
    assert_eq!(b_again.error, b.error);

    assert_eq!(*calls.borrow(), vec![A, B, C]);
}

#[tokio::test]
async fn test_timed_out_page_becomes_leaf_under_leaf_policy() {
    let fetcher = ScriptedFetcher::new()
        .page(A, &[B, C])
        .page(C, &[])
        .stalled(B);
    let calls = fetcher.calls();

    let outcome = orchestrator(fetcher, A, 2)
        .with_failure_policy(FailurePolicy::Leaf)
        .run()
        .await
        .unwrap();

    let b = &outcome.root.children()[0];
    assert!(b.error.as_deref().unwrap().contains("timed out"));
    assert!(b.title.is_none() && b.children.is_none());
    assert_eq!(outcome.root.children()[1].title.as_deref(), Some("C"));
    assert_eq!(*calls.borrow(), vec![A, B, C]);
}

#[tokio::test]
async fn test_timed_out_page_aborts_by_default() {
    let fetcher = ScriptedFetcher::new().page(A, &[B]).stalled(B);
    let closed = fetcher.closed();

    let err = orchestrator(fetcher, A, 2).run().await.unwrap_err();
    assert!(matches!(err, CrawlError::Navigation { ref url, ref reason } if url == B && reason.contains("timed out")));
    assert!(*closed.borrow());
}

#[tokio::test]
async fn test_crawl_beyond_limit_leaves_node_untouched() {
    let fetcher = abc_site();
    let calls = fetcher.calls();
    let mut orchestrator = orchestrator(fetcher, A, 1);

    let mut node = PageNode::stub(B);
    orchestrator.crawl(&mut node, 2).await.unwrap();

    assert!(node.is_stub());
    assert!(calls.borrow().is_empty());
    assert!(orchestrator.context().visited.is_empty());
    assert_eq!(orchestrator.pages_fetched(), 0);
}

#[tokio::test]
async fn test_identical_sites_serialize_identically() {
    let first = crawl(abc_site(), A, 3).await;
    let second = crawl(abc_site(), A, 3).await;

    assert_eq!(
        serde_json::to_string_pretty(&first.root).unwrap(),
        serde_json::to_string_pretty(&second.root).unwrap()
    );
}
