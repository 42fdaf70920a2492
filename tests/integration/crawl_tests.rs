//! Integration tests for the crawler
//!
//! The first half drives the engine with an in-memory fetcher over small link
//! graphs. The second half uses wiremock to run the HTTP fetcher against a
//! mock server end-to-end.

use fanout_crawler::config::Config;
use fanout_crawler::crawler::{
    crawl, start_crawl, CannedFetcher, CrawlEngine, FetchError, Fetcher, HttpFetcher,
};
use fanout_crawler::url::LinkMode;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

fn engine(fetcher: &Arc<CannedFetcher>) -> CrawlEngine {
    CrawlEngine::new(Arc::clone(fetcher) as Arc<dyn Fetcher>)
}

fn url_set(pages: &[(String, String)]) -> HashSet<String> {
    pages.iter().map(|(url, _)| url.clone()).collect()
}

fn set(urls: &[&str]) -> HashSet<String> {
    urls.iter().map(|u| u.to_string()).collect()
}

/// The link graph from the classic Go tour crawler exercise
fn golang_fetcher() -> CannedFetcher {
    CannedFetcher::new()
        .with_page(
            "https://golang.org/",
            "The Go Programming Language",
            ["https://golang.org/pkg/", "https://golang.org/cmd/"],
        )
        .with_page(
            "https://golang.org/pkg/",
            "Packages",
            [
                "https://golang.org/",
                "https://golang.org/cmd/",
                "https://golang.org/pkg/fmt/",
                "https://golang.org/pkg/os/",
            ],
        )
        .with_page(
            "https://golang.org/pkg/fmt/",
            "Package fmt",
            ["https://golang.org/", "https://golang.org/pkg/"],
        )
        .with_page(
            "https://golang.org/pkg/os/",
            "Package os",
            ["https://golang.org/", "https://golang.org/pkg/"],
        )
}

// ===== Engine over canned link graphs =====

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_each_url_fetched_at_most_once() {
    // Complete graph: every node links to every node, so each URL is
    // discovered by every other page concurrently.
    let nodes: Vec<String> = (0..30).map(|i| format!("node-{}", i)).collect();
    let mut fetcher = CannedFetcher::new().with_latency(Duration::from_millis(1));
    for node in &nodes {
        fetcher = fetcher.with_page(node, node, nodes.clone());
    }
    let fetcher = Arc::new(fetcher);

    let report = tokio::time::timeout(TEST_TIMEOUT, engine(&fetcher).run("node-0", 4))
        .await
        .expect("crawl did not terminate");

    assert_eq!(report.pages.len(), nodes.len());
    for node in &nodes {
        assert_eq!(fetcher.calls(node), 1, "{} fetched more than once", node);
    }
    assert_eq!(report.stats.tasks_spawned, report.stats.tasks_finished());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_repeated_runs_never_double_fetch() {
    for _ in 0..25 {
        let fetcher = Arc::new(golang_fetcher());
        let report = engine(&fetcher).run("https://golang.org/", 6).await;

        assert_eq!(report.pages.len(), 4);
        assert!(fetcher.call_counts().values().all(|&n| n == 1));
    }
}

#[tokio::test]
async fn test_depth_bound_on_chain() {
    let fetcher = Arc::new(
        CannedFetcher::new()
            .with_page("A", "a", ["B"])
            .with_page("B", "b", ["C"])
            .with_page("C", "c", ["D"])
            .with_page("D", "d", ["E"])
            .with_page("E", "e", Vec::<String>::new()),
    );

    let report = engine(&fetcher).run("A", 3).await;

    assert_eq!(url_set(&report.pages), set(&["A", "B", "C"]));
    assert_eq!(fetcher.calls("D"), 0);
    assert_eq!(fetcher.calls("E"), 0);
    assert_eq!(report.stats.rejected_depth, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cycle_terminates() {
    let fetcher = CannedFetcher::new()
        .with_page("A", "a", ["B"])
        .with_page("B", "b", ["A"]);

    let pages = tokio::time::timeout(TEST_TIMEOUT, start_crawl("A", 100, fetcher))
        .await
        .expect("crawl of a cycle did not terminate");

    assert_eq!(url_set(&pages), set(&["A", "B"]));
}

#[tokio::test]
async fn test_snapshot_is_exactly_reachable_set() {
    let fetcher = CannedFetcher::new()
        .with_page("A", "a", ["B", "C"])
        .with_page("B", "b", ["D"])
        .with_page("C", "c", ["E"])
        .with_page("D", "d", Vec::<String>::new())
        .with_page("E", "e", Vec::<String>::new());

    let pages = start_crawl("A", 2, fetcher).await;

    assert_eq!(url_set(&pages), set(&["A", "B", "C"]));
}

#[tokio::test]
async fn test_depth_zero_seed_fetches_nothing() {
    let fetcher = Arc::new(CannedFetcher::new().with_page("A", "a", ["B"]));

    let report = engine(&fetcher).run("A", 0).await;

    assert!(report.pages.is_empty());
    assert_eq!(fetcher.total_calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fetch_failure_is_isolated() {
    let fetcher = Arc::new(
        CannedFetcher::new()
            .with_page("A", "a", ["B", "C"])
            .with_failure("B", 500)
            .with_page("C", "c", ["D", "B"])
            .with_page("D", "d", Vec::<String>::new()),
    );

    let report = engine(&fetcher).run("A", 3).await;

    assert_eq!(url_set(&report.pages), set(&["A", "C", "D"]));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "B");
    assert_eq!(fetcher.calls("B"), 1);
}

#[tokio::test]
async fn test_golang_graph() {
    let fetcher = Arc::new(golang_fetcher());

    let report = engine(&fetcher).run("https://golang.org/", 4).await;

    assert_eq!(
        url_set(&report.pages),
        set(&[
            "https://golang.org/",
            "https://golang.org/pkg/",
            "https://golang.org/pkg/fmt/",
            "https://golang.org/pkg/os/",
        ])
    );
    assert_eq!(
        report.failures,
        vec![(
            "https://golang.org/cmd/".to_string(),
            "not found: https://golang.org/cmd/".to_string()
        )]
    );
}

// ===== HTTP fetcher against a mock server =====

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

fn test_config(max_depth: u32, link_mode: LinkMode) -> Config {
    let mut config = Config::default();
    config.crawler.max_depth = max_depth;
    config.crawler.link_mode = link_mode;
    config.http.timeout_secs = 5;
    config.http.connect_timeout_secs = 2;
    config
}

#[tokio::test]
async fn test_full_http_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="{}/page1">Page 1</a>
            <a href="/page2">Page 2</a>
            <a href="/missing">Missing</a>
            </body></html>"#,
            base_url
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(
            r#"<html><body><a href="/">Home</a><a href="/page2/">Page 2</a></body></html>"#
                .to_string(),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html(
            r#"<html><body><a href="/page3">Too deep</a></body></html>"#.to_string(),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page3"))
        .respond_with(html("<html></html>".to_string()))
        .expect(0)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = crawl(&test_config(2, LinkMode::Full), &format!("{}/", base_url))
        .await
        .expect("crawl failed");

    let expected: HashSet<String> = ["/", "/page1", "/page2"]
        .iter()
        .map(|p| format!("{}{}", base_url, p))
        .collect();
    assert_eq!(url_set(&report.pages), expected);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].1.contains("404"));
}

#[tokio::test]
async fn test_origin_mode_collapses_site() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body><a href="/a">A</a><a href="/b">B</a></body></html>"#.to_string(),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html("<html></html>".to_string()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let report = crawl(&test_config(3, LinkMode::Origin), &format!("{}/a", base_url))
        .await
        .expect("crawl failed");

    assert_eq!(report.urls(), vec![base_url.as_str()]);
    assert_eq!(report.stats.rejected_duplicate, 1);
}

#[tokio::test]
async fn test_invalid_seed_is_rejected() {
    let result = crawl(&test_config(2, LinkMode::Full), "not a url").await;
    assert!(matches!(
        result,
        Err(fanout_crawler::CrawlError::InvalidSeed { .. })
    ));
}

#[tokio::test]
async fn test_http_fetcher_status_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&test_config(1, LinkMode::Full)).unwrap();
    let url = format!("{}/gone", mock_server.uri());
    let err = fetcher.fetch(&url).await.unwrap_err();

    assert_eq!(err, FetchError::Status { url, status: 410 });
}

#[tokio::test]
async fn test_http_fetcher_ignores_links_in_non_html() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"href": "<a href=\"/x\">x</a>"}"#, "application/json"),
        )
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&test_config(1, LinkMode::Full)).unwrap();
    let page = fetcher
        .fetch(&format!("{}/data.json", mock_server.uri()))
        .await
        .unwrap();

    assert!(page.links.is_empty());
    assert!(page.content.contains("href"));
}

#[tokio::test]
async fn test_http_fetcher_follows_redirects() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", "/new/"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new/"))
        .respond_with(html(r#"<a href="child">child</a>"#.to_string()))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&test_config(1, LinkMode::Full)).unwrap();
    let page = fetcher.fetch(&format!("{}/old", base_url)).await.unwrap();

    // Relative links resolve against the post-redirect URL
    assert_eq!(page.links, vec![format!("{}/new/child", base_url)]);
}
