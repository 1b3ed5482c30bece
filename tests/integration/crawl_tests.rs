//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small site and run the full crawl
//! cycle end-to-end, corpus file included.

use site_digest::config::{Config, CrawlerConfig, OutputConfig};
use site_digest::crawler::{run_crawl, RobotsStatus};
use site_digest::storage::{CorpusStore, JsonStorage};
use site_digest::ContentNode;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `dir` with no politeness delay
fn create_test_config(dir: &TempDir, max_pages: usize) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_pages,
            delay_ms: 0,
            ..CrawlerConfig::default()
        },
        output: OutputConfig {
            directory: dir.path().to_string_lossy().into_owned(),
            ..OutputConfig::default()
        },
        ..Config::default()
    }
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"),
    )
    .await;

    mount_page(
        &server,
        "/",
        &format!(
            r#"<html><head><title>Home</title></head><body><main>
            <h1>Welcome</h1>
            <p>Our catalogue of widgets.</p>
            <a href="/products">Products</a>
            <a href="{}/about#team">About</a>
            <a href="https://elsewhere.example.org/">Partner</a>
            </main></body></html>"#,
            base
        ),
    )
    .await;

    mount_page(
        &server,
        "/products",
        r#"<html><head><title>Products</title></head><body><main>
        <h2>Widgets</h2>
        <ul><li>Small widget</li><li>Large widget</li></ul>
        <a href="/">Home</a>
        <a href="/about">About</a>
        </main></body></html>"#,
    )
    .await;

    mount_page(
        &server,
        "/about",
        r#"<html><head><title>About</title></head><body><main>
        <p>We make widgets.</p>
        </main></body></html>"#,
    )
    .await;

    let config = create_test_config(&dir, 10);
    let (corpus, report) = run_crawl(&config, &format!("{}/", base)).await.unwrap();

    assert_eq!(corpus.len(), 3);
    let urls: Vec<&str> = corpus.pages().map(|p| p.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            base.clone(),
            format!("{}/products", base),
            format!("{}/about", base)
        ]
    );

    let home = corpus.get("00000").unwrap();
    assert_eq!(home.title, "Home");
    assert!(home
        .content
        .iter()
        .any(|n| matches!(n, ContentNode::Heading { text, .. } if text == "Welcome")));

    assert_eq!(report.pages_stored, 3);
    assert_eq!(report.fetch_failures, 0);
    assert!(!report.budget_reached);
    assert!(report.links_rejected >= 1, "foreign link should be rejected");
    assert_eq!(report.robots_status, RobotsStatus::Loaded);

    // The corpus written to disk matches what was returned
    assert_eq!(report.corpus_path, dir.path().join(&config.output.corpus_file));
    let saved = JsonStorage::new(&report.corpus_path).load().unwrap();
    assert_eq!(saved.len(), 3);
    assert_eq!(saved.get("00002").unwrap().title, "About");
}

#[tokio::test]
async fn test_crawl_respects_robots_disallow() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
    )
    .await;

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
        <a href="/public">Public</a>
        <a href="/private/area">Private</a>
        </body></html>"#,
    )
    .await;
    mount_page(&server, "/public", "<html><head><title>Public</title></head><body><p>Open</p></body></html>").await;

    Mock::given(method("GET"))
        .and(path("/private/area"))
        .respond_with(html("<html><body>secret</body></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&dir, 10);
    let (corpus, report) = run_crawl(&config, &server.uri()).await.unwrap();

    assert_eq!(corpus.len(), 2);
    assert!(corpus.pages().all(|p| !p.url.contains("/private")));
    assert_eq!(report.links_rejected, 1);
}

#[tokio::test]
async fn test_unreachable_robots_allows_everything() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(&server, ResponseTemplate::new(500)).await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body><a href="/next">Next</a></body></html>"#,
    )
    .await;
    mount_page(&server, "/next", "<html><head><title>Next</title></head><body><p>Hi</p></body></html>").await;

    let config = create_test_config(&dir, 10);
    let (corpus, report) = run_crawl(&config, &server.uri()).await.unwrap();

    assert_eq!(corpus.len(), 2);
    assert!(matches!(report.robots_status, RobotsStatus::Unavailable(_)));
}

#[tokio::test]
async fn test_forbidden_robots_rejects_every_link() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(&server, ResponseTemplate::new(403)).await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
        <a href="/a">A</a><a href="/b">B</a>
        </body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html("<html><body>a</body></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&dir, 10);
    let (corpus, report) = run_crawl(&config, &server.uri()).await.unwrap();

    // The seed is always fetched; discovered links go through the rules
    assert_eq!(corpus.len(), 1);
    assert_eq!(report.links_rejected, 2);
    assert_eq!(report.links_enqueued, 0);
    assert_eq!(report.robots_status, RobotsStatus::Loaded);
}

#[tokio::test]
async fn test_non_html_and_failed_pages_are_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(&server, ResponseTemplate::new(404)).await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
        <a href="/feed">Feed</a>
        <a href="/missing">Missing</a>
        <a href="/ok">Ok</a>
        </body></html>"#,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"items": []}"#)
                .insert_header("content-type", "application/json"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_page(&server, "/ok", "<html><head><title>Ok</title></head><body><p>Fine</p></body></html>").await;

    let config = create_test_config(&dir, 10);
    let (corpus, report) = run_crawl(&config, &server.uri()).await.unwrap();

    assert_eq!(corpus.len(), 2);
    assert_eq!(report.fetch_failures, 2);
    assert_eq!(report.robots_status, RobotsStatus::Loaded);
}

#[tokio::test]
async fn test_duplicate_links_fetched_once_and_budget_enforced() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(&server, ResponseTemplate::new(404)).await;

    // Every page links to every other page, with variants that normalize alike
    let links = r#"<a href="/a">A</a><a href="/a/">A again</a><a href="/a#top">A top</a>
        <a href="/b">B</a><a href="/c">C</a><a href="/d">D</a>"#;
    mount_page(&server, "/", &format!("<html><head><title>Root</title></head><body>{}</body></html>", links)).await;
    for route in ["/a", "/b", "/c", "/d"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(html(&format!(
                "<html><head><title>{}</title></head><body>{}</body></html>",
                route, links
            )))
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }

    let config = create_test_config(&dir, 3);
    let (corpus, report) = run_crawl(&config, &server.uri()).await.unwrap();

    assert_eq!(corpus.len(), 3);
    assert!(report.budget_reached);

    let mut urls: Vec<&str> = corpus.pages().map(|p| p.url.as_str()).collect();
    urls.sort();
    urls.dedup();
    assert_eq!(urls.len(), 3, "no URL is stored twice");
}

#[tokio::test]
async fn test_invalid_start_url_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, 10);

    let result = run_crawl(&config, "ftp://example.com/").await;

    assert!(result.is_err());
    assert!(!dir.path().join(&config.output.corpus_file).exists());
}
