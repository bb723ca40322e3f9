//! Integration tests for the HTTP-backed renderer
//!
//! These use wiremock to serve the trending page and run full cycles against
//! an on-disk database.

use hotlist::config::Config;
use hotlist::crawler::{CrawlCycle, HttpRenderer};
use hotlist::storage::{ConfigDefaults, ItemQuery, SqliteStorage, Storage};
use hotlist::{CycleOutcome, ErrorKind};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOT_PAGE: &str = r#"<html><head><title>Hot</title></head><body>
    <section class="HotItem">
      <div class="HotItem-content">
        <a href="/question/101"><h2 class="HotItem-title">First question</h2></a>
        <p class="HotItem-excerpt">What happened first</p>
        <div class="HotItem-metrics">1024 万热度 分享</div>
      </div>
    </section>
    <section class="HotItem">
      <div class="HotItem-content">
        <a href="/question/102/"><h2 class="HotItem-title">Second question</h2></a>
        <div class="HotItem-metrics">512 万热度 分享</div>
      </div>
    </section>
    <section class="HotItem">
      <div class="HotItem-content">
        <a href="/question/103"><h2 class="HotItem-title">Third question</h2></a>
        <div class="HotItem-metrics">256 万热度</div>
      </div>
    </section>
    </body></html>"#;

/// Creates a configuration pointing at the mock server
fn create_test_config(base_url: &str, temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.target.url = format!("{}/hot", base_url);
    config.target.cookie_domain = "127.0.0.1".to_string();
    config.crawler.timeout = 5_000;
    config.output.database_path = temp_dir
        .path()
        .join("data")
        .join("hotlist.db")
        .to_string_lossy()
        .to_string();
    config
}

fn open_cycle(config: &Config, cookies: &str, fetch_count: &str) -> CrawlCycle {
    let mut storage = SqliteStorage::new(
        std::path::Path::new(&config.output.database_path),
        &ConfigDefaults::from(&config.crawler),
    )
    .expect("Failed to open storage");
    storage.update_config("cookies", cookies).unwrap();
    storage.update_config("fetchCount", fetch_count).unwrap();

    let renderer = HttpRenderer::with_user_agent(&config.crawler.user_agent)
        .expect("Failed to build renderer");
    CrawlCycle::from_config(config, Arc::new(Mutex::new(storage)), Arc::new(renderer))
}

#[tokio::test]
async fn test_full_cycle_over_http() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/hot"))
        .and(header("cookie", "z_c0=abc; d_c0=x=y"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(HOT_PAGE)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, &temp_dir);
    let cycle = open_cycle(&config, "z_c0=abc; d_c0=x=y", "2");

    assert_eq!(
        cycle.run().await,
        CycleOutcome::Success {
            item_count: 2,
            inserted_count: 2
        }
    );
    assert_eq!(
        cycle.run().await,
        CycleOutcome::Success {
            item_count: 2,
            inserted_count: 0
        }
    );

    let storage = cycle.storage().lock().unwrap();
    let items = storage.list_items(&ItemQuery::default()).unwrap();
    assert_eq!(items.len(), 2);

    let first = &items[0];
    assert_eq!(first.external_id, "101");
    assert_eq!(first.url, format!("{}/question/101", base_url));
    assert_eq!(first.title, "First question");
    assert_eq!(first.excerpt, "What happened first");
    assert_eq!(first.heat, "1024 万热度");
    assert_eq!(first.rank, 1);

    let second = &items[1];
    assert_eq!(second.external_id, "102");
    assert_eq!(second.excerpt, "");
    assert_eq!(second.rank, 2);

    assert!(temp_dir.path().join("data").join("hotlist.db").exists());
}

#[tokio::test]
async fn test_signin_redirect_over_http() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/hot"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "/signin?next=%2Fhot"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><form class=\"SignFlow\"></form></body></html>",
        ))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &temp_dir);
    let cycle = open_cycle(&config, "z_c0=expired", "20");

    let outcome = cycle.run().await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::AuthenticationRequired));
    assert!(outcome.to_string().contains("/signin"));
}

#[tokio::test]
async fn test_page_without_list_is_content_not_found() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/hot"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body><p>Nothing</p></body></html>"),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &temp_dir);
    let cycle = open_cycle(&config, "", "20");

    let outcome = cycle.run().await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::ContentNotFound));
}

#[tokio::test]
async fn test_server_error_is_transport_failure() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/hot"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), &temp_dir);
    let cycle = open_cycle(&config, "", "20");

    let outcome = cycle.run().await;

    assert_eq!(outcome.error_kind(), Some(ErrorKind::TransportFailure));
    let storage = cycle.storage().lock().unwrap();
    assert!(storage.list_items(&ItemQuery::default()).unwrap().is_empty());
}

#[tokio::test]
async fn test_cookies_for_other_domains_are_not_sent() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/hot"))
        .and(header("cookie", "z_c0=abc"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/hot"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HOT_PAGE))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), &temp_dir);
    config.target.cookie_domain = ".zhihu.com".to_string();
    let cycle = open_cycle(&config, "z_c0=abc", "1");

    let outcome = cycle.run().await;

    assert!(outcome.is_success(), "{}", outcome);
}
