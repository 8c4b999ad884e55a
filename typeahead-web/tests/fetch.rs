use std::time::Duration;

use tokio_util::sync::CancellationToken;
use typeahead_common::SuggestionProvider;
use typeahead_web::{SuggestionFetcher, SuggestionSource};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher_for(server: &MockServer, timeout: Duration) -> SuggestionFetcher {
    SuggestionFetcher::new(timeout)
        .unwrap()
        .with_base_url(&server.uri())
        .unwrap()
}

#[tokio::test]
async fn fetches_and_parses_duckduckgo() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ac/"))
        .and(query_param("q", "cat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"[{"phrase":"cats"},{"phrase":"cat food"}]"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, Duration::from_secs(5));
    let out = fetcher
        .fetch("cat", SuggestionProvider::DuckDuckGo, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(out, vec!["cats", "cat food"]);
}

#[tokio::test]
async fn server_error_yields_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, Duration::from_secs(5));
    let out = fetcher
        .fetch("cat", SuggestionProvider::Ecosia, &CancellationToken::new())
        .await
        .unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn slow_provider_times_out_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"suggestions":["cats"]}"#)
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, Duration::from_millis(100));
    let out = fetcher
        .fetch("cat", SuggestionProvider::Ecosia, &CancellationToken::new())
        .await
        .unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn cancellation_abandons_the_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"suggestions":["cats"]}"#)
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, Duration::from_secs(10));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let out = fetcher
        .fetch("cat", SuggestionProvider::Ecosia, &cancel)
        .await
        .unwrap();
    assert!(out.is_empty());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn unparseable_body_is_empty_not_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sg/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let fetcher = fetcher_for(&server, Duration::from_secs(5));
    let out = fetcher
        .fetch("cat", SuggestionProvider::Yahoo, &CancellationToken::new())
        .await
        .unwrap();
    assert!(out.is_empty());
}
