use std::time::Duration;

use typeahead_http::{HttpClient, HttpError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn returns_body_text_for_non_json_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/complete"))
        .and(query_param("q", "cat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("window.google.ac.h([])", "text/javascript; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let client = HttpClient::new(Duration::from_secs(5)).unwrap();
    let body = client
        .get_text(&format!("{}/complete?q=cat", server.uri()))
        .await
        .expect("body");
    assert_eq!(body, "window.google.ac.h([])");
}

#[tokio::test]
async fn error_status_is_reported_after_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(Duration::from_secs(5)).unwrap();
    let err = client
        .get_text(&format!("{}/busy", server.uri()))
        .await
        .unwrap_err();
    match err {
        HttpError::Status { status, message } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(message, "try later");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn slow_responses_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = HttpClient::new(Duration::from_millis(50)).unwrap();
    let err = client
        .get_text(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Timeout(_)), "got {err}");
    assert!(!err.is_request_error());
}
