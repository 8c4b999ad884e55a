use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use typeahead_drivers::browser::{BrowserBackend, BrowserOptions, BrowserSession, PageHandle};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const SESSION: &str = "s-1";

/// Window bookkeeping of a W3C WebDriver endpoint: one current browsing
/// context per session, and commands against a closed context fail.
#[derive(Debug)]
struct Windows {
    current: String,
    open: Vec<String>,
    next: usize,
    rejected: usize,
}

#[derive(Clone)]
struct FakeDriver(Arc<Mutex<Windows>>);

impl FakeDriver {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Windows {
            current: "home".into(),
            open: vec!["home".into()],
            next: 0,
            rejected: 0,
        })))
    }
}

fn value(v: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "value": v }))
}

fn no_such_window(w: &mut Windows) -> ResponseTemplate {
    w.rejected += 1;
    ResponseTemplate::new(404).set_body_json(json!({
        "value": {
            "error": "no such window",
            "message": "target window already closed",
            "stacktrace": ""
        }
    }))
}

impl Respond for FakeDriver {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut w = self.0.lock().unwrap();
        let session = format!("/session/{SESSION}");
        let path = request.url.path();
        let route = path.strip_prefix(session.as_str());
        match (request.method.as_str(), path, route) {
            ("POST", "/session", _) => value(json!({
                "sessionId": SESSION,
                "capabilities": { "browserName": "chrome" }
            })),
            ("GET", _, Some("/window")) => value(json!(w.current)),
            ("POST", _, Some("/window/new")) => {
                if !w.open.contains(&w.current) {
                    return no_such_window(&mut w);
                }
                w.next += 1;
                let handle = format!("tab-{}", w.next);
                w.open.push(handle.clone());
                value(json!({ "handle": handle, "type": "tab" }))
            }
            ("POST", _, Some("/window")) => {
                let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
                let handle = body["handle"].as_str().unwrap_or_default().to_string();
                if !w.open.contains(&handle) {
                    return no_such_window(&mut w);
                }
                w.current = handle;
                value(Value::Null)
            }
            ("DELETE", _, Some("/window")) => {
                if !w.open.contains(&w.current) {
                    return no_such_window(&mut w);
                }
                let current = w.current.clone();
                w.open.retain(|h| *h != current);
                value(json!(w.open))
            }
            _ => value(Value::Null),
        }
    }
}

async fn session_against(driver: &FakeDriver) -> (MockServer, BrowserSession) {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(driver.clone())
        .mount(&server)
        .await;
    let session = BrowserSession::new(BrowserOptions {
        webdriver_url: server.uri(),
        headless: true,
        extra_args: Vec::new(),
        navigation_timeout: Duration::from_secs(1),
    });
    (server, session)
}

#[tokio::test]
async fn pages_open_after_earlier_tabs_were_closed() {
    let driver = FakeDriver::new();
    let (_server, session) = session_against(&driver).await;

    let first = session.open_page().await.unwrap();
    session.close_page(first).await.unwrap();
    let second = session.open_page().await.unwrap();
    session.close_page(second).await.unwrap();

    let (a, b, c) = tokio::join!(session.open_page(), session.open_page(), session.open_page());
    for page in [a, b, c] {
        session.close_page(page.unwrap()).await.unwrap();
    }

    let w = driver.0.lock().unwrap();
    assert_eq!(w.rejected, 0, "{w:?}");
    assert_eq!(w.open, vec!["home".to_string()]);
    assert_eq!(w.current, "home");
}

#[tokio::test]
async fn home_window_is_never_closed() {
    let driver = FakeDriver::new();
    let (_server, session) = session_against(&driver).await;

    let page = session.open_page().await.unwrap();
    assert!(session.close_page(PageHandle::new("home")).await.is_err());
    session.close_page(page).await.unwrap();
    assert_eq!(driver.0.lock().unwrap().open, vec!["home".to_string()]);

    session.shutdown().await.unwrap();
    assert!(session.open_page().await.is_err());
}
