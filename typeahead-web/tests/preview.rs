use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use typeahead_common::SearchEngine;
use typeahead_drivers::browser::{BrowserBackend, PageHandle, Viewport, WaitCondition};
use typeahead_web::{
    CaptureResult, CaptureTarget, PreviewCaptureOrchestrator, PreviewOptions, PreviewSink, SlotKey,
};

/// Browser double: pages are counters, screenshots are tiny files, and any
/// URL containing `fail_on` errors during navigation.
#[derive(Default)]
struct FakeBrowser {
    next_page: AtomicUsize,
    open: Mutex<HashMap<String, String>>,
    closed: AtomicUsize,
    dismissed: Mutex<Vec<String>>,
    fail_on: Option<String>,
    panic_on: Option<String>,
    nav_delay: Duration,
}

#[async_trait]
impl BrowserBackend for FakeBrowser {
    async fn open_page(&self) -> Result<PageHandle> {
        let id = format!("page-{}", self.next_page.fetch_add(1, Ordering::SeqCst));
        self.open.lock().unwrap().insert(id.clone(), String::new());
        Ok(PageHandle::new(id))
    }

    async fn navigate(&self, page: &PageHandle, url: &str, _wait: WaitCondition) -> Result<()> {
        tokio::time::sleep(self.nav_delay).await;
        if let Some(marker) = &self.panic_on {
            if url.contains(marker.as_str()) {
                panic!("renderer crashed");
            }
        }
        if let Some(marker) = &self.fail_on {
            if url.contains(marker.as_str()) {
                bail!("navigation failed for {url}");
            }
        }
        self.open
            .lock()
            .unwrap()
            .insert(page.id().to_string(), url.to_string());
        Ok(())
    }

    async fn dismiss_overlay(&self, _page: &PageHandle, selector: &str) -> Result<()> {
        self.dismissed.lock().unwrap().push(selector.to_string());
        Ok(())
    }

    async fn screenshot(&self, _page: &PageHandle, path: &Path, _viewport: Viewport) -> Result<()> {
        tokio::fs::write(path, b"\x89PNG").await?;
        Ok(())
    }

    async fn close_page(&self, page: PageHandle) -> Result<()> {
        self.open.lock().unwrap().remove(page.id());
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSink {
    results: Mutex<Vec<(SlotKey, CaptureResult)>>,
}

impl PreviewSink for RecordingSink {
    fn complete(&self, slot: &SlotKey, result: CaptureResult) {
        self.results.lock().unwrap().push((slot.clone(), result));
    }
}

impl RecordingSink {
    fn by_text(&self) -> HashMap<String, CaptureResult> {
        self.results
            .lock()
            .unwrap()
            .iter()
            .map(|(k, r)| (k.text.clone(), r.clone()))
            .collect()
    }
}

fn slots(texts: &[&str]) -> Vec<SlotKey> {
    texts
        .iter()
        .enumerate()
        .map(|(index, text)| SlotKey {
            generation: 1,
            index,
            text: text.to_string(),
        })
        .collect()
}

fn options(dir: &Path) -> PreviewOptions {
    PreviewOptions {
        dir: dir.to_path_buf(),
        capture_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

fn google() -> CaptureTarget {
    CaptureTarget {
        engine: SearchEngine::Google,
        custom_base: String::new(),
    }
}

#[tokio::test]
async fn one_failure_leaves_other_slots_ready() {
    let dir = tempfile::tempdir().unwrap();
    let browser = Arc::new(FakeBrowser {
        fail_on: Some("q=two".into()),
        ..Default::default()
    });
    let orchestrator = Arc::new(PreviewCaptureOrchestrator::new(
        browser.clone(),
        options(dir.path()),
    ));
    let sink = Arc::new(RecordingSink::default());

    orchestrator
        .capture_all(
            google(),
            slots(&["one", "two", "three", "four", "five"]),
            CancellationToken::new(),
            sink.clone(),
        )
        .await;

    let results = sink.by_text();
    assert_eq!(results.len(), 5);
    assert_eq!(results["two"], CaptureResult::Failed);
    for text in ["one", "three", "four", "five"] {
        match &results[text] {
            CaptureResult::Ready(path) => {
                assert!(path.exists());
                assert!(path.starts_with(dir.path()));
            }
            other => panic!("{text} should be ready, got {other:?}"),
        }
    }
    assert_eq!(browser.closed.load(Ordering::SeqCst), 5);
    assert!(browser.open.lock().unwrap().is_empty());
}

#[tokio::test]
async fn panicking_capture_is_reported_as_failed() {
    let dir = tempfile::tempdir().unwrap();
    let browser = Arc::new(FakeBrowser {
        panic_on: Some("q=boom".into()),
        ..Default::default()
    });
    let orchestrator = Arc::new(PreviewCaptureOrchestrator::new(browser, options(dir.path())));
    let sink = Arc::new(RecordingSink::default());

    orchestrator
        .capture_all(
            google(),
            slots(&["fine", "boom"]),
            CancellationToken::new(),
            sink.clone(),
        )
        .await;

    let results = sink.by_text();
    assert_eq!(results["boom"], CaptureResult::Failed);
    assert!(matches!(results["fine"], CaptureResult::Ready(_)));
}

#[tokio::test]
async fn cancelled_scope_reports_nothing_and_leaves_no_files() {
    let dir = tempfile::tempdir().unwrap();
    let browser = Arc::new(FakeBrowser {
        nav_delay: Duration::from_millis(200),
        ..Default::default()
    });
    let orchestrator = Arc::new(PreviewCaptureOrchestrator::new(
        browser.clone(),
        options(dir.path()),
    ));
    let sink = Arc::new(RecordingSink::default());
    let scope = CancellationToken::new();
    let trigger = scope.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    orchestrator
        .capture_all(google(), slots(&["a", "b", "c"]), scope, sink.clone())
        .await;

    assert!(sink.results.lock().unwrap().is_empty());
    assert_eq!(browser.closed.load(Ordering::SeqCst), 3);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn slow_page_times_out_and_is_still_closed() {
    let dir = tempfile::tempdir().unwrap();
    let browser = Arc::new(FakeBrowser {
        nav_delay: Duration::from_secs(2),
        ..Default::default()
    });
    let orchestrator = Arc::new(PreviewCaptureOrchestrator::new(
        browser.clone(),
        PreviewOptions {
            capture_timeout: Duration::from_millis(50),
            ..options(dir.path())
        },
    ));
    let sink = Arc::new(RecordingSink::default());

    orchestrator
        .capture_all(google(), slots(&["slow"]), CancellationToken::new(), sink.clone())
        .await;

    assert_eq!(sink.by_text()["slow"], CaptureResult::Failed);
    assert_eq!(browser.closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn consent_overlay_is_dismissed_for_engines_that_show_one() {
    let dir = tempfile::tempdir().unwrap();
    let browser = Arc::new(FakeBrowser::default());
    let orchestrator = Arc::new(PreviewCaptureOrchestrator::new(
        browser.clone(),
        options(dir.path()),
    ));
    let sink = Arc::new(RecordingSink::default());

    orchestrator
        .clone()
        .capture_all(google(), slots(&["cat"]), CancellationToken::new(), sink.clone())
        .await;
    orchestrator
        .capture_all(
            CaptureTarget {
                engine: SearchEngine::DuckDuckGo,
                custom_base: String::new(),
            },
            slots(&["dog"]),
            CancellationToken::new(),
            sink.clone(),
        )
        .await;

    assert_eq!(*browser.dismissed.lock().unwrap(), vec!["#L2AGLb".to_string()]);
    assert_eq!(sink.results.lock().unwrap().len(), 2);
}
