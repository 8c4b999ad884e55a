//! Parallel preview capture against the shared browser session.
//!
//! [`PreviewCaptureOrchestrator::capture_all`] launches one task per slot.
//! Each task opens a page, loads the suggestion's results page, dismisses the
//! engine's consent overlay, screenshots to a fresh temp file and closes the
//! page. Results reach the [`PreviewSink`] in completion order, and only while
//! the generation scope is live. A failing or panicking capture only affects
//! its own slot.

use crate::engines::{consent_selector, preview_url};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use typeahead_common::SearchEngine;
use typeahead_drivers::browser::{BrowserBackend, PageHandle, Viewport, WaitCondition};
use uuid::Uuid;

/// Stable identity of one published slot.
///
/// A completion is applied only if the published list still holds `text` at
/// `index` for `generation`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub generation: u64,
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureResult {
    Ready(PathBuf),
    Failed,
}

/// Receives capture outcomes. Called from capture tasks, in any order.
pub trait PreviewSink: Send + Sync {
    fn complete(&self, slot: &SlotKey, result: CaptureResult);
}

#[derive(Debug, Clone)]
pub struct PreviewOptions {
    /// Directory the PNG files are written to.
    pub dir: PathBuf,
    pub viewport: Viewport,
    pub wait: WaitCondition,
    /// Upper bound for one capture, page close excluded.
    pub capture_timeout: Duration,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            dir: std::env::temp_dir(),
            viewport: Viewport::default(),
            wait: WaitCondition::Load,
            capture_timeout: Duration::from_secs(20),
        }
    }
}

/// Which engine page to render for every slot of one generation.
#[derive(Debug, Clone)]
pub struct CaptureTarget {
    pub engine: SearchEngine,
    pub custom_base: String,
}

pub struct PreviewCaptureOrchestrator {
    browser: Arc<dyn BrowserBackend>,
    options: PreviewOptions,
}

impl PreviewCaptureOrchestrator {
    pub fn new(browser: Arc<dyn BrowserBackend>, options: PreviewOptions) -> Self {
        Self { browser, options }
    }

    pub fn browser(&self) -> &Arc<dyn BrowserBackend> {
        &self.browser
    }

    /// Capture every slot concurrently and wait for all of them.
    pub async fn capture_all(
        self: Arc<Self>,
        target: CaptureTarget,
        slots: Vec<SlotKey>,
        scope: CancellationToken,
        sink: Arc<dyn PreviewSink>,
    ) {
        if slots.is_empty() || scope.is_cancelled() {
            return;
        }
        if let Err(e) = tokio::fs::create_dir_all(&self.options.dir).await {
            tracing::warn!(
                target: "typeahead.preview",
                dir = %self.options.dir.display(),
                error = %e,
                "preview directory unavailable"
            );
        }

        let started = Instant::now();
        let total = slots.len();
        let mut tasks = JoinSet::new();
        let mut by_task = HashMap::with_capacity(total);
        for slot in slots {
            let this = Arc::clone(&self);
            let target = target.clone();
            let scope = scope.clone();
            let sink = Arc::clone(&sink);
            let key = slot.clone();
            let handle = tasks.spawn(async move {
                this.capture_slot(&target, &key, &scope, sink.as_ref()).await;
            });
            by_task.insert(handle.id(), slot);
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                let slot = by_task.get(&e.id()).cloned();
                tracing::error!(target: "typeahead.preview", error = %e, ?slot, "capture task aborted");
                if let Some(slot) = slot {
                    if !scope.is_cancelled() {
                        sink.complete(&slot, CaptureResult::Failed);
                    }
                }
            }
        }
        tracing::debug!(
            target: "typeahead.preview",
            total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "preview captures finished"
        );
    }

    async fn capture_slot(
        &self,
        target: &CaptureTarget,
        slot: &SlotKey,
        scope: &CancellationToken,
        sink: &dyn PreviewSink,
    ) {
        let url = preview_url(target.engine, &target.custom_base, &slot.text);
        let outcome = self.capture(target.engine, &url, scope).await;

        if scope.is_cancelled() {
            if let Ok(path) = outcome {
                let _ = tokio::fs::remove_file(&path).await;
            }
            tracing::debug!(target: "typeahead.preview", index = slot.index, "capture superseded");
            return;
        }

        match outcome {
            Ok(path) => {
                tracing::debug!(
                    target: "typeahead.preview",
                    index = slot.index,
                    path = %path.display(),
                    "preview ready"
                );
                sink.complete(slot, CaptureResult::Ready(path));
            }
            Err(e) => {
                tracing::warn!(
                    target: "typeahead.preview",
                    index = slot.index,
                    text = %slot.text,
                    error = %format!("{e:#}"),
                    "preview capture failed"
                );
                sink.complete(slot, CaptureResult::Failed);
            }
        }
    }

    /// Open, render and always close one page.
    async fn capture(
        &self,
        engine: SearchEngine,
        url: &str,
        scope: &CancellationToken,
    ) -> Result<PathBuf> {
        let page = self.browser.open_page().await?;
        let rendered =
            tokio::time::timeout(self.options.capture_timeout, self.render(&page, engine, url, scope))
                .await
                .unwrap_or_else(|_| {
                    Err(anyhow!(
                        "capture timed out after {:?}",
                        self.options.capture_timeout
                    ))
                });
        if let Err(e) = self.browser.close_page(page).await {
            tracing::debug!(target: "typeahead.preview", error = %e, "closing preview page failed");
        }
        rendered
    }

    async fn render(
        &self,
        page: &PageHandle,
        engine: SearchEngine,
        url: &str,
        scope: &CancellationToken,
    ) -> Result<PathBuf> {
        self.browser.navigate(page, url, self.options.wait).await?;
        if scope.is_cancelled() {
            return Err(anyhow!("superseded"));
        }
        if let Some(selector) = consent_selector(engine) {
            if let Err(e) = self.browser.dismiss_overlay(page, selector).await {
                tracing::debug!(target: "typeahead.preview", selector, error = %e, "consent overlay not dismissed");
            }
        }
        let path = self
            .options
            .dir
            .join(format!("typeahead-preview-{}.png", Uuid::new_v4()));
        self.browser
            .screenshot(page, &path, self.options.viewport)
            .await?;
        Ok(path)
    }
}
