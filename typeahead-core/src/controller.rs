//! Latest-wins query pipeline.
//!
//! Every distinct [`QueryController::update_query`] starts a new generation
//! with its own cancellation scope (a child of the runtime root) and cancels
//! the previous one. The pipeline for a generation fetches suggestions,
//! publishes them, then hands the slots to the preview orchestrator. Every
//! mutation of shared state re-checks the generation under the lock, so work
//! from a superseded generation can never reach the host.

use crate::MAX_ITEMS;
use crate::host::ResultsHost;
use crate::item::{ListItem, PreviewState, SuggestionItem};
use anyhow::{Result, anyhow};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use typeahead_common::{SearchEngine, SettingsHandle, SuggestionProvider};
use typeahead_drivers::browser::BrowserBackend;
use typeahead_runtime::TypeaheadHandle;
use typeahead_web::providers::parsers::distinct;
use typeahead_web::{
    CaptureResult, CaptureTarget, PreviewCaptureOrchestrator, PreviewSink, SlotKey,
    SuggestionSource,
};

/// What the host currently sees.
#[derive(Debug, Clone, Default)]
enum View {
    #[default]
    Empty,
    Placeholder(SuggestionProvider),
    Suggestions {
        engine: SearchEngine,
        custom_base: String,
        items: Vec<SuggestionItem>,
    },
    Diagnostic(String),
}

#[derive(Default)]
struct State {
    /// Last query passed to `update_query`; `None` until the first call.
    query: Option<String>,
    generation: u64,
    scope: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
    view: View,
    disposed: bool,
}

struct Shared {
    runtime: TypeaheadHandle,
    settings: SettingsHandle,
    source: Arc<dyn SuggestionSource>,
    previews: Option<Arc<PreviewCaptureOrchestrator>>,
    host: Arc<dyn ResultsHost>,
    state: Mutex<State>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Replace the view if `generation` is still current. Returns whether it did.
    fn publish(&self, generation: u64, scope: &CancellationToken, view: View) -> bool {
        {
            let mut state = self.lock();
            if state.generation != generation || scope.is_cancelled() {
                return false;
            }
            state.view = view;
        }
        self.host.items_changed();
        true
    }

    fn publish_failure(&self, generation: u64, scope: &CancellationToken, error: &anyhow::Error) {
        if scope.is_cancelled() {
            tracing::debug!(target: "typeahead.controller", generation, error = %format!("{error:#}"), "failure after supersession ignored");
            return;
        }
        tracing::warn!(
            target: "typeahead.controller",
            generation,
            error = %format!("{error:#}"),
            "suggestion pipeline failed"
        );
        self.publish(generation, scope, View::Diagnostic(error.to_string()));
    }
}

/// Owns the current generation and the published list.
pub struct QueryController {
    shared: Arc<Shared>,
}

impl QueryController {
    /// Without `previews`, `render_preview` is ignored.
    pub fn new(
        runtime: TypeaheadHandle,
        settings: SettingsHandle,
        source: Arc<dyn SuggestionSource>,
        previews: Option<Arc<PreviewCaptureOrchestrator>>,
        host: Arc<dyn ResultsHost>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                runtime,
                settings,
                source,
                previews,
                host,
                state: Mutex::new(State::default()),
            }),
        }
    }

    pub fn settings(&self) -> &SettingsHandle {
        &self.shared.settings
    }

    /// Start a generation for `text` unless it equals the tracked query.
    /// Never blocks on network or browser work.
    pub fn update_query(&self, text: &str) {
        let (generation, scope) = {
            let mut state = self.shared.lock();
            if state.disposed || state.query.as_deref() == Some(text) {
                return;
            }
            state.query = Some(text.to_string());
            if let Some(previous) = state.scope.take() {
                previous.cancel();
            }
            state.generation += 1;
            let scope = self.shared.runtime.child_token();
            state.scope = Some(scope.clone());
            (state.generation, scope)
        };
        tracing::debug!(target: "typeahead.controller", generation, query = %text, "generation started");

        let work = self.shared.runtime.spawn(run_generation(
            Arc::clone(&self.shared),
            generation,
            text.to_string(),
            scope.clone(),
        ));
        let shared = Arc::clone(&self.shared);
        let supervisor = self.shared.runtime.spawn(async move {
            let outcome = match work.await {
                Ok(outcome) => outcome,
                Err(e) if e.is_cancelled() => return,
                Err(e) => Err(anyhow!("suggestion task aborted: {e}")),
            };
            if let Err(e) = outcome {
                shared.publish_failure(generation, &scope, &e);
            }
        });

        let mut state = self.shared.lock();
        if state.generation == generation {
            state.task = Some(supervisor);
        }
    }

    /// Host view of the published list.
    pub fn items(&self) -> Vec<ListItem> {
        let state = self.shared.lock();
        match &state.view {
            View::Empty => Vec::new(),
            View::Placeholder(provider) => vec![ListItem::placeholder(*provider)],
            View::Diagnostic(message) => vec![ListItem::diagnostic(message.clone())],
            View::Suggestions {
                engine,
                custom_base,
                items,
            } => items
                .iter()
                .map(|item| item.to_list_item(*engine, custom_base))
                .collect(),
        }
    }

    /// Published suggestions with their preview states; empty for static items.
    pub fn suggestions(&self) -> Vec<SuggestionItem> {
        match &self.shared.lock().view {
            View::Suggestions { items, .. } => items.clone(),
            _ => Vec::new(),
        }
    }

    pub fn current_generation(&self) -> u64 {
        self.shared.lock().generation
    }

    /// Wait until the newest generation's pipeline, previews included, is done.
    pub async fn settled(&self) {
        loop {
            let (generation, task) = {
                let mut state = self.shared.lock();
                (state.generation, state.task.take())
            };
            let Some(task) = task else {
                return;
            };
            let _ = task.await;
            if self.current_generation() == generation {
                return;
            }
        }
    }

    /// Cancel the current generation and close the browser session.
    /// Later `update_query` calls are ignored.
    pub async fn dispose(&self) {
        let scope = {
            let mut state = self.shared.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.task = None;
            state.scope.take()
        };
        if let Some(scope) = scope {
            scope.cancel();
        }
        if let Some(previews) = &self.shared.previews {
            if let Err(e) = previews.browser().shutdown().await {
                tracing::warn!(target: "typeahead.controller", error = %format!("{e:#}"), "browser shutdown failed");
            }
        }
        tracing::debug!(target: "typeahead.controller", "controller disposed");
    }
}

async fn run_generation(
    shared: Arc<Shared>,
    generation: u64,
    query: String,
    scope: CancellationToken,
) -> Result<()> {
    let settings = shared.settings.snapshot();
    let query = query.trim();

    if query.is_empty() {
        shared.publish(generation, &scope, View::Placeholder(settings.provider()));
        return Ok(());
    }

    let fetched = shared
        .source
        .fetch(query, settings.provider(), &scope)
        .await?;
    if scope.is_cancelled() {
        tracing::debug!(target: "typeahead.controller", generation, "generation superseded during fetch");
        return Ok(());
    }

    let items = build_list(query, fetched, settings.always_show_query());
    let slots: Vec<SlotKey> = items
        .iter()
        .enumerate()
        .map(|(index, item)| SlotKey {
            generation,
            index,
            text: item.text.clone(),
        })
        .collect();
    let target = CaptureTarget {
        engine: settings.engine(),
        custom_base: settings.custom_engine_url().to_string(),
    };
    tracing::debug!(target: "typeahead.controller", generation, count = items.len(), "publishing suggestions");

    let view = View::Suggestions {
        engine: target.engine,
        custom_base: target.custom_base.clone(),
        items,
    };
    if !shared.publish(generation, &scope, view) {
        return Ok(());
    }

    let Some(previews) = shared.previews.clone() else {
        return Ok(());
    };
    if !settings.render_preview() || slots.is_empty() {
        return Ok(());
    }
    let sink: Arc<dyn PreviewSink> = Arc::new(SlotWriter {
        shared: Arc::clone(&shared),
        scope: scope.clone(),
    });
    previews.capture_all(target, slots, scope, sink).await;
    Ok(())
}

/// `[query] ++ distinct(fetched minus query)`, capped at [`MAX_ITEMS`].
/// With nothing beyond the query, the query alone or nothing.
fn build_list(query: &str, fetched: Vec<String>, always_show_query: bool) -> Vec<SuggestionItem> {
    let fetched = distinct(fetched);
    if fetched.is_empty() && !always_show_query {
        return Vec::new();
    }
    let lowered = query.to_lowercase();
    let extra: Vec<String> = fetched
        .into_iter()
        .filter(|s| s.to_lowercase() != lowered)
        .take(MAX_ITEMS - 1)
        .collect();
    std::iter::once(query.to_string())
        .chain(extra)
        .map(|text| SuggestionItem::new(text, query))
        .collect()
}

/// Applies capture results to the published list of one generation.
struct SlotWriter {
    shared: Arc<Shared>,
    scope: CancellationToken,
}

impl PreviewSink for SlotWriter {
    fn complete(&self, slot: &SlotKey, result: CaptureResult) {
        let applied = {
            let mut state = self.shared.lock();
            if state.generation != slot.generation || self.scope.is_cancelled() {
                false
            } else if let View::Suggestions { items, .. } = &mut state.view {
                match items.get_mut(slot.index) {
                    Some(item) if item.text == slot.text => {
                        item.preview = match result {
                            CaptureResult::Ready(path) => PreviewState::Ready(path),
                            CaptureResult::Failed => PreviewState::Failed,
                        };
                        true
                    }
                    _ => false,
                }
            } else {
                false
            }
        };
        if applied {
            self.shared.host.items_changed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[SuggestionItem]) -> Vec<&str> {
        items.iter().map(|i| i.text.as_str()).collect()
    }

    #[test]
    fn query_leads_and_is_not_repeated() {
        let fetched = vec!["Cat".into(), "category".into(), "cats near me".into()];
        let list = build_list("cat", fetched, true);
        assert_eq!(texts(&list), vec!["cat", "category", "cats near me"]);
        assert!(list.iter().all(|i| i.origin_query == "cat"));
    }

    #[test]
    fn list_is_capped() {
        let fetched = (0..25).map(|i| format!("cat {i}")).collect();
        let list = build_list("cat", fetched, false);
        assert_eq!(list.len(), MAX_ITEMS);
        assert_eq!(list[0].text, "cat");
    }

    #[test]
    fn fallback_follows_always_show_query() {
        assert_eq!(texts(&build_list("cat", vec!["CAT".into()], true)), vec!["cat"]);
        assert!(build_list("cat", Vec::new(), false).is_empty());
        assert!(build_list("cat", vec!["  ".into()], false).is_empty());
    }

    #[test]
    fn provider_echo_of_query_is_kept_without_fallback() {
        assert_eq!(texts(&build_list("cat", vec!["cat".into()], false)), vec!["cat"]);
        assert_eq!(texts(&build_list("cat", vec!["Cat".into()], false)), vec!["cat"]);
    }
}
