use anyhow::{Context, Result};
use std::sync::Arc;
use typeahead_common::SettingsHandle;
use typeahead_config::TypeaheadConfig;
use typeahead_core::{QueryController, ResultsHost};
use typeahead_drivers::browser::BrowserSession;
use typeahead_runtime::TypeaheadHandle;
use typeahead_web::{PreviewCaptureOrchestrator, PreviewOptions, SuggestionFetcher};

/// Preview settings resolved from config.
pub fn preview_options(config: &TypeaheadConfig) -> Result<PreviewOptions> {
    Ok(PreviewOptions {
        dir: config.preview.dir_or_temp(),
        viewport: config.preview.viewport,
        wait: config.preview.wait,
        capture_timeout: config.preview.capture_timeout()?,
    })
}

pub fn build_fetcher(config: &TypeaheadConfig) -> Result<SuggestionFetcher> {
    let fetcher = SuggestionFetcher::new(config.fetch.timeout()?)?;
    match config.fetch.base_url.as_deref() {
        Some(base) if !base.trim().is_empty() => fetcher
            .with_base_url(base.trim())
            .context("fetch.base_url"),
        _ => Ok(fetcher),
    }
}

/// Assemble the controller. The browser session is created here but only
/// connects on the first capture.
pub fn build_controller(
    config: &TypeaheadConfig,
    settings: SettingsHandle,
    runtime: TypeaheadHandle,
    host: Arc<dyn ResultsHost>,
    previews_enabled: bool,
) -> Result<QueryController> {
    let fetcher = build_fetcher(config)?;
    let previews = match previews_enabled {
        true => {
            let browser = Arc::new(BrowserSession::new(config.browser.clone()));
            Some(Arc::new(PreviewCaptureOrchestrator::new(
                browser,
                preview_options(config)?,
            )))
        }
        false => None,
    };
    tracing::info!(
        previews = previews.is_some(),
        webdriver = %config.browser.webdriver_url,
        fetch_timeout_ms = config.fetch.timeout()?.as_millis() as u64,
        "controller assembled"
    );
    Ok(QueryController::new(
        runtime,
        settings,
        Arc::new(fetcher),
        previews,
        host,
    ))
}
