use crate::browser::{
    page::{PageHandle, Viewport, WaitCondition, READY_STATE_SCRIPT},
    BrowserBackend,
};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use fantoccini::{wd::WindowHandle, Client, ClientBuilder, Locator};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};
use webdriver::capabilities::Capabilities;

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
const WEBDRIVER_URL_ENV: &str = "TYPEAHEAD_WEBDRIVER_URL";
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How to reach and launch the browser.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    /// WebDriver endpoint (Chromedriver by default).
    pub webdriver_url: String,
    pub headless: bool,
    /// Extra Chrome arguments appended after the built-in ones.
    pub extra_args: Vec<String>,
    /// Upper bound for one navigation to satisfy its wait condition.
    #[serde(with = "secs_f64")]
    pub navigation_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            webdriver_url: std::env::var(WEBDRIVER_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_WEBDRIVER_URL.to_string()),
            headless: true,
            extra_args: Vec::new(),
            navigation_timeout: Duration::from_secs(15),
        }
    }
}

mod secs_f64 {
    use serde::{de::Error, Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs.max(0.0)).map_err(D::Error::custom)
    }
}

/// Chrome command-line arguments for a preview browser.
pub fn build_chrome_arguments(options: &BrowserOptions, viewport: Viewport) -> Vec<String> {
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-sandbox".to_string(),
        "--disable-extensions".to_string(),
        "--hide-scrollbars".to_string(),
        "--mute-audio".to_string(),
        "--lang=en-US".to_string(),
        format!("--window-size={},{}", viewport.width, viewport.height),
    ];
    if options.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    args.extend(options.extra_args.iter().cloned());
    args
}

/// One lazily launched WebDriver session shared by every preview capture.
///
/// Pages are browser tabs. WebDriver routes commands to a single active
/// window per session, so every page command holds `window_lock` while it
/// switches to its tab and runs. Navigation is issued with the `none` page
/// load strategy and readiness is polled, so slow pages do not hold the lock
/// for the whole load.
///
/// The window the session started with is never closed. Closing a tab leaves
/// WebDriver pointed at a dead context, so the session switches back to that
/// home window after every close and before opening a new tab.
pub struct BrowserSession {
    options: BrowserOptions,
    client: OnceCell<Connected>,
    window_lock: Mutex<()>,
    closed: AtomicBool,
}

struct Connected {
    client: Client,
    home: WindowHandle,
}

impl BrowserSession {
    /// Create the handle. Nothing is launched until the first page is opened.
    pub fn new(options: BrowserOptions) -> Self {
        Self {
            options,
            client: OnceCell::new(),
            window_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_launched(&self) -> bool {
        self.client.initialized()
    }

    /// Connect to the WebDriver service exactly once; later calls reuse the session.
    ///
    /// Concurrent first callers wait on the same launch. A failed launch
    /// leaves the cell empty so the next caller tries again.
    pub async fn ensure_session(&self) -> Result<&Client> {
        Ok(&self.connected().await?.client)
    }

    async fn connected(&self) -> Result<&Connected> {
        if self.closed.load(Ordering::Acquire) {
            return Err(anyhow!("browser session has been shut down"));
        }
        self.client
            .get_or_try_init(|| async {
                let mut caps = Capabilities::new();
                let args = build_chrome_arguments(&self.options, Viewport::default());
                caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
                caps.insert("pageLoadStrategy".to_string(), json!("none"));

                info!(
                    target: "browser.session",
                    webdriver = %self.options.webdriver_url,
                    headless = self.options.headless,
                    "launching browser session"
                );
                let client = ClientBuilder::native()
                    .capabilities(caps)
                    .connect(&self.options.webdriver_url)
                    .await
                    .with_context(|| {
                        format!("connecting to WebDriver at {}", self.options.webdriver_url)
                    })?;
                let home = client.window().await.context("reading initial window")?;
                debug!(target: "browser.session", home = %String::from(home.clone()), "browser session ready");
                Ok::<Connected, anyhow::Error>(Connected { client, home })
            })
            .await
    }

    /// Take the window lock and make `page` the active window.
    async fn focus(&self, page: &PageHandle) -> Result<(tokio::sync::MutexGuard<'_, ()>, &Client)> {
        let client = self.ensure_session().await?;
        let guard = self.window_lock.lock().await;
        let handle = WindowHandle::try_from(page.id().to_string())
            .map_err(|e| anyhow!("invalid page handle {page}: {e:?}"))?;
        client
            .switch_to_window(handle)
            .await
            .with_context(|| format!("switching to page {page}"))?;
        Ok((guard, client))
    }

    async fn ready_state(&self, page: &PageHandle) -> Result<String> {
        let (_guard, client) = self.focus(page).await?;
        let state = client.execute(READY_STATE_SCRIPT, vec![]).await?;
        Ok(state.as_str().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl BrowserBackend for BrowserSession {
    async fn open_page(&self) -> Result<PageHandle> {
        let Connected { client, home } = self.connected().await?;
        let _guard = self.window_lock.lock().await;
        client
            .switch_to_window(home.clone())
            .await
            .context("switching to home window")?;
        let created = client.new_window(true).await.context("opening tab")?;
        let page = PageHandle::new(String::from(created.handle));
        debug!(target: "browser.session", %page, "page opened");
        Ok(page)
    }

    async fn navigate(&self, page: &PageHandle, url: &str, wait: WaitCondition) -> Result<()> {
        {
            let (_guard, client) = self.focus(page).await?;
            client
                .goto(url)
                .await
                .with_context(|| format!("navigating page {page}"))?;
        }

        let started = Instant::now();
        loop {
            let state = self.ready_state(page).await?;
            if wait.is_met_by(&state) {
                break;
            }
            if started.elapsed() >= self.options.navigation_timeout {
                return Err(anyhow!(
                    "page {page} not ready after {:?} (readyState={state})",
                    self.options.navigation_timeout
                ));
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
        tokio::time::sleep(wait.settle_delay()).await;
        debug!(
            target: "browser.session",
            %page,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "navigation finished"
        );
        Ok(())
    }

    async fn dismiss_overlay(&self, page: &PageHandle, selector: &str) -> Result<()> {
        let (_guard, client) = self.focus(page).await?;
        match client.find(Locator::Css(selector)).await {
            Ok(button) => {
                if let Err(e) = button.click().await {
                    debug!(target: "browser.session", %page, selector, error = %e, "overlay click failed");
                }
                Ok(())
            }
            Err(e) if e.is_no_such_element() => Ok(()),
            Err(e) => {
                debug!(target: "browser.session", %page, selector, error = %e, "overlay lookup failed");
                Ok(())
            }
        }
    }

    async fn screenshot(&self, page: &PageHandle, path: &Path, viewport: Viewport) -> Result<()> {
        let png = {
            let (_guard, client) = self.focus(page).await?;
            client
                .set_window_size(viewport.width, viewport.height)
                .await
                .context("resizing page")?;
            client.screenshot().await.context("capturing screenshot")?
        };
        tokio::fs::write(path, &png)
            .await
            .with_context(|| format!("writing screenshot to {}", path.display()))?;
        Ok(())
    }

    async fn close_page(&self, page: PageHandle) -> Result<()> {
        let Connected { home, .. } = self.connected().await?;
        if String::from(home.clone()) == page.id() {
            return Err(anyhow!("refusing to close the home window"));
        }
        let (_guard, client) = self.focus(&page).await?;
        client
            .close_window()
            .await
            .with_context(|| format!("closing page {page}"))?;
        client
            .switch_to_window(home.clone())
            .await
            .context("switching back to home window")?;
        debug!(target: "browser.session", %page, "page closed");
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Some(Connected { client, .. }) = self.client.get() {
            // Captures still holding the lock finish or fail on their own.
            if let Err(e) = client.clone().close().await {
                warn!(target: "browser.session", error = %e, "closing browser session failed");
                return Err(e.into());
            }
            info!(target: "browser.session", "browser session closed");
        }
        Ok(())
    }
}
