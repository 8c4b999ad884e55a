pub mod driver;
pub mod page;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

pub use driver::{BrowserOptions, BrowserSession};
pub use page::{PageHandle, Viewport, WaitCondition};

/// Page operations on a shared browser session.
///
/// Implementations must be safe to call from many tasks at once; callers
/// share one handle and never coordinate among themselves.
#[async_trait]
pub trait BrowserBackend: Send + Sync {
    /// Open a fresh page (tab) on the session, launching it if needed.
    async fn open_page(&self) -> Result<PageHandle>;

    /// Load `url` in `page` and wait until `wait` is satisfied.
    async fn navigate(&self, page: &PageHandle, url: &str, wait: WaitCondition) -> Result<()>;

    /// Click the element matching `selector` if it exists. A missing element is not an error.
    async fn dismiss_overlay(&self, page: &PageHandle, selector: &str) -> Result<()>;

    /// Resize the page to `viewport` and write a PNG of it to `path`.
    async fn screenshot(&self, page: &PageHandle, path: &Path, viewport: Viewport) -> Result<()>;

    async fn close_page(&self, page: PageHandle) -> Result<()>;

    /// Close the session. Later page operations fail.
    async fn shutdown(&self) -> Result<()>;
}
