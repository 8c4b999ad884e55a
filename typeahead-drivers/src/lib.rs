//! Driver layer for browser automation.
//!
//! This crate owns the single headless browser session used to render
//! search-result previews.
//!
//! - [`browser::BrowserBackend`]: page-level operations the preview pipeline relies on
//! - [`browser::driver::BrowserSession`]: lazily launched fantoccini/WebDriver session
//! - [`browser::page`]: page handles, wait conditions and viewport types
pub mod browser;
