//! Common types and utilities shared across Typeahead crates.
//!
//! This crate defines the user-facing settings model, the search engine and
//! suggestion provider enums, observability helpers, and the shared error type
//! used throughout the Typeahead workspace. It is intentionally lightweight so
//! that every crate can depend on it.
//!
//! # Overview
//!
//! - [`Settings`]: user-editable preferences, mutated only through named setters
//! - [`SettingsHandle`]: shared, lock-guarded view of the live settings
//! - [`SearchEngine`] and [`SuggestionProvider`]: the selectable backends
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`TypeaheadError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use typeahead_common::{SearchEngine, Settings, SuggestionProvider};
//!
//! let mut settings = Settings::default();
//! settings.set_provider(SuggestionProvider::DuckDuckGo);
//! settings.cycle_engine();
//! assert_eq!(settings.engine(), SearchEngine::Bing);
//! assert!(settings.always_show_query());
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

pub mod observability;

/// Search site opened by an item's action and captured for previews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    #[default]
    Google,
    Bing,
    Yahoo,
    DuckDuckGo,
    Brave,
    Ecosia,
    /// Uses [`Settings::custom_engine_url`] as the base the query is appended to.
    Custom,
}

impl SearchEngine {
    pub const ALL: [SearchEngine; 7] = [
        SearchEngine::Google,
        SearchEngine::Bing,
        SearchEngine::Yahoo,
        SearchEngine::DuckDuckGo,
        SearchEngine::Brave,
        SearchEngine::Ecosia,
        SearchEngine::Custom,
    ];

    /// Human readable name used in item subtitles and preview captions.
    pub fn label(&self) -> &'static str {
        match self {
            SearchEngine::Google => "Google",
            SearchEngine::Bing => "Bing",
            SearchEngine::Yahoo => "Yahoo",
            SearchEngine::DuckDuckGo => "DuckDuckGo",
            SearchEngine::Brave => "Brave",
            SearchEngine::Ecosia => "Ecosia",
            SearchEngine::Custom => "Custom",
        }
    }

    /// The variant following `self`, wrapping around.
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|e| e == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Remote autocomplete API used to fetch suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionProvider {
    #[default]
    Google,
    Bing,
    Yahoo,
    DuckDuckGo,
    Brave,
    Ecosia,
}

impl SuggestionProvider {
    pub const ALL: [SuggestionProvider; 6] = [
        SuggestionProvider::Google,
        SuggestionProvider::Bing,
        SuggestionProvider::Yahoo,
        SuggestionProvider::DuckDuckGo,
        SuggestionProvider::Brave,
        SuggestionProvider::Ecosia,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SuggestionProvider::Google => "Google",
            SuggestionProvider::Bing => "Bing",
            SuggestionProvider::Yahoo => "Yahoo",
            SuggestionProvider::DuckDuckGo => "DuckDuckGo",
            SuggestionProvider::Brave => "Brave",
            SuggestionProvider::Ecosia => "Ecosia",
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|p| p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for SuggestionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SearchEngine {
    type Err = TypeaheadError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|e| e.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TypeaheadError::Config(format!("unknown search engine: {wanted}")))
    }
}

impl FromStr for SuggestionProvider {
    type Err = TypeaheadError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TypeaheadError::Config(format!("unknown suggestion provider: {wanted}")))
    }
}

/// User-editable preferences.
///
/// Fields are private; every change goes through a named setter so callers
/// cannot reach fields by name at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    engine: SearchEngine,
    provider: SuggestionProvider,
    custom_engine_url: String,
    always_show_query: bool,
    render_preview: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: SearchEngine::Google,
            provider: SuggestionProvider::Google,
            custom_engine_url: String::new(),
            always_show_query: true,
            render_preview: false,
        }
    }
}

impl Settings {
    pub fn engine(&self) -> SearchEngine {
        self.engine
    }

    pub fn provider(&self) -> SuggestionProvider {
        self.provider
    }

    pub fn custom_engine_url(&self) -> &str {
        &self.custom_engine_url
    }

    /// Keep the literal query as a result when the provider returns nothing.
    pub fn always_show_query(&self) -> bool {
        self.always_show_query
    }

    /// Capture screenshot previews for each suggestion.
    pub fn render_preview(&self) -> bool {
        self.render_preview
    }

    pub fn set_engine(&mut self, engine: SearchEngine) {
        self.engine = engine;
    }

    pub fn set_provider(&mut self, provider: SuggestionProvider) {
        self.provider = provider;
    }

    pub fn set_custom_engine_url(&mut self, url: impl Into<String>) {
        self.custom_engine_url = url.into().trim().to_string();
    }

    pub fn set_always_show_query(&mut self, on: bool) {
        self.always_show_query = on;
    }

    pub fn set_render_preview(&mut self, on: bool) {
        self.render_preview = on;
    }

    /// Advance to the next engine and return it.
    pub fn cycle_engine(&mut self) -> SearchEngine {
        self.engine = self.engine.next();
        self.engine
    }

    /// Advance to the next provider and return it.
    pub fn cycle_provider(&mut self) -> SuggestionProvider {
        self.provider = self.provider.next();
        self.provider
    }

    pub fn toggle_always_show_query(&mut self) -> bool {
        self.always_show_query = !self.always_show_query;
        self.always_show_query
    }

    pub fn toggle_render_preview(&mut self) -> bool {
        self.render_preview = !self.render_preview;
        self.render_preview
    }
}

/// Shared handle to the live [`Settings`].
///
/// Readers take a cheap snapshot per pipeline run; writers go through
/// [`SettingsHandle::update`].
#[derive(Debug, Clone, Default)]
pub struct SettingsHandle {
    inner: Arc<RwLock<Settings>>,
}

impl SettingsHandle {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Copy of the current settings. A poisoned lock still yields the last value.
    pub fn snapshot(&self) -> Settings {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Apply `f` under the write lock and return the updated settings.
    pub fn update<F: FnOnce(&mut Settings)>(&self, f: F) -> Settings {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard);
        guard.clone()
    }
}

/// Error types used across the Typeahead system.
#[derive(thiserror::Error, Debug)]
pub enum TypeaheadError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The persisted settings document could not be read or written.
    #[error("Settings error: {0}")]
    Settings(String),

    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A driver (browser, network, etc.) reported an error.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),
}

/// Convenient alias for results that use [`TypeaheadError`].
pub type Result<T> = std::result::Result<T, TypeaheadError>;
