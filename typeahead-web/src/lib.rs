//! Suggestion discovery and preview acquisition.
//!
//! - Provider registry, wire-format parsers and the HTTP fetcher (`providers`)
//! - Search-engine result and preview URLs (`engines`)
//! - Parallel screenshot capture against the shared browser (`preview`)

pub mod engines;
pub mod preview;
pub mod providers;

pub use preview::{
    CaptureResult, CaptureTarget, PreviewCaptureOrchestrator, PreviewOptions, PreviewSink, SlotKey,
};
pub use providers::fetch::{SuggestionFetcher, SuggestionSource};
