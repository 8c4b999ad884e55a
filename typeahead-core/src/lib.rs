//! Query state machine and the item list shown to the host.
//!
//! [`QueryController`] turns keystrokes into generations, runs the
//! fetch-then-preview pipeline for the newest one and keeps the published
//! list. Hosts implement [`ResultsHost`] and pull [`ListItem`]s on change.

pub mod controller;
pub mod host;
pub mod item;

pub use controller::QueryController;
pub use host::{DetachedHost, ResultsHost};
pub use item::{settings_items, ItemAction, ListItem, PreviewState, SuggestionItem};

/// Longest list published for one generation, literal query included.
pub const MAX_ITEMS: usize = 10;
