use std::path::{Path, PathBuf};
use typeahead_common::{SearchEngine, Settings, SuggestionProvider};
use typeahead_web::engines::results_url;

/// Preview state of one published slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewState {
    #[default]
    Pending,
    Ready(PathBuf),
    Failed,
}

/// One suggestion in the published list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionItem {
    pub text: String,
    /// Query of the generation that produced this item.
    pub origin_query: String,
    pub preview: PreviewState,
}

impl SuggestionItem {
    pub fn new(text: impl Into<String>, origin_query: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin_query: origin_query.into(),
            preview: PreviewState::Pending,
        }
    }

    /// Host view of this item for `engine`.
    pub fn to_list_item(&self, engine: SearchEngine, custom_base: &str) -> ListItem {
        let details = match &self.preview {
            PreviewState::Ready(path) => Some(preview_markdown(engine, &self.text, path)),
            _ => None,
        };
        ListItem {
            title: self.text.clone(),
            subtitle: format!("Search {engine} for '{}'", self.text),
            action: Some(ItemAction::OpenUrl(results_url(
                engine,
                custom_base,
                &self.text,
            ))),
            details,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemAction {
    OpenUrl(String),
}

/// What the host renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub title: String,
    pub subtitle: String,
    pub action: Option<ItemAction>,
    /// Markdown body for the details pane.
    pub details: Option<String>,
}

impl ListItem {
    fn info(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            action: None,
            details: None,
        }
    }

    pub(crate) fn placeholder(provider: SuggestionProvider) -> Self {
        Self::info("Type to search", format!("Suggestions from {provider}"))
    }

    pub(crate) fn diagnostic(message: impl Into<String>) -> Self {
        Self::info("Error fetching suggestions", message)
    }
}

/// `![<engine> result for '<text>'](file:///<path>)`
pub fn preview_markdown(engine: SearchEngine, text: &str, path: &Path) -> String {
    format!(
        "![{engine} result for '{}']({})",
        escape_alt_text(text),
        file_url(path)
    )
}

/// Replace the characters that would end a markdown image's alt text or
/// target with their numeric entities.
fn escape_alt_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '[' => out.push_str("&#91;"),
            ']' => out.push_str("&#93;"),
            '(' => out.push_str("&#40;"),
            ')' => out.push_str("&#41;"),
            other => out.push(other),
        }
    }
    out
}

fn file_url(path: &Path) -> String {
    let display = path.to_string_lossy().replace('\\', "/");
    format!("file:///{}", display.trim_start_matches('/'))
}

fn on_off(on: bool) -> &'static str {
    if on { "Enabled" } else { "Disabled" }
}

/// Summary of the current settings, one item per setting.
pub fn settings_items(settings: &Settings) -> Vec<ListItem> {
    let custom = settings.custom_engine_url();
    vec![
        ListItem::info(
            "Always show search with \"Enter\"",
            on_off(settings.always_show_query()),
        ),
        ListItem::info(
            "Show rendered result previews",
            on_off(settings.render_preview()),
        ),
        ListItem::info(format!("Selected engine: {}", settings.engine()), ""),
        ListItem::info(format!("Suggestion provider: {}", settings.provider()), ""),
        ListItem::info(
            "Custom search engine URL",
            if custom.trim().is_empty() {
                "(not set)"
            } else {
                custom
            },
        ),
    ]
}
