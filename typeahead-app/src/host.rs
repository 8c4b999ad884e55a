use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::Notify;
use typeahead_core::{ItemAction, ListItem, ResultsHost};

/// Turns change notifications into wakeups for the printing loop.
/// Bursts of notifications collapse into one pending wakeup.
#[derive(Default)]
pub struct TerminalHost {
    changed: Arc<Notify>,
}

impl TerminalHost {
    pub fn changed(&self) -> Arc<Notify> {
        Arc::clone(&self.changed)
    }
}

impl ResultsHost for TerminalHost {
    fn items_changed(&self) {
        self.changed.notify_one();
    }
}

pub fn render(generation: u64, items: &[ListItem]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "-- generation {generation}: {} item(s)", items.len());
    for (i, item) in items.iter().enumerate() {
        let _ = write!(out, "{:>2}. {}", i + 1, item.title);
        if !item.subtitle.is_empty() {
            let _ = write!(out, "  ({})", item.subtitle);
        }
        out.push('\n');
        if let Some(ItemAction::OpenUrl(url)) = &item.action {
            let _ = writeln!(out, "    open:    {url}");
        }
        if let Some(details) = &item.details {
            let _ = writeln!(out, "    preview: {details}");
        }
    }
    out
}
