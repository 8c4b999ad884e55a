//! Result-page URLs for each search engine, plus what a preview capture needs
//! to know about the page (embedding hint, consent overlay).

use typeahead_common::{SearchEngine, Settings};

/// URL the item action opens for `query`.
///
/// `Custom` appends the escaped query to the configured base; with no base
/// configured the escaped query alone is returned.
pub fn results_url(engine: SearchEngine, custom_base: &str, query: &str) -> String {
    let q = urlencoding::encode(query);
    match engine {
        SearchEngine::Google => format!("https://www.google.com/search?q={q}"),
        SearchEngine::Bing => format!("https://www.bing.com/search?q={q}"),
        SearchEngine::Yahoo => format!("https://search.yahoo.com/search?p={q}"),
        SearchEngine::DuckDuckGo => format!("https://duckduckgo.com/?q={q}"),
        SearchEngine::Brave => format!("https://search.brave.com/search?q={q}"),
        SearchEngine::Ecosia => format!("https://www.ecosia.org/search?q={q}"),
        SearchEngine::Custom if custom_base.trim().is_empty() => q.into_owned(),
        SearchEngine::Custom => format!("{}{q}", custom_base.trim()),
    }
}

/// [`results_url`] using the engine and custom base from `settings`.
pub fn results_url_for(settings: &Settings, query: &str) -> String {
    results_url(settings.engine(), settings.custom_engine_url(), query)
}

/// Results URL with the engine's inline/embeddable rendering hint.
pub fn preview_url(engine: SearchEngine, custom_base: &str, query: &str) -> String {
    let url = results_url(engine, custom_base, query);
    match embed_hint(engine) {
        Some(hint) => format!("{url}&{hint}"),
        None => url,
    }
}

fn embed_hint(engine: SearchEngine) -> Option<&'static str> {
    match engine {
        SearchEngine::Google => Some("igu=1"),
        _ => None,
    }
}

/// CSS selector of the "accept" button on the engine's cookie consent overlay.
pub fn consent_selector(engine: SearchEngine) -> Option<&'static str> {
    match engine {
        SearchEngine::Google => Some("#L2AGLb"),
        SearchEngine::Bing => Some("#bnp_btn_accept"),
        SearchEngine::Yahoo => Some("button[name='agree']"),
        _ => None,
    }
}
