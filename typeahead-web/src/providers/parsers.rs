//! Decoders for the autocomplete wire formats.
//!
//! Every parser is total: a malformed, truncated or unexpected body yields an
//! empty list. Individual entries that lack the expected field are skipped.
//! Output is de-duplicated case-insensitively in first-seen order.

use serde_json::Value;
use std::collections::HashSet;

const GOOGLE_JSONP_PREFIX: &str = "window.google.ac.h(";

/// `window.google.ac.h([[["cat<b>s</b>",0,[512]], ...], {...}])`
pub fn parse_google(body: &str) -> Vec<String> {
    let Some(start) = body.find(GOOGLE_JSONP_PREFIX) else {
        return Vec::new();
    };
    let json_start = start + GOOGLE_JSONP_PREFIX.len();
    let Some(end) = body.rfind(')') else {
        return Vec::new();
    };
    if end < json_start {
        return Vec::new();
    }
    let Some(root) = parse_json(&body[json_start..end]) else {
        return Vec::new();
    };
    let entries = root
        .get(0)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.get(0).and_then(Value::as_str))
        .map(decode_google_markup);
    distinct(entries)
}

/// `{"suggestionGroups":[{"searchSuggestions":[{"displayText":"..."}]}]}`
pub fn parse_bing(body: &str) -> Vec<String> {
    let Some(root) = parse_json(body) else {
        return Vec::new();
    };
    let entries = root
        .pointer("/suggestionGroups/0/searchSuggestions")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|s| string_field(s, "displayText"));
    distinct(entries)
}

/// `{"gossip":{"results":[{"key":"..."}]}}`
pub fn parse_yahoo(body: &str) -> Vec<String> {
    let Some(root) = parse_json(body) else {
        return Vec::new();
    };
    let entries = root
        .pointer("/gossip/results")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|r| string_field(r, "key"));
    distinct(entries)
}

/// `[{"phrase":"..."}, ...]`
pub fn parse_duckduckgo(body: &str) -> Vec<String> {
    let Some(root) = parse_json(body) else {
        return Vec::new();
    };
    let entries = root
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|p| string_field(p, "phrase"));
    distinct(entries)
}

/// `["cat", [{"q":"cats","name":"Cat", ...}, ...]]`; entity entries carry a
/// display `name`, plain completions only `q`.
pub fn parse_brave(body: &str) -> Vec<String> {
    let Some(root) = parse_json(body) else {
        return Vec::new();
    };
    let entries = root
        .get(1)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            _ => string_field(item, "name").or_else(|| string_field(item, "q")),
        });
    distinct(entries)
}

/// `{"query":"cat","suggestions":["cats", ...]}`
pub fn parse_ecosia(body: &str) -> Vec<String> {
    let Some(root) = parse_json(body) else {
        return Vec::new();
    };
    let entries = root
        .get("suggestions")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|s| s.as_str().map(str::to_string));
    distinct(entries)
}

fn parse_json(body: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(body.trim()) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!(
                target: "typeahead.fetch",
                serde_line = e.line(),
                serde_col = e.column(),
                error = %e,
                "suggestion body is not valid JSON"
            );
            None
        }
    }
}

fn string_field(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Drop bold highlighting and decode HTML entities.
fn decode_google_markup(raw: &str) -> String {
    let stripped = raw.replace("<b>", "").replace("</b>", "");
    html_escape::decode_html_entities(&stripped).into_owned()
}

/// Case-insensitive de-duplication keeping the first spelling seen.
/// Blank entries are dropped.
pub fn distinct<I>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect()
}
