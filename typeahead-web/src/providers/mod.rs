//! Provider registry: each [`SuggestionProvider`] maps to the request it needs
//! and the parser that understands its response.

pub mod fetch;
pub mod parsers;

use typeahead_common::SuggestionProvider;

/// Shared parser contract: response body in, ordered distinct suggestions out.
/// Implementations never panic and return an empty list on malformed input.
pub type ParseFn = fn(&str) -> Vec<String>;

/// Everything needed to talk to one autocomplete API.
#[derive(Debug, Clone, Copy)]
pub struct ProviderSpec {
    pub provider: SuggestionProvider,
    /// Request URL up to and including the query parameter's `=`.
    pub url_prefix: &'static str,
    pub parse: ParseFn,
}

impl ProviderSpec {
    /// Full GET URL for `query`, percent-encoded (RFC 3986 unreserved kept).
    pub fn request_url(&self, query: &str) -> String {
        format!("{}{}", self.url_prefix, urlencoding::encode(query))
    }
}

static REGISTRY: [ProviderSpec; 6] = [
    ProviderSpec {
        provider: SuggestionProvider::Google,
        url_prefix: "https://www.google.com/complete/search?client=gws-wiz&q=",
        parse: parsers::parse_google,
    },
    ProviderSpec {
        provider: SuggestionProvider::Bing,
        url_prefix: "https://www.bingapis.com/api/v7/suggestions?appid=6D0A9B8C5100E9ECC7E11A104ADD76C10219804B&q=",
        parse: parsers::parse_bing,
    },
    ProviderSpec {
        provider: SuggestionProvider::Yahoo,
        url_prefix: "https://sugg.search.yahoo.net/sg/?output=json&nresults=10&command=",
        parse: parsers::parse_yahoo,
    },
    ProviderSpec {
        provider: SuggestionProvider::DuckDuckGo,
        url_prefix: "https://duckduckgo.com/ac/?type=json&q=",
        parse: parsers::parse_duckduckgo,
    },
    ProviderSpec {
        provider: SuggestionProvider::Brave,
        url_prefix: "https://search.brave.com/api/suggest?rich=true&q=",
        parse: parsers::parse_brave,
    },
    ProviderSpec {
        provider: SuggestionProvider::Ecosia,
        url_prefix: "https://ac.ecosia.org/?q=",
        parse: parsers::parse_ecosia,
    },
];

/// Registry entry for `provider`.
pub fn spec_for(provider: SuggestionProvider) -> &'static ProviderSpec {
    REGISTRY
        .iter()
        .find(|s| s.provider == provider)
        .unwrap_or(&REGISTRY[0])
}
