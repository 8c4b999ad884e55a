use super::spec_for;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use typeahead_common::SuggestionProvider;
use typeahead_http::HttpClient;
use url::{Position, Url};

/// Where suggestion strings come from.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    /// Ordered, distinct suggestions for `query`.
    ///
    /// Remote failures, timeouts and cancellation produce an empty list; only
    /// a request that cannot be built is an error.
    async fn fetch(
        &self,
        query: &str,
        provider: SuggestionProvider,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>>;
}

/// [`SuggestionSource`] backed by the public autocomplete endpoints.
#[derive(Clone)]
pub struct SuggestionFetcher {
    http: HttpClient,
    base_override: Option<Url>,
}

impl SuggestionFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = HttpClient::new(timeout).context("building suggestion HTTP client")?;
        Ok(Self {
            http,
            base_override: None,
        })
    }

    /// Send every provider request to `base` instead, keeping path and query.
    pub fn with_base_url(mut self, base: &str) -> Result<Self> {
        let base = Url::parse(base).with_context(|| format!("invalid base URL: {base}"))?;
        self.base_override = Some(base);
        Ok(self)
    }

    /// Final request URL for `query` against `provider`.
    pub fn request_url(&self, query: &str, provider: SuggestionProvider) -> Result<String> {
        let url = spec_for(provider).request_url(query);
        match &self.base_override {
            None => Ok(url),
            Some(base) => {
                let parsed = Url::parse(&url).with_context(|| format!("invalid provider URL: {url}"))?;
                let origin = base.as_str().trim_end_matches('/');
                Ok(format!("{origin}{}", &parsed[Position::BeforePath..]))
            }
        }
    }
}

#[async_trait]
impl SuggestionSource for SuggestionFetcher {
    async fn fetch(
        &self,
        query: &str,
        provider: SuggestionProvider,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        let url = self.request_url(query, provider)?;
        let started = Instant::now();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(target: "typeahead.fetch", %provider, "fetch cancelled");
                return Ok(Vec::new());
            }
            res = self.http.get_text(&url) => res,
        };

        match response {
            Ok(body) => {
                let suggestions = (spec_for(provider).parse)(&body);
                tracing::debug!(
                    target: "typeahead.fetch",
                    %provider,
                    count = suggestions.len(),
                    body_len = body.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "suggestions fetched"
                );
                Ok(suggestions)
            }
            Err(e) if e.is_request_error() => {
                Err(e).with_context(|| format!("building {provider} suggestion request"))
            }
            Err(e) => {
                tracing::warn!(
                    target: "typeahead.fetch",
                    %provider,
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "suggestion fetch failed"
                );
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_override_keeps_path_and_query() {
        let fetcher = SuggestionFetcher::new(Duration::from_secs(1))
            .unwrap()
            .with_base_url("http://127.0.0.1:8080/")
            .unwrap();
        let url = fetcher
            .request_url("cat food", SuggestionProvider::Ecosia)
            .unwrap();
        assert_eq!(url, "http://127.0.0.1:8080/?q=cat%20food");
    }

    #[test]
    fn default_urls_are_untouched() {
        let fetcher = SuggestionFetcher::new(Duration::from_secs(1)).unwrap();
        let url = fetcher.request_url("cat", SuggestionProvider::Brave).unwrap();
        assert_eq!(url, "https://search.brave.com/api/suggest?rich=true&q=cat");
    }
}
