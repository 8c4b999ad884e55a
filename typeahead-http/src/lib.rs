//! Minimal HTTP client for provider autocomplete endpoints.
//!
//! - One attempt per request, bounded by the client's timeout
//! - Non-2xx statuses become [`HttpError::Status`] with a body snippet
//! - Redacts sensitive query params and never logs secret values
//! - Optional *raw* response logging via `TYPEAHEAD_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```no_run
//! # async fn demo() -> Result<(), typeahead_http::HttpError> {
//! use std::time::Duration;
//!
//! let client = typeahead_http::HttpClient::new(Duration::from_secs(5))?;
//! let body = client
//!     .get_text("https://duckduckgo.com/ac/?type=json&q=rust")
//!     .await?;
//! # let _ = body;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response status and final errors. Raw bodies (target `http.raw`) are only
//! logged when `TYPEAHEAD_HTTP_RAW=1`.

use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode, Url};
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;

const RAW_ENV: &str = "TYPEAHEAD_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) typeahead/0.1";

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("server returned error {status}: {message}")]
    Status { status: StatusCode, message: String },
}

impl HttpError {
    /// True for failures caused by the caller's input rather than the remote side.
    pub fn is_request_error(&self) -> bool {
        matches!(self, HttpError::Url(_) | HttpError::Build(_))
    }
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Client whose requests each give up after `timeout`.
    ///
    /// ```no_run
    /// use typeahead_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new(Duration::from_secs(3))?;
    /// assert_eq!(client.timeout(), Duration::from_secs(3));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let inner = Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self { inner, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET an absolute URL and return the body as text, whatever its content type.
    pub async fn get_text(&self, url: &str) -> Result<String, HttpError> {
        let url = Url::parse(url).map_err(|e| HttpError::Url(e.to_string()))?;
        let bytes = self.get_bytes(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn get_bytes(&self, url: Url) -> Result<bytes::Bytes, HttpError> {
        let timeout = self.timeout;
        let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
        tracing::debug!(
            target: "http",
            host_path = %host_path,
            query = ?redact_query(&url),
            timeout_ms = timeout.as_millis() as u64,
            "http.request.start"
        );

        let t0 = Instant::now();
        let resp = self
            .inner
            .get(url)
            .timeout(timeout)
            .header(USER_AGENT, DEFAULT_USER_AGENT)
            .send()
            .await
            .map_err(|err| classify(err, timeout, &host_path, "send"))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| classify(err, timeout, &host_path, "body"))?;

        tracing::debug!(
            target: "http",
            %status,
            duration_ms = t0.elapsed().as_millis() as u64,
            body_len = bytes.len(),
            "http.response"
        );

        if raw_enabled() {
            let mut body_snip = bytes.to_vec();
            let truncated = body_snip.len() > RAW_MAX_BODY;
            body_snip.truncate(RAW_MAX_BODY);
            tracing::info!(
                target: "http.raw",
                status = %status,
                body = %String::from_utf8_lossy(&body_snip),
                truncated
            );
        }

        if status.is_success() {
            return Ok(bytes);
        }

        let message = snip_body(&bytes);
        tracing::warn!(target: "http", %status, host_path = %host_path, body_snippet = %message, "http.error");
        Err(HttpError::Status { status, message })
    }
}

// ==============================
// Helpers
// ==============================

fn classify(err: reqwest::Error, timeout: Duration, host_path: &str, stage: &str) -> HttpError {
    if err.is_timeout() {
        tracing::debug!(target: "http", host_path, stage, "http.timeout");
        return HttpError::Timeout(timeout);
    }
    if err.is_builder() {
        return HttpError::Build(err.to_string());
    }
    let message = err.to_string();
    tracing::warn!(target: "http", host_path, stage, message = %message, "http.network_error");
    HttpError::Network(message)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > 500 {
        let mut cut = 500;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

fn is_secret_param(key: &str) -> bool {
    matches!(
        key.to_ascii_lowercase().as_str(),
        "access_token" | "appid" | "auth" | "key" | "api_key" | "token" | "secret" | "client_secret"
    )
}

/// Query pairs of `url`, with secret values masked.
fn redact_query(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .map(|(k, v)| {
            let v = if is_secret_param(&k) {
                "<redacted>".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect()
}
