//! Page downloads over HTTP
//!
//! Pages are fetched one at a time with a blocking client. Transport failures
//! are retried with exponential backoff: with the default 500 ms base and three
//! attempts the waits are 500 ms then 1 s before the page is given up on.

use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, ClientBuilder};
use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::config::{self, RetryConfig, SourceConfig};
use crate::error::{Error, Result};

/// Anything that can produce the raw bytes of a numbered page
pub trait PageSource {
    /// Fetch one 1-based page. Transport failures are `Error::Transport`.
    fn fetch_page(&self, page: u32) -> Result<Vec<u8>>;
}

/// Page feed of one text on the remote archive
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: Client,
    config: SourceConfig,
    feed_id: u32,
}

impl HttpPageSource {
    pub fn new(config: &SourceConfig, feed_id: u32) -> Result<Self> {
        Self::from_builder(client_builder(config)?, config, feed_id)
    }

    fn from_builder(builder: ClientBuilder, config: &SourceConfig, feed_id: u32) -> Result<Self> {
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: config.clone(),
            feed_id,
        })
    }

    pub fn page_url(&self, page: u32) -> String {
        self.config.page_url(self.feed_id, page)
    }
}

impl PageSource for HttpPageSource {
    fn fetch_page(&self, page: u32) -> Result<Vec<u8>> {
        let url = self.page_url(page);
        debug!("GET {}", url);

        let transport = |e: reqwest::Error| Error::Transport {
            url: url.clone(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(&url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(transport)?;
        let body = response.bytes().map_err(transport)?;

        debug!("Page {}: {} bytes", page, body.len());
        Ok(body.to_vec())
    }
}

/// Client with the fixed header set and timeout of `config`
fn client_builder(config: &SourceConfig) -> Result<ClientBuilder> {
    let referer = HeaderValue::from_str(&config.referer)
        .map_err(|e| Error::Config(format!("Invalid referer '{}': {e}", config.referer)))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(config::ACCEPT));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static(config::ACCEPT_LANGUAGE),
    );
    headers.insert(header::REFERER, referer);

    Ok(Client::builder()
        .user_agent(config::USER_AGENT)
        .default_headers(headers)
        .timeout(config.timeout()))
}

/// How often and how patiently a page request is repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first, at least 1
    pub max_attempts: u32,
    /// Wait before the first retry, doubled for each later retry
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.initial_backoff_ms),
        )
    }

    /// Wait before retry number `retry` (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(1 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Fetch a page, retrying transport failures according to `policy`
///
/// Non-transient errors are returned immediately. When every attempt fails the
/// result is `Error::RetriesExhausted` carrying the last failure.
pub fn fetch_with_retry<S: PageSource + ?Sized>(
    source: &S,
    page: u32,
    policy: &RetryPolicy,
) -> Result<Vec<u8>> {
    let mut last_error: Option<Error> = None;

    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            let delay = policy.backoff(attempt);
            warn!(
                "Page {}: retry {}/{} after {:?}",
                page,
                attempt,
                policy.max_attempts - 1,
                delay
            );
            thread::sleep(delay);
        }

        match source.fetch_page(page) {
            Ok(bytes) => return Ok(bytes),
            Err(e) if e.is_transient() => {
                warn!("Page {}: attempt {} failed: {}", page, attempt + 1, e);
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(Error::RetriesExhausted {
        page,
        attempts: policy.max_attempts,
        last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
    })
}
