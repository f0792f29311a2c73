//! HTTP fetching with a fixed-interval retry policy.
//!
//! A fetch makes `retries` preliminary attempts, sleeping `retry_interval` after each
//! failure, then one terminal attempt whose outcome is returned as-is. Every attempt is
//! bounded by `timeout`.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

/// Default number of preliminary attempts before the terminal one.
pub const DEFAULT_RETRIES: u32 = 10;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default pause between attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Retry and timeout settings for a [`HttpFetcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Preliminary attempts made before the terminal attempt.
    pub retries: u32,
    /// Bound on a single request, connection through body.
    pub timeout: Duration,
    /// Fixed pause after each failed preliminary attempt.
    pub retry_interval: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl FetchPolicy {
    /// Total number of requests a persistently failing fetch makes.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

/// What went wrong with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request did not complete within the timeout.
    Timeout,
    /// The connection could not be established.
    Connection,
    /// The server answered with a non-success status.
    Http,
    /// Anything else (malformed URL, body decode error, ...).
    Other,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Timeout => "timeout",
            Self::Connection => "connection",
            Self::Http => "http",
            Self::Other => "other",
        })
    }
}

/// A fetch that failed on its terminal attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} error fetching {url}: {message}")]
pub struct FetchError {
    /// Classification of the last failure.
    pub kind: FailureKind,
    /// URL that was requested.
    pub url: String,
    /// HTTP status, when the server answered.
    pub status: Option<u16>,
    /// Human-readable detail.
    pub message: String,
}

impl FetchError {
    fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_connect() {
            FailureKind::Connection
        } else if err.is_status() {
            FailureKind::Http
        } else {
            FailureKind::Other
        };
        Self {
            kind,
            url: url.to_string(),
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// A successful response.
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Response body.
    pub body: Bytes,
    /// Status line, e.g. `200 OK`.
    pub status: String,
    /// Final URL after redirects; relative links resolve against it.
    pub url: String,
}

impl Fetched {
    /// The body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Something that can fetch a URL. Implemented over HTTP by [`HttpFetcher`] and by
/// in-memory fakes in tests.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch `url`, retrying according to the implementation's policy.
    async fn fetch(&self, url: &str) -> Result<Fetched, FetchError>;
}

/// [`Fetch`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    policy: FetchPolicy,
}

impl HttpFetcher {
    /// Build a fetcher whose client enforces the policy's timeout.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialized.
    pub fn new(policy: FetchPolicy) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(policy.timeout)
            .build()?;
        Ok(Self { client, policy })
    }

    /// The policy this fetcher applies.
    pub fn policy(&self) -> FetchPolicy {
        self.policy
    }

    async fn attempt(&self, url: &str) -> Result<Fetched, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError {
                kind: FailureKind::Http,
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: format!("server responded {status}"),
            });
        }

        let final_url = response.url().to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;

        Ok(Fetched {
            body,
            status: status.to_string(),
            url: final_url,
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
        for attempt in 1..=self.policy.retries {
            match self.attempt(url).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) => {
                    debug!(
                        url,
                        attempt,
                        max_attempts = self.policy.max_attempts(),
                        kind = %e.kind,
                        "fetch attempt failed: {}",
                        e.message
                    );
                    tokio::time::sleep(self.policy.retry_interval).await;
                }
            }
        }

        self.attempt(url).await.inspect_err(|e| {
            warn!(
                url,
                kind = %e.kind,
                "giving up after {} attempts: {}",
                self.policy.max_attempts(),
                e.message
            );
        })
    }
}
