//! Retrying fetcher.

use std::time::Duration;

use thiserror::Error;

use crate::transport::Transport;

/// Fetch errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote fetching is disabled: {0}")]
    Disabled(String),

    #[error("Gave up on {url} after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether another attempt could succeed.
    ///
    /// Transport failures, 5xx, 408 and 429 are retried; other statuses are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Status { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            FetchError::Disabled(_) | FetchError::Exhausted { .. } => false,
        }
    }
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Timeout and retry policy for one artifact fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPolicy {
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Total attempts including the first (at least 1)
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `n * backoff` before retrying
    pub backoff: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Fetches a URL over a [`Transport`], applying a [`FetchPolicy`].
pub struct Fetcher<T: Transport> {
    transport: T,
    policy: FetchPolicy,
}

impl<T: Transport> Fetcher<T> {
    /// Create a fetcher.
    pub fn new(transport: T, policy: FetchPolicy) -> Self {
        Self { transport, policy }
    }

    /// Get the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch the body of `url`, retrying retryable failures.
    pub fn fetch(&self, url: &str) -> FetchResult<Vec<u8>> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            tracing::debug!(url, attempt, "Fetching artifact");

            let error = match self.transport.get(url, self.policy.timeout) {
                Ok(response) if response.is_success() => {
                    tracing::debug!(url, bytes = response.body.len(), "Fetched artifact");
                    return Ok(response.body);
                }
                Ok(response) => FetchError::Status {
                    url: url.to_string(),
                    status: response.status,
                },
                Err(e) => e,
            };

            if !error.is_retryable() {
                return Err(error);
            }
            if attempt >= max_attempts {
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            tracing::warn!(url, attempt, %error, "Artifact fetch failed, retrying");
            std::thread::sleep(self.policy.backoff * attempt);
            attempt += 1;
        }
    }
}

/// Fetch `url` with the default HTTPS transport.
#[cfg(feature = "http")]
pub fn fetch_url(url: &str, policy: FetchPolicy) -> FetchResult<Vec<u8>> {
    let transport = crate::transport::HttpTransport::new()?;
    Fetcher::new(transport, policy).fetch(url)
}

/// Fetch `url` with the default HTTPS transport.
#[cfg(not(feature = "http"))]
pub fn fetch_url(url: &str, _policy: FetchPolicy) -> FetchResult<Vec<u8>> {
    Err(FetchError::Disabled(format!(
        "built without the `http` feature, cannot fetch {}",
        url
    )))
}
