//! Transports that perform a single HTTP GET.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::{FetchError, FetchResult};

/// Raw response from a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A single-shot blocking GET.
///
/// Implementations must not retry; retries belong to [`crate::Fetcher`].
pub trait Transport: Send + Sync {
    fn get(&self, url: &str, timeout: Duration) -> FetchResult<HttpResponse>;
}

/// HTTPS transport backed by `reqwest`'s blocking client.
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Build a transport with a fresh client.
    pub fn new() -> FetchResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "http")]
impl Transport for HttpTransport {
    fn get(&self, url: &str, timeout: Duration) -> FetchResult<HttpResponse> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

/// Scripted transport for tests and offline hosts.
///
/// Replays queued results in order; once the queue is empty every call
/// fails with a transport error.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<FetchResult<HttpResponse>>>,
    calls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result for the next call.
    pub fn push(&self, result: FetchResult<HttpResponse>) -> &Self {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(result);
        }
        self
    }

    /// Number of `get` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn get(&self, _url: &str, _timeout: Duration) -> FetchResult<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .responses
            .lock()
            .map_err(|_| FetchError::Transport("mock transport lock poisoned".into()))?
            .pop_front();
        next.unwrap_or_else(|| Err(FetchError::Transport("no scripted response".into())))
    }
}
