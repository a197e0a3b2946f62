//! Test fetchers — mock `JsonFetcher` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use dcevent_core::error::TransportError;
use dcevent_core::fetch::JsonFetcher;
use serde_json::Value;
use tokio::sync::watch;

/// A fetcher that answers from a fixed URL → response table and records
/// every requested URL. Unknown URLs answer with HTTP 404.
#[derive(Debug, Default)]
pub struct RecordingFetcher {
    responses: HashMap<String, Result<Value, TransportError>>,
    requested: Mutex<Vec<String>>,
}

impl RecordingFetcher {
    /// Create a fetcher with no configured responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `body`.
    #[must_use]
    pub fn with_json(mut self, url: impl Into<String>, body: Value) -> Self {
        self.responses.insert(url.into(), Ok(body));
        self
    }

    /// Answer `url` with `error`.
    #[must_use]
    pub fn with_error(mut self, url: impl Into<String>, error: TransportError) -> Self {
        self.responses.insert(url.into(), Err(error));
        self
    }

    /// Returns a snapshot of all requested URLs, in request order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    /// Number of times `url` was requested.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn request_count(&self, url: &str) -> usize {
        self.requested
            .lock()
            .unwrap()
            .iter()
            .filter(|u| *u == url)
            .count()
    }

    fn respond(&self, url: &str) -> Result<Value, TransportError> {
        self.requested.lock().unwrap().push(url.to_owned());
        self.responses
            .get(url)
            .cloned()
            .unwrap_or(Err(TransportError::Status(404)))
    }
}

#[async_trait]
impl JsonFetcher for RecordingFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, TransportError> {
        self.respond(url)
    }
}

/// A fetcher that always fails with a connection error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingFetcher;

#[async_trait]
impl JsonFetcher for FailingFetcher {
    async fn fetch_json(&self, _url: &str) -> Result<Value, TransportError> {
        Err(TransportError::Request("connection refused".into()))
    }
}

/// A fetcher whose requests never complete. Records requested URLs.
#[derive(Debug, Default)]
pub struct PendingFetcher {
    requested: Mutex<Vec<String>>,
}

impl PendingFetcher {
    /// Returns a snapshot of all requested URLs.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl JsonFetcher for PendingFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, TransportError> {
        self.requested.lock().unwrap().push(url.to_owned());
        std::future::pending().await
    }
}

/// A `RecordingFetcher` whose requests are held back until [`open`] is
/// called, so tests can pile up callers on an in-flight request.
///
/// URLs are recorded as soon as the request starts.
///
/// [`open`]: GatedFetcher::open
#[derive(Debug)]
pub struct GatedFetcher {
    inner: RecordingFetcher,
    gate: watch::Sender<bool>,
}

impl GatedFetcher {
    /// Wrap `inner`, starting with the gate closed.
    #[must_use]
    pub fn new(inner: RecordingFetcher) -> Self {
        let (gate, _) = watch::channel(false);
        Self { inner, gate }
    }

    /// Let every pending and future request complete.
    pub fn open(&self) {
        self.gate.send_replace(true);
    }

    /// Returns a snapshot of all requested URLs.
    pub fn requested(&self) -> Vec<String> {
        self.inner.requested()
    }

    /// Number of times `url` was requested.
    pub fn request_count(&self, url: &str) -> usize {
        self.inner.request_count(url)
    }
}

#[async_trait]
impl JsonFetcher for GatedFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, TransportError> {
        self.inner.requested.lock().unwrap().push(url.to_owned());
        let mut open = self.gate.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = open.wait_for(|is_open| *is_open).await;
        self.inner
            .responses
            .get(url)
            .cloned()
            .unwrap_or(Err(TransportError::Status(404)))
    }
}
