//! Transport abstraction.

use async_trait::async_trait;

use crate::error::TransportError;

/// Fetches a URL and decodes its body as JSON.
///
/// Implementations report exactly one outcome per call. Callers always drive
/// the returned future from a spawned task, so completion never happens
/// within the call that asked for the data.
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    /// GET `url` and return the decoded JSON document.
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, TransportError>;
}
