//! Shared test doubles and utilities for the DCEvent signup widget.

mod fetcher;
mod fixtures;

pub use fetcher::{FailingFetcher, GatedFetcher, PendingFetcher, RecordingFetcher};
pub use fixtures::{TEST_API_BASE, contest_directory_json, event_signups_json, test_endpoints};
