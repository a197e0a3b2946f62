//! Shared application state.

use std::sync::Arc;

use dcevent_core::endpoints::Endpoints;
use dcevent_core::fetch::JsonFetcher;
use dcevent_signups::application::orchestrator::RequestOrchestrator;
use dcevent_widget::format::FormatHooks;
use tokio::runtime::Handle;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// URL templates of the upstream API.
    pub endpoints: Endpoints,
    /// Upstream transport.
    pub fetcher: Arc<dyn JsonFetcher>,
    /// Item hooks widget containers may name.
    pub format_hooks: FormatHooks,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(endpoints: Endpoints, fetcher: Arc<dyn JsonFetcher>) -> Self {
        Self {
            endpoints,
            fetcher,
            format_hooks: FormatHooks::default(),
        }
    }

    /// Replaces the item hooks offered to widget containers.
    #[must_use]
    pub fn with_format_hooks(mut self, format_hooks: FormatHooks) -> Self {
        self.format_hooks = format_hooks;
        self
    }

    /// A fresh orchestrator with an empty cache, scoped to one request.
    ///
    /// Must be called from within the Tokio runtime, which is always the
    /// case inside a handler.
    #[must_use]
    pub fn orchestrator(&self) -> RequestOrchestrator {
        RequestOrchestrator::new(
            self.endpoints.clone(),
            Arc::clone(&self.fetcher),
            Handle::current(),
        )
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("endpoints", &self.endpoints)
            .field("format_hooks", &self.format_hooks)
            .finish_non_exhaustive()
    }
}
