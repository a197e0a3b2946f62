//! Populates every container of a page.
//!
//! One page owns one orchestrator, so containers showing the same event share
//! the contest directory and any identical signup request.

use std::sync::Arc;

use dcevent_core::error::ApiError;
use dcevent_signups::application::orchestrator::RequestOrchestrator;
use dcevent_signups::domain::signup::Signup;
use tokio::sync::mpsc;
use tracing::debug;

use crate::container::{Container, ContainerRequest};
use crate::error::WidgetError;
use crate::format::{FormatHooks, ItemHook, format_signups_with};

/// Renderer for the containers of one page.
#[derive(Debug, Clone)]
pub struct Page {
    orchestrator: RequestOrchestrator,
    hooks: FormatHooks,
    default_hook: Option<String>,
}

fn rendered(
    outcome: Result<&[Signup], &ApiError>,
    hook: Option<&ItemHook>,
) -> Result<String, WidgetError> {
    outcome
        .map(|signups| format_signups_with(signups, hook))
        .map_err(|e| WidgetError::Api(e.clone()))
}

impl Page {
    /// Creates a page backed by `orchestrator`, without item hooks.
    #[must_use]
    pub fn new(orchestrator: RequestOrchestrator) -> Self {
        Self {
            orchestrator,
            hooks: FormatHooks::default(),
            default_hook: None,
        }
    }

    /// Item hooks containers may name in `data-format-hook`.
    #[must_use]
    pub fn with_format_hooks(mut self, hooks: FormatHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Hook applied to containers that do not name their own.
    #[must_use]
    pub fn with_default_hook(mut self, name: Option<String>) -> Self {
        self.default_hook = name.filter(|n| !n.is_empty());
        self
    }

    fn item_hook(&self, container: &Container) -> Result<Option<ItemHook>, WidgetError> {
        let Some(name) = container.format_hook.as_ref().or(self.default_hook.as_ref()) else {
            return Ok(None);
        };
        self.hooks
            .get(name)
            .cloned()
            .map(Some)
            .ok_or_else(|| WidgetError::UnknownFormatHook(name.clone()))
    }

    /// The orchestrator shared by this page's containers.
    #[must_use]
    pub fn orchestrator(&self) -> &RequestOrchestrator {
        &self.orchestrator
    }

    /// Starts the request of every container and calls `on_rendered` with
    /// the container's index and its HTML as each list becomes available.
    ///
    /// Containers that select nothing are reported immediately. Containers
    /// whose data is already cached are reported before this returns.
    pub fn populate<F>(&self, containers: &[Container], on_rendered: F)
    where
        F: Fn(usize, Result<String, WidgetError>) + Send + Sync + 'static,
    {
        let on_rendered = Arc::new(on_rendered);
        for (index, container) in containers.iter().enumerate() {
            let sink = Arc::clone(&on_rendered);
            let hook = match self.item_hook(container) {
                Ok(hook) => hook,
                Err(e) => {
                    sink(index, Err(e));
                    continue;
                }
            };
            match container.request() {
                Ok(ContainerRequest::ContestSignups { contest, selection }) => {
                    debug!(
                        index,
                        event_id = %container.event_id,
                        contest,
                        selection,
                        "populating contest container"
                    );
                    self.orchestrator.get_contest_signups(
                        &container.event_id,
                        contest,
                        selection,
                        move |outcome| sink(index, rendered(outcome, hook.as_ref())),
                    );
                }
                Ok(ContainerRequest::EventSignups) => {
                    debug!(index, event_id = %container.event_id, "populating event container");
                    self.orchestrator
                        .get_event_signups(&container.event_id, move |outcome| {
                            sink(index, rendered(outcome, hook.as_ref()));
                        });
                }
                Err(e) => sink(index, Err(e)),
            }
        }
    }

    /// Renders every container and returns the results in input order.
    ///
    /// Waits as long as the slowest request; requests that never complete
    /// keep this pending.
    pub async fn render(&self, containers: &[Container]) -> Vec<Result<String, WidgetError>> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.populate(containers, move |index, result| {
            // The receiver only goes away when the caller stops waiting.
            let _ = tx.send((index, result));
        });

        let mut results: Vec<Option<Result<String, WidgetError>>> =
            (0..containers.len()).map(|_| None).collect();
        let mut remaining = containers.len();
        while remaining > 0 {
            let Some((index, result)) = rx.recv().await else {
                break;
            };
            results[index] = Some(result);
            remaining -= 1;
        }

        results
            .into_iter()
            .map(|r| r.unwrap_or(Err(WidgetError::Abandoned)))
            .collect()
    }
}
