//! Widget rendering route.
//!
//! Takes the `data-*` attributes of every container on a page and returns the
//! HTML each container should display. One orchestrator serves the whole
//! request, so containers of the same event share their upstream fetches.

use std::collections::HashMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use dcevent_widget::container::Container;
use dcevent_widget::error::WidgetError;
use dcevent_widget::page::Page;

use crate::error::ErrorBody;
use crate::state::AppState;

/// Most containers one render request may carry.
pub const MAX_CONTAINERS: usize = 64;

/// Request body for POST /render.
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    /// Attribute maps of the containers, in page order.
    pub containers: Vec<HashMap<String, String>>,
    /// Item hook for containers without their own `data-format-hook`.
    #[serde(default)]
    pub format_hook: Option<String>,
}

/// Outcome for one container.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Fragment {
    /// The container's HTML. Empty when the list has no signups.
    Rendered {
        /// Event the container belongs to.
        event_id: String,
        /// Markup to place inside the container.
        html: String,
    },
    /// Why the container stays empty.
    Failed {
        /// Human-readable reason.
        error: String,
    },
}

/// Response body of POST /render; one fragment per requested container.
#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub fragments: Vec<Fragment>,
}

fn failed(error: &WidgetError) -> Fragment {
    Fragment::Failed {
        error: error.to_string(),
    }
}

/// POST /render
#[instrument(skip(state, request), fields(containers = request.containers.len()))]
async fn render(
    State(state): State<AppState>,
    Json(request): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, (StatusCode, Json<ErrorBody>)> {
    let correlation_id = Uuid::new_v4();
    info!(%correlation_id, "handling render request");

    if request.containers.len() > MAX_CONTAINERS {
        warn!(%correlation_id, "too many containers");
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorBody {
                error: "too_many_containers",
                message: format!("at most {MAX_CONTAINERS} containers per request"),
            }),
        ));
    }

    let parsed: Vec<Result<Container, WidgetError>> = request
        .containers
        .iter()
        .map(Container::from_attributes)
        .collect();
    let valid: Vec<Container> = parsed.iter().filter_map(|c| c.as_ref().ok()).cloned().collect();

    let page = Page::new(state.orchestrator())
        .with_format_hooks(state.format_hooks.clone())
        .with_default_hook(request.format_hook);
    let mut rendered = page.render(&valid).await.into_iter();

    let fragments = parsed
        .into_iter()
        .map(|container| match container {
            Ok(container) => match rendered.next() {
                Some(Ok(html)) => Fragment::Rendered {
                    event_id: container.event_id,
                    html,
                },
                Some(Err(e)) => {
                    warn!(
                        %correlation_id,
                        event_id = %container.event_id,
                        error = %e,
                        "container not rendered"
                    );
                    failed(&e)
                }
                None => failed(&WidgetError::Abandoned),
            },
            Err(e) => failed(&e),
        })
        .collect();

    Ok(Json(RenderResponse { fragments }))
}

/// Returns the router for widget rendering.
pub fn router() -> Router<AppState> {
    Router::new().route("/render", post(render))
}
