//! Routes exposing the orchestrated event queries as JSON.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};
use tracing::{info, instrument};
use uuid::Uuid;

use dcevent_signups::domain::contest::Contest;
use dcevent_signups::domain::signup::Signup;

use crate::error::ApiHttpError;
use crate::state::AppState;

/// GET /{event_id}/contests
#[instrument(skip(state))]
async fn event_contests(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<Contest>>, ApiHttpError> {
    let correlation_id = Uuid::new_v4();
    info!(%correlation_id, "handling event_contests query");

    let directory = state.orchestrator().fetch_event_contests(&event_id).await?;

    Ok(Json(directory.contests().to_vec()))
}

/// GET /{event_id}/signups
#[instrument(skip(state))]
async fn event_signups(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<Signup>>, ApiHttpError> {
    let correlation_id = Uuid::new_v4();
    info!(%correlation_id, "handling event_signups query");

    let signups = state.orchestrator().fetch_event_signups(&event_id).await?;

    Ok(Json(signups.as_ref().clone()))
}

/// GET /{event_id}/contests/{contest}/signups/{selection}
#[instrument(skip(state))]
async fn contest_signups(
    State(state): State<AppState>,
    Path((event_id, contest, selection)): Path<(String, String, String)>,
) -> Result<Json<Vec<Signup>>, ApiHttpError> {
    let correlation_id = Uuid::new_v4();
    info!(%correlation_id, "handling contest_signups query");

    let signups = state
        .orchestrator()
        .fetch_contest_signups(&event_id, &contest, &selection)
        .await?;

    Ok(Json(signups.as_ref().clone()))
}

/// Returns the router for event queries.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{event_id}/contests", get(event_contests))
        .route("/{event_id}/signups", get(event_signups))
        .route(
            "/{event_id}/contests/{contest}/signups/{selection}",
            get(contest_signups),
        )
}
