//! Timer Routes
//!
//! One timer per user, kept in memory by the server. Stopping it records a
//! time entry.
//!
//! Routes:
//! - GET /timer - Current timer state
//! - PUT /timer - Select project and description (idle only)
//! - POST /timer/start - Start timing
//! - POST /timer/pause - Pause
//! - POST /timer/resume - Resume
//! - POST /timer/stop - Stop and save the entry

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{ApiJson, OptionalApiJson};
use crate::db::TimeEntryView;
use crate::middleware::AuthUser;
use crate::services::TimerSnapshot;
use crate::{AppState, Result};

/// Build timer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(status).put(select))
        .route("/start", post(start))
        .route("/pause", post(pause))
        .route("/resume", post(resume))
        .route("/stop", post(stop))
}

/// Project and description for the next run. An empty `projectId`
/// clears the selection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TimerSelection {
    pub project_id: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub entry: Option<TimeEntryView>,
    pub timer: TimerSnapshot,
}

/// GET /timer
async fn status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Json<TimerSnapshot> {
    Json(state.timers.status(&auth.user_id).await)
}

/// PUT /timer
async fn select(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<TimerSelection>,
) -> Result<Json<TimerSnapshot>> {
    let snapshot = state
        .timers
        .select(&auth.user_id, request.project_id, request.description)
        .await?;
    Ok(Json(snapshot))
}

/// POST /timer/start
///
/// The body is optional, but a body that is present must be a valid
/// selection.
async fn start(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    OptionalApiJson(request): OptionalApiJson<TimerSelection>,
) -> Result<Json<TimerSnapshot>> {
    let request = request.unwrap_or_default();
    let snapshot = state
        .timers
        .start(&auth.user_id, request.project_id, request.description)
        .await?;
    Ok(Json(snapshot))
}

/// POST /timer/pause
async fn pause(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Json<TimerSnapshot> {
    Json(state.timers.pause(&auth.user_id).await)
}

/// POST /timer/resume
async fn resume(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Json<TimerSnapshot> {
    Json(state.timers.resume(&auth.user_id).await)
}

/// POST /timer/stop
///
/// 201 with the saved entry, or 200 with `entry: null` when the timer was idle.
async fn stop(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<(StatusCode, Json<StopResponse>)> {
    let outcome = state.timers.stop(&auth.user_id).await?;
    let code = if outcome.entry.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        code,
        Json(StopResponse {
            entry: outcome.entry.map(|e| e.into_view()),
            timer: outcome.timer,
        }),
    ))
}
