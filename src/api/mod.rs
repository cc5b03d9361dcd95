//! API Routes for timetrack
//!
//! This module combines all API routes into a single router.
//! Routes are organized by domain and apply appropriate middleware.

mod analytics;
mod auth;
mod projects;
pub mod status;
mod time_entries;
mod timer;

use axum::async_trait;
use axum::body::Body;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::Router;
use serde::de::DeserializeOwned;

use crate::middleware::require_auth;
use crate::{AppState, Error};

/// JSON body extractor that reports malformed bodies as a 400 [`Error`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// Query string extractor that reports bad parameters as a 400 [`Error`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);

/// Largest body [`OptionalApiJson`] will buffer, matching axum's default limit.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// JSON body that may be left out entirely.
///
/// Only an empty (or all-whitespace) body yields `None`. Anything else must
/// be valid JSON for `T`, so a malformed body is a 400 rather than ignored.
#[derive(Debug)]
pub struct OptionalApiJson<T>(pub Option<T>);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| Error::Validation(format!("Failed to read request body: {e}")))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(None));
        }

        let req = Request::from_parts(parts, Body::from(bytes));
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
        Ok(Self(Some(value)))
    }
}

/// Build the complete API router.
///
/// Route structure:
/// - /health - Health checks (public)
/// - /api/auth/* - Registration and login (public), profile (protected)
/// - /api/projects/* - Project CRUD (protected)
/// - /api/time-entries/* - Time entry CRUD (protected)
/// - /api/timer/* - Server-side timer (protected)
/// - /api/analytics - Aggregated reports (protected)
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health endpoints (public)
        .merge(status::routes())
        .nest("/api", api_routes(state))
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Authentication routes (mixed public/protected)
        .nest("/auth", auth::routes(state.clone()))
        .merge(protected_routes(state))
}

/// Protected routes that require a bearer token.
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/projects", projects::routes())
        .nest("/time-entries", time_entries::routes())
        .nest("/timer", timer::routes())
        .nest("/analytics", analytics::routes())
        .layer(axum::middleware::from_fn_with_state(state, require_auth))
}
