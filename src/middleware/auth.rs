//! Bearer token authentication middleware.
//!
//! Expects `Authorization: Bearer {jwt}`. The token's subject must name a
//! user that still exists; the loaded user is injected into request
//! extensions as [`AuthUser`].

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::db;
use crate::models::UserSettings;
use crate::{error::Error, AppState};

/// The authenticated caller.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub settings: UserSettings,
}

/// Extract the token from an `Authorization: Bearer` header.
pub fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware that requires a valid bearer token.
///
/// # Errors
///
/// Returns 401 Unauthorized if:
/// - No bearer token is present
/// - The token signature is invalid or the token has expired
/// - The user it names no longer exists
///
/// # Example
///
/// ```rust,ignore
/// use axum::{Router, middleware};
/// use timetrack::middleware::require_auth;
///
/// let app = Router::new()
///     .route("/projects", get(list_projects))
///     .layer(middleware::from_fn_with_state(state.clone(), require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Error> {
    let token = bearer_token(&req).ok_or(Error::Unauthenticated)?;

    let claims = state.auth.verify_token(token).map_err(|e| {
        warn!(error = %e, "Rejected bearer token");
        e
    })?;

    let user = db::find_user(&state.db, &claims.sub)
        .await?
        .ok_or(Error::UserGone)?;

    req.extensions_mut().insert(AuthUser {
        settings: user.settings(),
        user_id: user.id,
        username: user.username,
        email: user.email,
    });

    Ok(next.run(req).await)
}
