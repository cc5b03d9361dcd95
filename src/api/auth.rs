//! Authentication Routes
//!
//! Routes:
//! - POST /auth/register - Create an account (public)
//! - POST /auth/login - Exchange credentials for a token (public)
//! - PUT /auth/update - Update username, email or settings
//! - GET /auth/me - Current user

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use super::ApiJson;
use crate::db::{self, PublicUser, UpdateUser};
use crate::middleware::{require_auth, AuthUser};
use crate::models::SettingsPatch;
use crate::services::Registration;
use crate::{AppState, Result};

/// Build auth routes.
pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/update", put(update_profile))
        .route("/me", get(me))
        .layer(axum::middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Partial profile update. Settings are merged field by field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub settings: Option<SettingsPatch>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub status: &'static str,
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub status: &'static str,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>)> {
    let (token, user) = state
        .auth
        .register(Registration {
            username: request.username,
            email: request.email,
            password: request.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            status: "success",
            token,
            user: user.to_public(),
        }),
    ))
}

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let (token, user) = state.auth.login(&request.email, &request.password).await?;

    Ok(Json(TokenResponse {
        status: "success",
        token,
        user: user.to_public(),
    }))
}

/// PUT /auth/update
async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    let input = UpdateUser {
        username: request.username,
        email: request.email,
        settings: request.settings.map(|patch| auth.settings.merge(patch)),
    };

    let user = state.auth.update_profile(&auth.user_id, input).await?;

    Ok(Json(UserResponse {
        status: "success",
        user: user.to_public(),
    }))
}

/// GET /auth/me
async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MeResponse>> {
    let user = db::get_user(&state.db, &auth.user_id).await?;
    Ok(Json(MeResponse {
        user: user.to_public(),
    }))
}
