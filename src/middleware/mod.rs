//! Middleware for timetrack.
//!
//! - `auth` - bearer token validation; injects [`AuthUser`] for handlers

mod auth;

pub use auth::{bearer_token, require_auth, AuthUser};
