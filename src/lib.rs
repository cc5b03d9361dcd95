//! timetrack - personal time tracking server
//!
//! Projects, time entries, a server-side start/pause/resume/stop timer and
//! per-project analytics, behind a bearer-token JSON API.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

pub use config::config;
pub use error::{Error, Result};
pub use state::AppState;
