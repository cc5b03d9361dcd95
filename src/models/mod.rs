//! Data models for timetrack.
//!
//! Defines the value types shared by the database layer, services and
//! API handlers: user settings, project status and display units.

mod project;
mod time_unit;
mod user;

pub use project::*;
pub use time_unit::*;
pub use user::*;

use uuid::Uuid;

/// Generate a new UUID
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
