//! Service layer for timetrack.
//!
//! Contains the business logic behind the API:
//! - Auth (password hashing, token issuance and verification)
//! - Timer (per-user start/pause/resume/stop state machine)
//! - Analytics (range resolution and per-project aggregation)
//! - Clock (time sources injected into the timer)

pub mod analytics;
mod auth;
pub mod clock;
pub mod timer;
mod timers;

pub use auth::{AuthService, Claims, Registration};
pub use clock::{Clock, ManualClock, SystemClock};
pub use timer::{CompletedEntry, TimerError, TimerSnapshot, TimerState};
pub use timers::{StopOutcome, TimerService};
