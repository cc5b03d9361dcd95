//! Application state for timetrack.
//!
//! Contains the shared state that is passed to all handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::db::DbPool;
use crate::services::{AuthService, Clock, SystemClock, TimerService};
use crate::Result;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DbPool,
    /// Password hashing and token service.
    pub auth: AuthService,
    /// Per-user running timers.
    pub timers: TimerService,
}

impl AppState {
    /// Create a new application state: open the database, apply the schema
    /// and build the services.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = crate::db::init_pool(&config.database.path).await?;
        crate::db::initialize_schema(&db).await?;

        Ok(Self::from_parts(db, config, Arc::new(SystemClock)))
    }

    /// Build state over an existing pool.
    pub fn from_parts(db: DbPool, config: &Config, clock: Arc<dyn Clock>) -> Self {
        let auth = AuthService::new(db.clone(), &config.auth);
        let timers = TimerService::new(db.clone(), clock);

        Self { db, auth, timers }
    }
}
