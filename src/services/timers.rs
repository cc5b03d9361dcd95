//! Per-user timer registry.
//!
//! Each user gets at most one [`TimerSession`]. Stopping a timer persists
//! the completed interval as a time entry.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::clock::Clock;
use super::timer::{Timer, TimerError, TimerSession, TimerSnapshot, TimerState};
use crate::db::{self, CreateTimeEntry, DbPool, TimeEntry};
use crate::models::new_id;
use crate::Result;

type SessionHandle = Arc<Mutex<TimerSession>>;

/// Result of stopping a timer.
#[derive(Debug, Clone)]
pub struct StopOutcome {
    /// The persisted entry, or `None` if the timer was idle.
    pub entry: Option<TimeEntry>,
    pub timer: TimerSnapshot,
}

#[derive(Clone)]
pub struct TimerService {
    db: DbPool,
    clock: Arc<dyn Clock>,
    sessions: Arc<Mutex<HashMap<String, SessionHandle>>>,
}

impl TimerService {
    pub fn new(db: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            clock,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn session(&self, user_id: &str) -> SessionHandle {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(TimerSession::new(self.clock.clone()))))
            .clone()
    }

    async fn existing_session(&self, user_id: &str) -> Option<SessionHandle> {
        self.sessions.lock().await.get(user_id).cloned()
    }

    fn idle_snapshot(&self) -> TimerSnapshot {
        Timer::new(self.clock.clone()).snapshot()
    }

    /// Current timer state for a user.
    pub async fn status(&self, user_id: &str) -> TimerSnapshot {
        match self.existing_session(user_id).await {
            Some(session) => session.lock().await.snapshot().await,
            None => self.idle_snapshot(),
        }
    }

    /// Select a project and/or set the description. Only allowed while idle.
    pub async fn select(
        &self,
        user_id: &str,
        project_id: Option<String>,
        description: Option<String>,
    ) -> Result<TimerSnapshot> {
        if let Some(project_id) = project_id.as_deref().filter(|id| !id.trim().is_empty()) {
            db::get_project(&self.db, user_id, project_id).await?;
        }

        let session = self.session(user_id).await;
        let session = session.lock().await;
        Ok(session.select(project_id, description).await?)
    }

    /// Start timing, optionally selecting a project and description first.
    pub async fn start(
        &self,
        user_id: &str,
        project_id: Option<String>,
        description: Option<String>,
    ) -> Result<TimerSnapshot> {
        if let Some(project_id) = project_id.as_deref().filter(|id| !id.trim().is_empty()) {
            db::get_project(&self.db, user_id, project_id).await?;
        }

        let session = self.session(user_id).await;
        let mut session = session.lock().await;

        if session.state().await != TimerState::Idle {
            return Err(TimerError::AlreadyRunning.into());
        }

        if project_id.is_some() || description.is_some() {
            session.select(project_id, description).await?;
        }
        let selected = session.selected_project().await.ok_or(TimerError::NoProject)?;
        db::get_project(&self.db, user_id, &selected).await?;

        let snapshot = session.start().await?;
        info!(user_id = %user_id, project_id = %selected, "Timer started");
        Ok(snapshot)
    }

    pub async fn pause(&self, user_id: &str) -> TimerSnapshot {
        match self.existing_session(user_id).await {
            Some(session) => {
                let snapshot = session.lock().await.pause().await;
                debug!(user_id = %user_id, duration = snapshot.duration, "Timer paused");
                snapshot
            }
            None => self.idle_snapshot(),
        }
    }

    pub async fn resume(&self, user_id: &str) -> TimerSnapshot {
        match self.existing_session(user_id).await {
            Some(session) => {
                let snapshot = session.lock().await.resume().await;
                debug!(user_id = %user_id, "Timer resumed");
                snapshot
            }
            None => self.idle_snapshot(),
        }
    }

    /// Stop the timer and save the interval. A no-op when idle.
    pub async fn stop(&self, user_id: &str) -> Result<StopOutcome> {
        let Some(session) = self.existing_session(user_id).await else {
            return Ok(StopOutcome {
                entry: None,
                timer: self.idle_snapshot(),
            });
        };

        // The session is only reset once the entry is saved, so a failed
        // insert leaves the timer running and the stop can be retried.
        let mut session = session.lock().await;
        let Some(completed) = session.completed().await else {
            let timer = session.snapshot().await;
            return Ok(StopOutcome { entry: None, timer });
        };

        let entry = db::create_time_entry(
            &self.db,
            CreateTimeEntry {
                id: new_id(),
                user_id: user_id.to_string(),
                project_id: completed.project_id,
                start_time: completed.start_time,
                end_time: completed.end_time,
                duration: i64::try_from(completed.duration).unwrap_or(i64::MAX),
                paused_duration: i64::try_from(completed.paused_duration).unwrap_or(i64::MAX),
                description: Some(completed.description),
            },
        )
        .await?;

        session.stop().await;
        let timer = session.snapshot().await;

        info!(
            user_id = %user_id,
            entry_id = %entry.id,
            duration = entry.duration,
            paused_duration = entry.paused_duration,
            "Timer stopped"
        );

        Ok(StopOutcome {
            entry: Some(entry),
            timer,
        })
    }
}
