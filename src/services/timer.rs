//! Start/pause/resume/stop timer.
//!
//! [`Timer`] is the pure state machine: it counts one active second per
//! [`Timer::tick`] while running and measures pauses on an injected
//! [`Clock`]. [`TimerSession`] pairs a timer with the tokio task that ticks
//! it once per second; the task only exists while the timer is running.
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --resume--> Running
//!   ^                |                  |
//!   +------stop------+-------stop-------+
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::clock::Clock;
use crate::models::format_clock;

/// Description recorded when the user leaves it blank.
pub const DEFAULT_DESCRIPTION: &str = "Work on project";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    #[error("Please select a project before starting the timer")]
    NoProject,

    #[error("The timer is already running")]
    AlreadyRunning,

    #[error("Project and description cannot be changed while the timer is running")]
    Locked,
}

impl From<TimerError> for crate::Error {
    fn from(err: TimerError) -> Self {
        crate::Error::Validation(err.to_string())
    }
}

/// An interval of work produced by stopping the timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedEntry {
    pub project_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Active seconds (ticks while running).
    pub duration: u64,
    /// Seconds spent paused.
    pub paused_duration: u64,
    pub description: String,
}

/// Point-in-time view of a timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub project_id: Option<String>,
    pub description: String,
    pub start_time: Option<DateTime<Utc>>,
    pub duration: u64,
    pub paused_duration: u64,
    /// `duration` as `HH:MM:SS`.
    pub display: String,
}

pub struct Timer {
    clock: Arc<dyn Clock>,
    state: TimerState,
    project_id: Option<String>,
    description: String,
    started_at: Option<DateTime<Utc>>,
    paused_at: Option<Instant>,
    elapsed: u64,
    paused: u64,
    /// Bumped on every entry into `Running`; ticks from an older run are ignored.
    run: u64,
}

impl Timer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: TimerState::Idle,
            project_id: None,
            description: String::new(),
            started_at: None,
            paused_at: None,
            elapsed: 0,
            paused: 0,
            run: 0,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn run(&self) -> u64 {
        self.run
    }

    /// Choose the project to time. Empty ids clear the selection.
    pub fn select_project(&mut self, project_id: Option<String>) -> Result<(), TimerError> {
        if self.state != TimerState::Idle {
            return Err(TimerError::Locked);
        }
        self.project_id = project_id.filter(|id| !id.trim().is_empty());
        Ok(())
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), TimerError> {
        if self.state != TimerState::Idle {
            return Err(TimerError::Locked);
        }
        self.description = description.into();
        Ok(())
    }

    pub fn selected_project(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn start(&mut self) -> Result<(), TimerError> {
        if self.state != TimerState::Idle {
            return Err(TimerError::AlreadyRunning);
        }
        if self.project_id.is_none() {
            return Err(TimerError::NoProject);
        }

        self.started_at = Some(self.clock.wall_now());
        self.state = TimerState::Running;
        self.run += 1;
        Ok(())
    }

    /// Returns true if the timer moved to `Paused`.
    pub fn pause(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.paused_at = Some(self.clock.now());
        self.state = TimerState::Paused;
        true
    }

    /// Returns true if the timer moved back to `Running`.
    pub fn resume(&mut self) -> bool {
        if self.state != TimerState::Paused {
            return false;
        }
        self.paused += self.current_pause_secs();
        self.paused_at = None;
        self.state = TimerState::Running;
        self.run += 1;
        true
    }

    /// Count one active second. Ignored unless running.
    pub fn tick(&mut self) {
        if self.state == TimerState::Running {
            self.elapsed += 1;
        }
    }

    /// Count one active second on behalf of the ticker for `run`.
    pub fn tick_run(&mut self, run: u64) {
        if run == self.run {
            self.tick();
        }
    }

    /// The entry stopping now would record, without changing state.
    /// Returns `None` when idle.
    pub fn completed(&self) -> Option<CompletedEntry> {
        if self.state == TimerState::Idle {
            return None;
        }

        let description = match self.description.trim() {
            "" => DEFAULT_DESCRIPTION.to_string(),
            text => text.to_string(),
        };

        match (&self.project_id, self.started_at) {
            (Some(project_id), Some(start_time)) => Some(CompletedEntry {
                project_id: project_id.clone(),
                start_time,
                end_time: self.clock.wall_now(),
                duration: self.elapsed,
                paused_duration: self.paused_total(),
                description,
            }),
            _ => None,
        }
    }

    /// Finish timing and return to idle. Returns `None` when idle.
    pub fn stop(&mut self) -> Option<CompletedEntry> {
        if self.state == TimerState::Idle {
            return None;
        }
        let entry = self.completed();
        self.reset();
        entry
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            project_id: self.project_id.clone(),
            description: self.description.clone(),
            start_time: self.started_at,
            duration: self.elapsed,
            paused_duration: self.paused_total(),
            display: format_clock(self.elapsed),
        }
    }

    /// Accumulated pauses plus the pause in progress, if any.
    fn paused_total(&self) -> u64 {
        self.paused + self.current_pause_secs()
    }

    fn current_pause_secs(&self) -> u64 {
        self.paused_at
            .map(|at| self.clock.now().saturating_duration_since(at).as_secs())
            .unwrap_or(0)
    }

    fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.project_id = None;
        self.description.clear();
        self.started_at = None;
        self.paused_at = None;
        self.elapsed = 0;
        self.paused = 0;
    }
}

/// A timer plus the task that ticks it.
pub struct TimerSession {
    timer: Arc<Mutex<Timer>>,
    ticker: Option<JoinHandle<()>>,
    period: Duration,
}

impl TimerSession {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_period(clock, Duration::from_secs(1))
    }

    pub fn with_period(clock: Arc<dyn Clock>, period: Duration) -> Self {
        Self {
            timer: Arc::new(Mutex::new(Timer::new(clock))),
            ticker: None,
            period,
        }
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        self.timer.lock().await.snapshot()
    }

    pub async fn selected_project(&self) -> Option<String> {
        self.timer.lock().await.selected_project().map(str::to_string)
    }

    pub async fn state(&self) -> TimerState {
        self.timer.lock().await.state()
    }

    /// Update the project and/or description while idle.
    pub async fn select(
        &self,
        project_id: Option<String>,
        description: Option<String>,
    ) -> Result<TimerSnapshot, TimerError> {
        let mut timer = self.timer.lock().await;
        if let Some(project_id) = project_id {
            timer.select_project(Some(project_id))?;
        }
        if let Some(description) = description {
            timer.set_description(description)?;
        }
        Ok(timer.snapshot())
    }

    pub async fn start(&mut self) -> Result<TimerSnapshot, TimerError> {
        let (snapshot, run) = {
            let mut timer = self.timer.lock().await;
            timer.start()?;
            (timer.snapshot(), timer.run())
        };
        self.spawn_ticker(run);
        Ok(snapshot)
    }

    pub async fn pause(&mut self) -> TimerSnapshot {
        let mut timer = self.timer.lock().await;
        if timer.pause() {
            if let Some(ticker) = self.ticker.take() {
                ticker.abort();
            }
        }
        timer.snapshot()
    }

    pub async fn resume(&mut self) -> TimerSnapshot {
        let (snapshot, resumed, run) = {
            let mut timer = self.timer.lock().await;
            let resumed = timer.resume();
            (timer.snapshot(), resumed, timer.run())
        };
        if resumed {
            self.spawn_ticker(run);
        }
        snapshot
    }

    pub async fn completed(&self) -> Option<CompletedEntry> {
        self.timer.lock().await.completed()
    }

    pub async fn stop(&mut self) -> Option<CompletedEntry> {
        self.stop_ticker();
        self.timer.lock().await.stop()
    }

    fn spawn_ticker(&mut self, run: u64) {
        self.stop_ticker();

        let timer = Arc::clone(&self.timer);
        let period = self.period;
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                timer.lock().await.tick_run(run);
            }
        }));
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    #[cfg(test)]
    fn has_ticker(&self) -> bool {
        self.ticker.is_some()
    }
}

impl Drop for TimerSession {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::{ManualClock, SystemClock};

    fn wall() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-04T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn manual_timer() -> (Arc<ManualClock>, Timer) {
        let clock = Arc::new(ManualClock::new(wall()));
        let timer = Timer::new(clock.clone());
        (clock, timer)
    }

    #[test]
    fn test_start_without_project_is_rejected() {
        let (_clock, mut timer) = manual_timer();

        assert_eq!(timer.start(), Err(TimerError::NoProject));
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.stop(), None);
    }

    #[test]
    fn test_blank_project_id_counts_as_no_selection() {
        let (_clock, mut timer) = manual_timer();
        timer.select_project(Some("   ".into())).unwrap();

        assert_eq!(timer.start(), Err(TimerError::NoProject));
    }

    #[test]
    fn test_stop_while_idle_is_noop() {
        let (_clock, mut timer) = manual_timer();
        timer.select_project(Some("p1".into())).unwrap();

        assert_eq!(timer.stop(), None);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.selected_project(), Some("p1"));
    }

    #[test]
    fn test_five_ticks_then_pause_resume_stop() {
        let (clock, mut timer) = manual_timer();
        timer.select_project(Some("p1".into())).unwrap();
        timer.start().unwrap();

        for _ in 0..5 {
            clock.advance(Duration::from_secs(1));
            timer.tick();
        }
        assert!(timer.pause());

        clock.advance(Duration::from_secs(42));
        timer.tick();
        assert!(timer.resume());

        let entry = timer.stop().unwrap();
        assert_eq!(entry.project_id, "p1");
        assert_eq!(entry.duration, 5);
        assert_eq!(entry.paused_duration, 42);
        assert_eq!(entry.start_time, wall());
        assert_eq!(entry.end_time, wall() + chrono::Duration::seconds(47));
        assert_eq!(entry.description, DEFAULT_DESCRIPTION);
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.selected_project(), None);
    }

    #[test]
    fn test_completed_reads_without_stopping() {
        let (clock, mut timer) = manual_timer();
        timer.select_project(Some("p1".into())).unwrap();
        timer.start().unwrap();
        timer.tick();
        timer.pause();
        clock.advance(Duration::from_secs(3));

        let pending = timer.completed().unwrap();
        assert_eq!(pending.duration, 1);
        assert_eq!(pending.paused_duration, 3);
        assert_eq!(timer.state(), TimerState::Paused);
        assert_eq!(timer.selected_project(), Some("p1"));

        assert_eq!(timer.stop(), Some(pending));
        assert_eq!(timer.completed(), None);
    }

    #[test]
    fn test_paused_duration_sums_every_pause() {
        let (clock, mut timer) = manual_timer();
        timer.select_project(Some("p1".into())).unwrap();
        timer.start().unwrap();

        let pauses = [3u64, 0, 17, 1];
        let mut ticks = 0;
        for (i, pause) in pauses.iter().enumerate() {
            for _ in 0..=i {
                timer.tick();
                ticks += 1;
            }
            timer.pause();
            clock.advance(Duration::from_secs(*pause));
            timer.resume();
        }

        let entry = timer.stop().unwrap();
        assert_eq!(entry.duration, ticks);
        assert_eq!(entry.paused_duration, pauses.iter().sum::<u64>());
    }

    #[test]
    fn test_partial_seconds_of_pause_are_floored() {
        let (clock, mut timer) = manual_timer();
        timer.select_project(Some("p1".into())).unwrap();
        timer.start().unwrap();

        timer.pause();
        clock.advance(Duration::from_millis(2999));
        timer.resume();

        assert_eq!(timer.snapshot().paused_duration, 2);
    }

    #[test]
    fn test_stop_while_paused_counts_current_pause() {
        let (clock, mut timer) = manual_timer();
        timer.select_project(Some("p1".into())).unwrap();
        timer.set_description("  Writing docs  ").unwrap();
        timer.start().unwrap();
        timer.tick();
        timer.pause();
        clock.advance(Duration::from_secs(30));

        let entry = timer.stop().unwrap();
        assert_eq!(entry.duration, 1);
        assert_eq!(entry.paused_duration, 30);
        assert_eq!(entry.description, "Writing docs");
    }

    #[test]
    fn test_zero_duration_entry_is_allowed() {
        let (_clock, mut timer) = manual_timer();
        timer.select_project(Some("p1".into())).unwrap();
        timer.start().unwrap();

        let entry = timer.stop().unwrap();
        assert_eq!(entry.duration, 0);
        assert_eq!(entry.paused_duration, 0);
    }

    #[test]
    fn test_inputs_locked_while_timing() {
        let (_clock, mut timer) = manual_timer();
        timer.select_project(Some("p1".into())).unwrap();
        timer.start().unwrap();

        assert_eq!(timer.select_project(Some("p2".into())), Err(TimerError::Locked));
        assert_eq!(timer.set_description("other"), Err(TimerError::Locked));
        assert_eq!(timer.start(), Err(TimerError::AlreadyRunning));

        timer.pause();
        assert_eq!(timer.select_project(Some("p2".into())), Err(TimerError::Locked));
        assert_eq!(timer.selected_project(), Some("p1"));
    }

    #[test]
    fn test_ticks_ignored_unless_running() {
        let (_clock, mut timer) = manual_timer();
        timer.tick();
        assert_eq!(timer.snapshot().duration, 0);

        timer.select_project(Some("p1".into())).unwrap();
        timer.start().unwrap();
        timer.tick();
        timer.pause();
        timer.tick();
        timer.tick();

        assert_eq!(timer.snapshot().duration, 1);
    }

    #[test]
    fn test_stale_run_ticks_are_ignored() {
        let (_clock, mut timer) = manual_timer();
        timer.select_project(Some("p1".into())).unwrap();
        timer.start().unwrap();
        let first_run = timer.run();
        timer.pause();
        timer.resume();

        timer.tick_run(first_run);
        assert_eq!(timer.snapshot().duration, 0);

        timer.tick_run(timer.run());
        assert_eq!(timer.snapshot().duration, 1);
    }

    #[test]
    fn test_pause_and_resume_are_noops_in_wrong_state() {
        let (_clock, mut timer) = manual_timer();
        assert!(!timer.pause());
        assert!(!timer.resume());

        timer.select_project(Some("p1".into())).unwrap();
        timer.start().unwrap();
        assert!(!timer.resume());
        assert!(timer.pause());
        assert!(!timer.pause());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_ticks_once_per_second_while_running() {
        let mut session = TimerSession::new(Arc::new(SystemClock));
        session.select(Some("p1".into()), None).await.unwrap();
        session.start().await.unwrap();
        assert!(session.has_ticker());

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        let paused = session.pause().await;
        assert_eq!(paused.state, TimerState::Paused);
        assert_eq!(paused.duration, 5);
        assert!(!session.has_ticker());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(session.snapshot().await.duration, 5);

        let resumed = session.resume().await;
        assert_eq!(resumed.state, TimerState::Running);
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        let entry = session.stop().await.unwrap();
        assert_eq!(entry.duration, 7);
        assert_eq!(entry.paused_duration, 10);
        assert!(!session.has_ticker());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(session.snapshot().await.duration, 0);
        assert_eq!(session.state().await, TimerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_start_without_project_spawns_nothing() {
        let mut session = TimerSession::new(Arc::new(SystemClock));

        assert_eq!(session.start().await, Err(TimerError::NoProject));
        assert!(!session.has_ticker());
        assert_eq!(session.stop().await, None);
    }
}
