//! Time entry database queries.
//!
//! Entries are read joined with their project so responses can carry the
//! project's name and colour. The join is a LEFT JOIN restricted to the same
//! owner: an entry whose project was deleted comes back with no project.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::DbPool;

// ============================================================================
// Types
// ============================================================================

/// Time entry record joined with its project.
#[derive(Debug, Clone, FromRow)]
pub struct TimeEntry {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: i64,
    pub paused_duration: i64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub project_name: Option<String>,
    pub project_color: Option<String>,
}

/// Project fields embedded in a time entry response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRef {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Time entry as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryView {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub project: Option<ProjectRef>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: i64,
    pub paused_duration: i64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeEntry {
    /// The joined project, if it still exists.
    pub fn project(&self) -> Option<ProjectRef> {
        match (&self.project_name, &self.project_color) {
            (Some(name), Some(color)) => Some(ProjectRef {
                id: self.project_id.clone(),
                name: name.clone(),
                color: color.clone(),
            }),
            _ => None,
        }
    }

    pub fn into_view(self) -> TimeEntryView {
        let project = self.project();
        TimeEntryView {
            id: self.id,
            user_id: self.user_id,
            project_id: self.project_id,
            project,
            start_time: self.start_time,
            end_time: self.end_time,
            duration: self.duration,
            paused_duration: self.paused_duration,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Input for creating a time entry.
#[derive(Debug, Clone)]
pub struct CreateTimeEntry {
    pub id: String,
    pub user_id: String,
    pub project_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: i64,
    pub paused_duration: i64,
    pub description: Option<String>,
}

/// Filters for listing time entries. All are optional and combine with AND.
#[derive(Debug, Clone, Default)]
pub struct TimeEntryFilter {
    pub project_id: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Replacement values for an existing entry.
#[derive(Debug, Clone)]
pub struct ReplaceTimeEntry {
    pub project_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: i64,
    pub paused_duration: i64,
    pub description: Option<String>,
}

const SELECT_JOINED: &str = r#"
    SELECT e.id, e.user_id, e.project_id, e.start_time, e.end_time,
           e.duration, e.paused_duration, e.description, e.created_at, e.updated_at,
           p.name AS project_name, p.color AS project_color
    FROM time_entries e
    LEFT JOIN projects p ON p.id = e.project_id AND p.user_id = e.user_id
"#;

fn not_found() -> Error {
    Error::NotFound("Time entry not found".into())
}

// ============================================================================
// Queries
// ============================================================================

/// Create a time entry and return it joined with its project.
pub async fn create_time_entry(pool: &DbPool, input: CreateTimeEntry) -> Result<TimeEntry> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO time_entries (
            id, user_id, project_id, start_time, end_time,
            duration, paused_duration, description, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.id)
    .bind(&input.user_id)
    .bind(&input.project_id)
    .bind(input.start_time)
    .bind(input.end_time)
    .bind(input.duration)
    .bind(input.paused_duration)
    .bind(&input.description)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    get_time_entry(pool, &input.user_id, &input.id).await
}

/// Get a time entry by ID, scoped to its owner.
pub async fn get_time_entry(pool: &DbPool, user_id: &str, id: &str) -> Result<TimeEntry> {
    let query = format!("{} WHERE e.id = ? AND e.user_id = ?", SELECT_JOINED);

    sqlx::query_as::<_, TimeEntry>(&query)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(not_found)
}

/// List a user's time entries, most recent start first.
pub async fn list_time_entries(
    pool: &DbPool,
    user_id: &str,
    filter: &TimeEntryFilter,
) -> Result<Vec<TimeEntry>> {
    let mut conditions = vec!["e.user_id = ?"];
    if filter.project_id.is_some() {
        conditions.push("e.project_id = ?");
    }
    if filter.start.is_some() {
        conditions.push("e.start_time >= ?");
    }
    if filter.end.is_some() {
        conditions.push("e.start_time <= ?");
    }

    let query = format!(
        "{} WHERE {} ORDER BY e.start_time DESC, e.rowid DESC",
        SELECT_JOINED,
        conditions.join(" AND ")
    );

    let mut q = sqlx::query_as::<_, TimeEntry>(&query).bind(user_id);
    if let Some(project_id) = &filter.project_id {
        q = q.bind(project_id);
    }
    if let Some(start) = filter.start {
        q = q.bind(start);
    }
    if let Some(end) = filter.end {
        q = q.bind(end);
    }

    q.fetch_all(pool).await.map_err(Error::Database)
}

/// Overwrite every mutable field of an entry owned by `user_id`.
pub async fn replace_time_entry(
    pool: &DbPool,
    user_id: &str,
    id: &str,
    input: ReplaceTimeEntry,
) -> Result<TimeEntry> {
    let result = sqlx::query(
        r#"
        UPDATE time_entries SET
            project_id = ?,
            start_time = ?,
            end_time = ?,
            duration = ?,
            paused_duration = ?,
            description = ?,
            updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&input.project_id)
    .bind(input.start_time)
    .bind(input.end_time)
    .bind(input.duration)
    .bind(input.paused_duration)
    .bind(&input.description)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(not_found());
    }

    get_time_entry(pool, user_id, id).await
}

/// Delete a time entry owned by `user_id`.
pub async fn delete_time_entry(pool: &DbPool, user_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM time_entries WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(not_found());
    }

    Ok(())
}
