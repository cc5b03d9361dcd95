//! Time Entries Routes
//!
//! CRUD operations for recorded intervals of work.
//!
//! Routes:
//! - GET /time-entries - List entries (`startDate`, `endDate`, `projectId` filters)
//! - POST /time-entries - Create an entry
//! - GET /time-entries/:id - Get an entry
//! - PUT /time-entries/:id - Update an entry
//! - DELETE /time-entries/:id - Delete an entry

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ApiJson, ApiQuery};
use crate::db::{self, CreateTimeEntry, ReplaceTimeEntry, TimeEntryFilter, TimeEntryView};
use crate::middleware::AuthUser;
use crate::models::new_id;
use crate::{AppState, Error, Result};

pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Build time entry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_time_entries).post(create_time_entry))
        .route(
            "/:id",
            get(get_time_entry)
                .put(update_time_entry)
                .delete(delete_time_entry),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTimeEntriesQuery {
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD` (inclusive of that whole day)
    pub end_date: Option<String>,
    pub project_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateTimeEntryRequest {
    pub project_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: i64,
    #[serde(default)]
    pub paused_duration: i64,
    pub description: Option<String>,
}

/// Absent fields keep their stored value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateTimeEntryRequest {
    pub project_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<i64>,
    pub paused_duration: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
    pub id: String,
}

// ============================================================================
// Validation
// ============================================================================

/// Check a complete entry after any partial fields have been merged in.
fn validate_entry(entry: &ReplaceTimeEntry) -> Result<()> {
    if entry.project_id.trim().is_empty() {
        return Err(Error::Validation("Project is required".into()));
    }
    if entry.duration < 0 || entry.paused_duration < 0 {
        return Err(Error::Validation("Durations cannot be negative".into()));
    }
    if entry.end_time < entry.start_time {
        return Err(Error::Validation("End time must not be before start time".into()));
    }
    Ok(())
}

fn normalize_description(description: Option<String>) -> Result<Option<String>> {
    let Some(description) = description else {
        return Ok(None);
    };
    let description = description.trim();
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(Error::Validation(format!(
            "Description cannot exceed {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(Some(description.to_string()))
}

/// Parse a filter date. A bare `end` date covers the whole day.
fn parse_date(value: &str, end: bool) -> Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| Error::Validation(format!("Invalid date: {value}")))?;
    let start = date.and_time(NaiveTime::MIN).and_utc();
    if end {
        Ok(start + chrono::Duration::days(1) - chrono::Duration::milliseconds(1))
    } else {
        Ok(start)
    }
}

async fn ensure_project(state: &AppState, user_id: &str, project_id: &str) -> Result<()> {
    db::get_project(&state.db, user_id, project_id).await.map(|_| ())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /time-entries
async fn list_time_entries(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<ListTimeEntriesQuery>,
) -> Result<Json<Vec<TimeEntryView>>> {
    let filter = TimeEntryFilter {
        project_id: query.project_id.filter(|id| !id.is_empty()),
        start: query
            .start_date
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| parse_date(s, false))
            .transpose()?,
        end: query
            .end_date
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| parse_date(s, true))
            .transpose()?,
    };

    let entries = db::list_time_entries(&state.db, &auth.user_id, &filter).await?;
    debug!(user_id = %auth.user_id, count = entries.len(), "Listed time entries");

    Ok(Json(entries.into_iter().map(|e| e.into_view()).collect()))
}

/// POST /time-entries
async fn create_time_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<CreateTimeEntryRequest>,
) -> Result<(StatusCode, Json<TimeEntryView>)> {
    let entry = ReplaceTimeEntry {
        project_id: request.project_id,
        start_time: request.start_time,
        end_time: request.end_time,
        duration: request.duration,
        paused_duration: request.paused_duration,
        description: normalize_description(request.description)?,
    };
    validate_entry(&entry)?;
    ensure_project(&state, &auth.user_id, &entry.project_id).await?;

    let created = db::create_time_entry(
        &state.db,
        CreateTimeEntry {
            id: new_id(),
            user_id: auth.user_id.clone(),
            project_id: entry.project_id,
            start_time: entry.start_time,
            end_time: entry.end_time,
            duration: entry.duration,
            paused_duration: entry.paused_duration,
            description: entry.description,
        },
    )
    .await?;

    info!(
        user_id = %auth.user_id,
        entry_id = %created.id,
        duration = created.duration,
        "Time entry created"
    );

    Ok((StatusCode::CREATED, Json(created.into_view())))
}

/// GET /time-entries/:id
async fn get_time_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<TimeEntryView>> {
    let entry = db::get_time_entry(&state.db, &auth.user_id, &id).await?;
    Ok(Json(entry.into_view()))
}

/// PUT /time-entries/:id
async fn update_time_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateTimeEntryRequest>,
) -> Result<Json<TimeEntryView>> {
    let existing = db::get_time_entry(&state.db, &auth.user_id, &id).await?;

    if let Some(project_id) = &request.project_id {
        if *project_id != existing.project_id {
            ensure_project(&state, &auth.user_id, project_id).await?;
        }
    }

    let description = match request.description {
        Some(text) => normalize_description(Some(text))?,
        None => existing.description,
    };

    let merged = ReplaceTimeEntry {
        project_id: request.project_id.unwrap_or(existing.project_id),
        start_time: request.start_time.unwrap_or(existing.start_time),
        end_time: request.end_time.unwrap_or(existing.end_time),
        duration: request.duration.unwrap_or(existing.duration),
        paused_duration: request.paused_duration.unwrap_or(existing.paused_duration),
        description,
    };
    validate_entry(&merged)?;

    let updated = db::replace_time_entry(&state.db, &auth.user_id, &id, merged).await?;
    info!(user_id = %auth.user_id, entry_id = %id, "Time entry updated");

    Ok(Json(updated.into_view()))
}

/// DELETE /time-entries/:id
async fn delete_time_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>> {
    db::delete_time_entry(&state.db, &auth.user_id, &id).await?;
    info!(user_id = %auth.user_id, entry_id = %id, "Time entry deleted");

    Ok(Json(DeletedResponse {
        message: "Time entry deleted",
        id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(start: &str, end: &str, duration: i64) -> ReplaceTimeEntry {
        ReplaceTimeEntry {
            project_id: "p1".into(),
            start_time: parse_date(start, false).unwrap(),
            end_time: parse_date(end, false).unwrap(),
            duration,
            paused_duration: 0,
            description: None,
        }
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(
            parse_date("2024-03-04", false).unwrap().to_rfc3339(),
            "2024-03-04T00:00:00+00:00"
        );
        assert_eq!(
            parse_date("2024-03-04", true).unwrap(),
            parse_date("2024-03-04T23:59:59.999Z", false).unwrap()
        );
        assert_eq!(
            parse_date("2024-03-04T10:00:00+02:00", true).unwrap(),
            parse_date("2024-03-04T08:00:00Z", false).unwrap()
        );
        assert!(parse_date("yesterday", false).is_err());
    }

    #[test]
    fn test_validate_entry() {
        assert!(validate_entry(&entry("2024-03-04T09:00:00Z", "2024-03-04T10:00:00Z", 3600)).is_ok());
        assert!(validate_entry(&entry("2024-03-04T09:00:00Z", "2024-03-04T09:00:00Z", 0)).is_ok());
        assert!(validate_entry(&entry("2024-03-04T10:00:00Z", "2024-03-04T09:00:00Z", 0)).is_err());
        assert!(validate_entry(&entry("2024-03-04T09:00:00Z", "2024-03-04T10:00:00Z", -1)).is_err());
    }

    #[test]
    fn test_description_is_trimmed_and_bounded() {
        assert_eq!(
            normalize_description(Some("  notes ".into())).unwrap(),
            Some("notes".to_string())
        );
        assert!(normalize_description(Some("x".repeat(MAX_DESCRIPTION_LEN + 1))).is_err());
        assert_eq!(normalize_description(None).unwrap(), None);
    }
}
