//! Analytics Routes
//!
//! Routes:
//! - GET /analytics?range=day|week|month&unit=seconds|minutes|hours&offsetMinutes=N
//! - GET /analytics/overview?unit=seconds|minutes|hours&offsetMinutes=N

use axum::{extract::State, routing::get, Extension, Json, Router};
use chrono::{FixedOffset, Utc};
use serde::Deserialize;
use tracing::debug;

use super::ApiQuery;
use crate::db::{self, TimeEntryFilter};
use crate::middleware::AuthUser;
use crate::models::TimeUnit;
use crate::services::analytics::{self, AnalyticsReport, Overview, RangeKind};
use crate::{AppState, Error, Result};

/// Build analytics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(report))
        .route("/overview", get(overview))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub range: RangeKind,
    /// Defaults to the caller's preferred unit.
    pub unit: Option<TimeUnit>,
    /// Minutes east of UTC used for day boundaries.
    #[serde(default)]
    pub offset_minutes: i32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewQuery {
    pub unit: Option<TimeUnit>,
    #[serde(default)]
    pub offset_minutes: i32,
}

fn utc_offset(minutes: i32) -> Result<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| Error::Validation("offsetMinutes is out of range".into()))
}

/// GET /analytics
async fn report(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<Json<AnalyticsReport>> {
    let offset = utc_offset(query.offset_minutes)?;
    let unit = query.unit.unwrap_or(auth.settings.time_unit);

    let range = analytics::resolve_range(query.range, Utc::now().with_timezone(&offset));

    let projects = db::list_projects(&state.db, &auth.user_id).await?;
    let entries = db::list_time_entries(
        &state.db,
        &auth.user_id,
        &TimeEntryFilter {
            project_id: None,
            start: Some(range.start),
            end: Some(range.end),
        },
    )
    .await?;

    let report = analytics::aggregate(query.range, range, unit, &projects, &entries);
    debug!(
        user_id = %auth.user_id,
        range = ?query.range,
        total_seconds = report.summary.total_seconds,
        "Built analytics report"
    );

    Ok(Json(report))
}

/// GET /analytics/overview
///
/// All-time totals across every entry and project.
async fn overview(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<OverviewQuery>,
) -> Result<Json<Overview>> {
    let offset = utc_offset(query.offset_minutes)?;
    let unit = query.unit.unwrap_or(auth.settings.time_unit);

    let projects = db::list_projects(&state.db, &auth.user_id).await?;
    let entries =
        db::list_time_entries(&state.db, &auth.user_id, &TimeEntryFilter::default()).await?;

    let overview = analytics::overview(unit, offset, &projects, &entries);
    debug!(
        user_id = %auth.user_id,
        entry_count = overview.entry_count,
        active_days = overview.active_days,
        "Built analytics overview"
    );

    Ok(Json(overview))
}
