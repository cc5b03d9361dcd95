//! Time analytics.
//!
//! Pure aggregation over a user's projects and time entries: resolve a
//! calendar range, keep the entries that fall in it, and sum them per
//! project into chart series, a per-project table and summary stats.
//! [`overview`] gives the all-time totals.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Days, FixedOffset, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{Project, TimeEntry};
use crate::models::{ProjectStatus, TimeUnit};

/// Label of the single category shown when there is nothing to chart.
pub const NO_DATA_LABEL: &str = "No data";
const NO_DATA_COLOR: &str = "#eeeeee";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RangeKind {
    Day,
    #[default]
    Week,
    Month,
}

/// Inclusive time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Resolve `kind` to the calendar period containing `now`, in `now`'s offset.
///
/// Weeks start on Monday. The end is the last millisecond of the period.
pub fn resolve_range(kind: RangeKind, now: DateTime<FixedOffset>) -> DateRange {
    let offset = *now.offset();
    let today = now.date_naive();

    let (first, next) = match kind {
        RangeKind::Day => (today, today + Days::new(1)),
        RangeKind::Week => {
            let monday = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
            (monday, monday + Days::new(7))
        }
        RangeKind::Month => {
            let first = today - Days::new(u64::from(today.day0()));
            let next = first
                .checked_add_months(Months::new(1))
                .unwrap_or(NaiveDate::MAX);
            (first, next)
        }
    };

    let start = local_midnight(first, offset);
    let end = local_midnight(next, offset) - chrono::Duration::milliseconds(1);
    DateRange { start, end }
}

fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    (local - chrono::Duration::seconds(i64::from(offset.local_minus_utc()))).and_utc()
}

/// Chart-ready series. `labels`, `data` and `colors` have equal length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
    pub colors: Vec<String>,
}

impl ChartSeries {
    fn placeholder(value: f64) -> Self {
        Self {
            labels: vec![NO_DATA_LABEL.to_string()],
            data: vec![value],
            colors: vec![NO_DATA_COLOR.to_string()],
        }
    }
}

/// Time spent on one project within the range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTotal {
    pub id: String,
    pub name: String,
    pub color: String,
    pub seconds: i64,
    /// `seconds` in the report's unit.
    pub value: f64,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_seconds: i64,
    pub entry_count: usize,
    pub average_seconds: f64,
    pub project_count: usize,
    pub total_display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub range: RangeKind,
    pub unit: TimeUnit,
    pub unit_label: &'static str,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Seconds per project.
    pub pie: ChartSeries,
    /// Per-project totals in `unit`.
    pub bar: ChartSeries,
    pub projects: Vec<ProjectTotal>,
    pub summary: Summary,
}

/// Entries that count towards a report: owned project, positive duration,
/// started within the range.
pub fn filter_entries<'a>(
    projects: &[Project],
    entries: &'a [TimeEntry],
    range: DateRange,
) -> Vec<&'a TimeEntry> {
    entries
        .iter()
        .filter(|e| e.duration > 0)
        .filter(|e| range.contains(e.start_time))
        .filter(|e| projects.iter().any(|p| p.id == e.project_id))
        .collect()
}

/// Build the report for `range`. Projects appear in the order given.
pub fn aggregate(
    kind: RangeKind,
    range: DateRange,
    unit: TimeUnit,
    projects: &[Project],
    entries: &[TimeEntry],
) -> AnalyticsReport {
    let counted = filter_entries(projects, entries, range);

    let mut totals: HashMap<&str, i64> = HashMap::new();
    for entry in &counted {
        *totals.entry(entry.project_id.as_str()).or_default() += entry.duration;
    }

    let rows: Vec<ProjectTotal> = projects
        .iter()
        .filter_map(|project| {
            let seconds = totals.get(project.id.as_str()).copied().unwrap_or(0);
            (seconds > 0).then(|| ProjectTotal {
                id: project.id.clone(),
                name: project.name.clone(),
                color: project.color.clone(),
                seconds,
                value: unit.from_seconds(seconds),
                display: unit.format(seconds),
            })
        })
        .collect();

    let (pie, bar, summary) = if rows.is_empty() {
        (
            ChartSeries::placeholder(1.0),
            ChartSeries::placeholder(0.0),
            Summary {
                total_seconds: 0,
                entry_count: 0,
                average_seconds: 0.0,
                project_count: 0,
                total_display: unit.format(0),
            },
        )
    } else {
        let labels: Vec<String> = rows.iter().map(|r| r.name.clone()).collect();
        let colors: Vec<String> = rows.iter().map(|r| r.color.clone()).collect();
        let total_seconds: i64 = rows.iter().map(|r| r.seconds).sum();
        let entry_count = counted.len();

        (
            ChartSeries {
                labels: labels.clone(),
                data: rows.iter().map(|r| r.seconds as f64).collect(),
                colors: colors.clone(),
            },
            ChartSeries {
                labels,
                data: rows.iter().map(|r| r.value).collect(),
                colors,
            },
            Summary {
                total_seconds,
                entry_count,
                average_seconds: total_seconds as f64 / entry_count.max(1) as f64,
                project_count: rows.len(),
                total_display: unit.format(total_seconds),
            },
        )
    };

    AnalyticsReport {
        range: kind,
        unit,
        unit_label: unit.label(),
        start: range.start,
        end: range.end,
        pie,
        bar,
        projects: rows,
        summary,
    }
}

/// All-time usage of one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUsage {
    pub id: String,
    pub name: String,
    pub color: String,
    pub status: String,
    pub seconds: i64,
    pub entry_count: usize,
    pub value: f64,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub unit: TimeUnit,
    pub unit_label: &'static str,
    pub total_seconds: i64,
    pub total_display: String,
    pub entry_count: usize,
    /// Distinct local dates on which an entry started.
    pub active_days: usize,
    pub completed_projects: usize,
    /// Every project in the order given, including ones with no time.
    pub projects: Vec<ProjectUsage>,
}

/// All-time totals over every entry, with day boundaries in `offset`.
pub fn overview(
    unit: TimeUnit,
    offset: FixedOffset,
    projects: &[Project],
    entries: &[TimeEntry],
) -> Overview {
    let total_seconds: i64 = entries.iter().map(|e| e.duration).sum();
    let active_days: HashSet<NaiveDate> = entries
        .iter()
        .map(|e| e.start_time.with_timezone(&offset).date_naive())
        .collect();

    let mut per_project: HashMap<&str, (i64, usize)> = HashMap::new();
    for entry in entries {
        let usage = per_project.entry(entry.project_id.as_str()).or_default();
        usage.0 += entry.duration;
        usage.1 += 1;
    }

    let rows = projects
        .iter()
        .map(|project| {
            let (seconds, entry_count) = per_project
                .get(project.id.as_str())
                .copied()
                .unwrap_or_default();
            ProjectUsage {
                id: project.id.clone(),
                name: project.name.clone(),
                color: project.color.clone(),
                status: project.status.clone(),
                seconds,
                entry_count,
                value: unit.from_seconds(seconds),
                display: unit.format(seconds),
            }
        })
        .collect();

    Overview {
        unit,
        unit_label: unit.label(),
        total_seconds,
        total_display: unit.format(total_seconds),
        entry_count: entries.len(),
        active_days: active_days.len(),
        completed_projects: projects
            .iter()
            .filter(|p| p.status == ProjectStatus::Completed.as_str())
            .count(),
        projects: rows,
    }
}
