//! Display units for durations.
//!
//! Durations are stored as whole seconds. Conversion to minutes and hours is
//! linear; display strings use one decimal place for minutes and hours and
//! an integer for seconds.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    Minutes,
    #[default]
    Hours,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "seconds" => Some(TimeUnit::Seconds),
            "minutes" => Some(TimeUnit::Minutes),
            "hours" => Some(TimeUnit::Hours),
            _ => None,
        }
    }

    /// Number of seconds in one of this unit.
    pub fn seconds_per_unit(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3600.0,
        }
    }

    /// Convert a number of seconds into this unit.
    pub fn from_seconds(&self, seconds: i64) -> f64 {
        seconds as f64 / self.seconds_per_unit()
    }

    /// Convert a value in this unit back into (possibly fractional) seconds.
    pub fn to_seconds(&self, value: f64) -> f64 {
        value * self.seconds_per_unit()
    }

    /// Format a number of seconds for display in this unit.
    pub fn format(&self, seconds: i64) -> String {
        let value = self.from_seconds(seconds.max(0));
        match self {
            TimeUnit::Seconds => format!("{}", value.round() as i64),
            TimeUnit::Minutes | TimeUnit::Hours => format!("{:.1}", value),
        }
    }

    /// Short label shown next to a value.
    pub fn label(&self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "min",
            TimeUnit::Hours => "h",
        }
    }
}

/// Render seconds as `HH:MM:SS`, the way a running timer is displayed.
pub fn format_clock(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}
