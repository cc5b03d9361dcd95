//! User profile settings.

use serde::{Deserialize, Serialize};

use super::TimeUnit;

/// Colour scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

/// Clock display preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TimeFormat {
    #[serde(rename = "12h")]
    TwelveHour,
    #[default]
    #[serde(rename = "24h")]
    TwentyFourHour,
}

impl TimeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFormat::TwelveHour => "12h",
            TimeFormat::TwentyFourHour => "24h",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "12h" => Some(TimeFormat::TwelveHour),
            "24h" => Some(TimeFormat::TwentyFourHour),
            _ => None,
        }
    }
}

/// Per-user display settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub theme: Theme,
    pub time_format: TimeFormat,
    pub time_unit: TimeUnit,
}

/// Partial settings update. Absent fields keep their stored value.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsPatch {
    pub theme: Option<Theme>,
    pub time_format: Option<TimeFormat>,
    pub time_unit: Option<TimeUnit>,
}

impl UserSettings {
    /// Apply a partial update on top of these settings.
    pub fn merge(self, patch: SettingsPatch) -> Self {
        Self {
            theme: patch.theme.unwrap_or(self.theme),
            time_format: patch.time_format.unwrap_or(self.time_format),
            time_unit: patch.time_unit.unwrap_or(self.time_unit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = UserSettings::default();
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.time_format, TimeFormat::TwentyFourHour);
        assert_eq!(settings.time_unit, TimeUnit::Hours);
    }

    #[test]
    fn test_settings_merge_keeps_absent_fields() {
        let patch: SettingsPatch = serde_json::from_str(r#"{"theme":"dark"}"#).unwrap();
        let merged = UserSettings::default().merge(patch);
        assert_eq!(merged.theme, Theme::Dark);
        assert_eq!(merged.time_unit, TimeUnit::Hours);
    }

    #[test]
    fn test_settings_serialize_camel_case() {
        let json = serde_json::to_value(UserSettings::default()).unwrap();
        assert_eq!(json["timeFormat"], "24h");
        assert_eq!(json["timeUnit"], "hours");
        assert_eq!(json["theme"], "light");
    }

    #[test]
    fn test_round_trip_str() {
        assert_eq!(Theme::from_str(Theme::Dark.as_str()), Some(Theme::Dark));
        assert_eq!(TimeFormat::from_str("12h"), Some(TimeFormat::TwelveHour));
        assert_eq!(TimeFormat::from_str("noon"), None);
    }
}
