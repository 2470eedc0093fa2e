//! Planner configuration.
//!
//! Supplied once when a [`Planner`](crate::Planner) is built. Usually read
//! from a TOML document:
//!
//! ```toml
//! [calendar]
//! working_days = { sat = true }
//!
//! [critical_path]
//! float_tolerance = 0
//! ```

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::analysis::CriticalPathOptions;
use crate::error::Result;
use crate::models::WorkCalendar;

/// Top-level planner configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlannerConfig {
    /// Working-day calendar.
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Critical path analysis defaults.
    #[serde(default)]
    pub critical_path: CriticalPathOptions,
}

/// Weekday → working flag overrides.
///
/// Weekdays not listed keep the Monday–Friday default.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CalendarConfig {
    #[serde(default)]
    pub working_days: HashMap<Weekday, bool>,
}

impl PlannerConfig {
    /// Parses configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        tracing::debug!(
            overrides = config.calendar.working_days.len(),
            float_tolerance = config.critical_path.float_tolerance,
            "planner config parsed"
        );
        Ok(config)
    }

    /// Reads configuration from a TOML file.
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Builds the working-day calendar.
    ///
    /// # Errors
    /// `InvalidCalendar` if no weekday is left working.
    pub fn work_calendar(&self) -> Result<WorkCalendar> {
        WorkCalendar::from_weekdays(&self.calendar.working_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use chrono::NaiveDate;

    #[test]
    fn test_default_config() {
        let config = PlannerConfig::default();
        let cal = config.work_calendar().unwrap();
        assert_eq!(cal, WorkCalendar::new());
        assert_eq!(config.critical_path.float_tolerance, 0);
    }

    #[test]
    fn test_parse_toml() {
        let config = PlannerConfig::from_toml_str(
            r#"
            [calendar]
            working_days = { sat = true, fri = false }

            [critical_path]
            float_tolerance = 1
            "#,
        )
        .unwrap();

        let cal = config.work_calendar().unwrap();
        assert!(cal.is_work_day(NaiveDate::from_ymd_opt(2024, 1, 6).unwrap())); // Sat
        assert!(!cal.is_work_day(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())); // Fri
        assert_eq!(config.critical_path.float_tolerance, 1);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = PlannerConfig::from_toml_str("").unwrap();
        assert!(config.calendar.working_days.is_empty());
    }

    #[test]
    fn test_invalid_toml() {
        let err = PlannerConfig::from_toml_str("[calendar\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let config = PlannerConfig::load(Path::new("/nonexistent/u-plan.toml")).unwrap();
        assert!(config.calendar.working_days.is_empty());
    }
}
