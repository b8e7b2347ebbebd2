//! Planning-run configuration.

use serde::{Deserialize, Serialize};

use crate::domain::{Day, Granularity};
use crate::error::{Result, RosterError};

pub const DEFAULT_DAYS: u8 = 7;
pub const DEFAULT_MAX_HOURS_PER_DAY: f64 = 9.0;
pub const DEFAULT_MAX_DAYS_PER_WEEK: u8 = 5;
pub const DEFAULT_COMPLETION_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_VISIT_PENALTY: f64 = 1e-3;
/// Default solving time: 30 seconds.
pub const DEFAULT_SOLVE_TIME_LIMIT_SECS: f64 = 30.0;

/// Immutable configuration handed to the model builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RosterConfig {
    /// Number of days in the planning horizon, starting on Monday.
    pub days: u8,
    /// Work plus travel allowed per staff member per day.
    pub max_hours_per_day: f64,
    pub max_days_per_week: u8,
    pub granularity: Granularity,
    /// Absolute tolerance when comparing assigned hours against a job's duration.
    pub completion_tolerance: f64,
    /// Objective cost of each job visit in partial-hours mode.
    pub visit_penalty: f64,
    /// Upper bound on whole-slot assignments per job. `None` leaves jobs uncapped.
    pub max_assignments_per_job: Option<u32>,
    /// Wall-clock budget for one solve. When it runs out the best roster found
    /// so far is returned. `None` solves to proven optimality.
    pub solve_time_limit_secs: Option<f64>,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            days: DEFAULT_DAYS,
            max_hours_per_day: DEFAULT_MAX_HOURS_PER_DAY,
            max_days_per_week: DEFAULT_MAX_DAYS_PER_WEEK,
            granularity: Granularity::default(),
            completion_tolerance: DEFAULT_COMPLETION_TOLERANCE,
            visit_penalty: DEFAULT_VISIT_PENALTY,
            max_assignments_per_job: None,
            solve_time_limit_secs: Some(DEFAULT_SOLVE_TIME_LIMIT_SECS),
        }
    }
}

impl RosterConfig {
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_days(mut self, days: u8) -> Self {
        self.days = days;
        self
    }

    pub fn with_time_limit(mut self, seconds: Option<f64>) -> Self {
        self.solve_time_limit_secs = seconds;
        self
    }

    /// Reads overrides from the environment (and a `.env` file when present).
    ///
    /// Recognised keys: `ROSTER_DAYS`, `ROSTER_MAX_HOURS_PER_DAY`,
    /// `ROSTER_MAX_DAYS_PER_WEEK`, `ROSTER_GRANULARITY`,
    /// `ROSTER_MAX_ASSIGNMENTS_PER_JOB`, `ROSTER_SOLVE_TIME_LIMIT_SECS`.
    /// Unset keys keep their defaults.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();

        if let Some(days) = env_value("ROSTER_DAYS")? {
            config.days = days;
        }
        if let Some(hours) = env_value("ROSTER_MAX_HOURS_PER_DAY")? {
            config.max_hours_per_day = hours;
        }
        if let Some(max_days) = env_value("ROSTER_MAX_DAYS_PER_WEEK")? {
            config.max_days_per_week = max_days;
        }
        if let Some(granularity) = env_value::<Granularity>("ROSTER_GRANULARITY")? {
            config.granularity = granularity;
        }
        if let Some(cap) = env_value("ROSTER_MAX_ASSIGNMENTS_PER_JOB")? {
            config.max_assignments_per_job = Some(cap);
        }
        if let Some(seconds) = env_value("ROSTER_SOLVE_TIME_LIMIT_SECS")? {
            config.solve_time_limit_secs = Some(seconds);
        }

        Ok(config)
    }

    /// Rejects constants the model cannot be built with.
    ///
    /// ```
    /// use staff_rostering::config::RosterConfig;
    ///
    /// assert!(RosterConfig::default().validate().is_ok());
    ///
    /// let config = RosterConfig { max_days_per_week: 8, ..RosterConfig::default() };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.days == 0 || self.days > DEFAULT_DAYS {
            return Err(RosterError::configuration(format!(
                "days must be between 1 and {DEFAULT_DAYS}, got {}",
                self.days
            )));
        }
        if !self.max_hours_per_day.is_finite() || self.max_hours_per_day <= 0.0 {
            return Err(RosterError::configuration(format!(
                "max hours per day must be positive, got {}",
                self.max_hours_per_day
            )));
        }
        if self.max_days_per_week == 0 || self.max_days_per_week > self.days {
            return Err(RosterError::configuration(format!(
                "max days per week must be between 1 and {}, got {}",
                self.days, self.max_days_per_week
            )));
        }
        if !self.completion_tolerance.is_finite() || self.completion_tolerance < 0.0 {
            return Err(RosterError::configuration(
                "completion tolerance must be a non-negative number",
            ));
        }
        if !self.visit_penalty.is_finite() || self.visit_penalty < 0.0 {
            return Err(RosterError::configuration(
                "visit penalty must be a non-negative number",
            ));
        }
        if let Some(seconds) = self.solve_time_limit_secs {
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(RosterError::configuration(format!(
                    "solve time limit must be a positive number of seconds, got {seconds}"
                )));
            }
        }
        Ok(())
    }

    /// Day indices of the planning horizon.
    pub fn planning_days(&self) -> impl Iterator<Item = Day> {
        (0..self.days).map(Day)
    }
}

fn env_value<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match dotenvy::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| RosterError::configuration(format!("{key}={raw}: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_weekly_horizon() {
        let config = RosterConfig::default();
        assert_eq!(config.days, 7);
        assert_eq!(config.max_hours_per_day, 9.0);
        assert_eq!(config.max_days_per_week, 5);
        assert_eq!(config.granularity, Granularity::WholeSlot);
        assert_eq!(config.planning_days().count(), 7);
        assert_eq!(config.solve_time_limit_secs, Some(30.0));
    }

    #[test]
    fn test_time_limit_must_be_positive() {
        for seconds in [0.0, -5.0, f64::INFINITY, f64::NAN] {
            let config = RosterConfig::default().with_time_limit(Some(seconds));
            assert!(
                matches!(config.validate(), Err(RosterError::Configuration(_))),
                "time limit {seconds}"
            );
        }
        assert!(RosterConfig::default().with_time_limit(None).validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_hours() {
        for hours in [0.0, -1.0, f64::NAN] {
            let config = RosterConfig {
                max_hours_per_day: hours,
                ..RosterConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(RosterError::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_rejects_day_caps_outside_horizon() {
        for max_days in [0, 8] {
            let config = RosterConfig {
                max_days_per_week: max_days,
                ..RosterConfig::default()
            };
            assert!(config.validate().is_err(), "max_days_per_week = {max_days}");
        }

        let short_week = RosterConfig::default().with_days(3);
        assert!(short_week.validate().is_err());

        let short_week = RosterConfig {
            max_days_per_week: 2,
            ..RosterConfig::default().with_days(3)
        };
        assert!(short_week.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_json_uses_defaults() {
        let config: RosterConfig =
            serde_json::from_str(r#"{"granularity":"PARTIAL_HOURS","maxHoursPerDay":8}"#).unwrap();
        assert_eq!(config.granularity, Granularity::PartialHours);
        assert_eq!(config.max_hours_per_day, 8.0);
        assert_eq!(config.max_days_per_week, 5);
        assert_eq!(config.solve_time_limit_secs, Some(30.0));

        let config: RosterConfig =
            serde_json::from_str(r#"{"solveTimeLimitSecs":null}"#).unwrap();
        assert_eq!(config.solve_time_limit_secs, None);
    }
}
