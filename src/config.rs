//! Project configuration.
//!
//! Holds the project-wide settings the parser front-end collects before
//! any property is created: the project period, the timing resolution,
//! default working hours, global vacations, and the scenario tree.
//! Configurations can be built with `with_*` methods or loaded from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ConfigError;
use crate::models::{Duration, Timestamp, WorkingHours};

const SECONDS_PER_DAY: Duration = 86_400;

fn default_resolution() -> Duration {
    3600
}

fn default_daily_working_hours() -> f64 {
    8.0
}

fn default_scenarios() -> Vec<ScenarioConfig> {
    vec![ScenarioConfig::new("plan", "Plan Scenario")]
}

fn enabled() -> bool {
    true
}

/// Declaration of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Scenario identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Parent scenario ID. Child scenarios inherit the parent's input data.
    #[serde(default)]
    pub parent: Option<String>,
    /// Disabled scenarios are not scheduled.
    #[serde(default = "enabled")]
    pub enabled: bool,
}

impl ScenarioConfig {
    /// Creates an enabled top-level scenario.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent: None,
            enabled: true,
        }
    }

    /// Sets the parent scenario.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Enables or disables the scenario.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A project-wide vacation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VacationConfig {
    /// Vacation start (inclusive).
    pub start: DateTime<Utc>,
    /// Vacation end (exclusive).
    pub end: DateTime<Utc>,
}

/// Project-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Project start.
    pub start: DateTime<Utc>,
    /// Project end.
    pub end: DateTime<Utc>,
    /// Scoreboard slot length in seconds (default: one hour).
    #[serde(default = "default_resolution")]
    pub timing_resolution: Duration,
    /// Working hours per day, used to convert daily rates (default: 8).
    #[serde(default = "default_daily_working_hours")]
    pub daily_working_hours: f64,
    /// Default weekly working hours (default: Mon-Fri 9-12, 13-18).
    #[serde(default)]
    pub working_hours: WorkingHours,
    /// Vacations that apply to every resource.
    #[serde(default)]
    pub vacations: Vec<VacationConfig>,
    /// Scenario declarations. The first scenario is the baseline.
    #[serde(default = "default_scenarios")]
    pub scenarios: Vec<ScenarioConfig>,
    /// Seed for the `random` resource selection mode.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl ProjectConfig {
    /// Creates a configuration with default settings and one `plan` scenario.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start,
            end,
            timing_resolution: default_resolution(),
            daily_working_hours: default_daily_working_hours(),
            working_hours: WorkingHours::default(),
            vacations: Vec::new(),
            scenarios: default_scenarios(),
            random_seed: None,
        }
    }

    /// Loads a configuration from JSON and validates it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the timing resolution (seconds).
    pub fn with_resolution(mut self, resolution: Duration) -> Self {
        self.timing_resolution = resolution;
        self
    }

    /// Sets the daily working hours.
    pub fn with_daily_working_hours(mut self, hours: f64) -> Self {
        self.daily_working_hours = hours;
        self
    }

    /// Sets the default working hours.
    pub fn with_working_hours(mut self, working_hours: WorkingHours) -> Self {
        self.working_hours = working_hours;
        self
    }

    /// Adds a global vacation.
    pub fn with_vacation(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.vacations.push(VacationConfig { start, end });
        self
    }

    /// Replaces the scenario declarations.
    pub fn with_scenarios(mut self, scenarios: Vec<ScenarioConfig>) -> Self {
        self.scenarios = scenarios;
        self
    }

    /// Adds a scenario declaration.
    pub fn with_scenario(mut self, scenario: ScenarioConfig) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Project start as a timestamp.
    pub fn start_timestamp(&self) -> Timestamp {
        self.start.timestamp()
    }

    /// Project end as a timestamp.
    pub fn end_timestamp(&self) -> Timestamp {
        self.end.timestamp()
    }

    /// Checks the configuration for consistency.
    ///
    /// # Errors
    /// [`ConfigError::Invalid`] if the period is empty, the resolution does
    /// not evenly divide a day, a vacation is inverted, or the scenario
    /// declarations are empty, duplicated, or reference an undeclared
    /// parent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.end <= self.start {
            return Err(ConfigError::Invalid(format!(
                "project end {} must be after start {}",
                self.end, self.start
            )));
        }
        if self.timing_resolution <= 0 || SECONDS_PER_DAY % self.timing_resolution != 0 {
            return Err(ConfigError::Invalid(format!(
                "timing resolution {} must be positive and divide a day",
                self.timing_resolution
            )));
        }
        if self.daily_working_hours <= 0.0 || self.daily_working_hours > 24.0 {
            return Err(ConfigError::Invalid(format!(
                "daily working hours {} must be within (0, 24]",
                self.daily_working_hours
            )));
        }
        if let Some(v) = self.vacations.iter().find(|v| v.end < v.start) {
            return Err(ConfigError::Invalid(format!(
                "vacation end {} is before start {}",
                v.end, v.start
            )));
        }
        if self.scenarios.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one scenario is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for s in &self.scenarios {
            if let Some(parent) = &s.parent {
                // Parents must be declared before their children.
                if !seen.contains(parent.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "scenario '{}' references undeclared parent '{}'",
                        s.id, parent
                    )));
                }
            }
            if !seen.insert(s.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate scenario ID '{}'",
                    s.id
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> ProjectConfig {
        ProjectConfig::new(
            "prj",
            "Project",
            Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 5, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_defaults() {
        let c = config();
        assert_eq!(c.timing_resolution, 3600);
        assert_eq!(c.scenarios.len(), 1);
        assert_eq!(c.scenarios[0].id, "plan");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "id": "prj",
            "name": "Project",
            "start": "2026-01-05T00:00:00Z",
            "end": "2026-03-01T00:00:00Z",
            "timing_resolution": 900,
            "scenarios": [
                {"id": "plan", "name": "Plan"},
                {"id": "delayed", "name": "Delayed", "parent": "plan", "enabled": false}
            ],
            "random_seed": 7
        }"#;
        let c = ProjectConfig::from_json(json).unwrap();
        assert_eq!(c.timing_resolution, 900);
        assert_eq!(c.scenarios[1].parent.as_deref(), Some("plan"));
        assert!(!c.scenarios[1].enabled);
        assert_eq!(c.random_seed, Some(7));
        assert_eq!(c.start_timestamp(), 1_767_571_200);
    }

    #[test]
    fn test_invalid_period() {
        let mut c = config();
        c.end = c.start;
        assert!(matches!(c.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_resolution() {
        assert!(config().with_resolution(7).validate().is_err());
        assert!(config().with_resolution(0).validate().is_err());
        assert!(config().with_resolution(900).validate().is_ok());
    }

    #[test]
    fn test_invalid_scenarios() {
        let c = config().with_scenario(ScenarioConfig::new("plan", "Again"));
        assert!(c.validate().is_err());

        let c = config().with_scenarios(vec![
            ScenarioConfig::new("child", "Child").with_parent("plan"),
            ScenarioConfig::new("plan", "Plan"),
        ]);
        assert!(c.validate().is_err());

        assert!(config().with_scenarios(vec![]).validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ProjectConfig::from_json("{\"id\": 1}"),
            Err(ConfigError::Parse(_))
        ));
    }
}
