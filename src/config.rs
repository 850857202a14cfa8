//! Scheduling configuration.
//!
//! Load a run's configuration from TOML. Every section is optional and
//! falls back to its defaults.
//!
//! # Examples
//!
//! ```
//! use u_roster::config::SchedulingConfig;
//! use std::time::Duration;
//!
//! let config = SchedulingConfig::from_toml_str(r#"
//!     random_seed = 42
//!
//!     [employees]
//!     total = 8
//!     managers = 2
//!     trainees = 1
//!
//!     [horizon]
//!     start = "2026-11-01"
//!     days = 7
//!
//!     [rules]
//!     min_shifts_per_employee = 2
//!     max_shifts_per_employee = 5
//!
//!     [solver]
//!     timeout_secs = 30
//! "#).unwrap();
//!
//! assert_eq!(config.employees.total, 8);
//! assert_eq!(config.horizon.days, 7);
//! assert_eq!(config.solver.timeout(), Some(Duration::from_secs(30)));
//! ```

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::compiler::{CompiledModel, ModelCompiler};
use crate::error::{ConfigError, ModelCompilationError, Result};
use crate::models::{
    ObjectiveWeights, PreferenceGenerator, PreferenceMatrix, Roster, RosterSpec, RuleSet,
    ShiftCalendar,
};
use crate::solver::SolverAdapter;

/// Configuration of one scheduling run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Seed for preference generation. `None` draws from OS entropy.
    pub random_seed: Option<u64>,
    pub employees: RosterSpec,
    pub horizon: HorizonConfig,
    pub rules: RuleSet,
    pub objective: ObjectiveWeights,
    pub preferences: PreferenceGenerator,
    pub solver: SolverConfig,
}

/// Planning horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonConfig {
    /// First day. Derived from "today" when absent.
    pub start: Option<NaiveDate>,
    pub days: u32,
    pub slots_per_day: u32,
    /// Plan the whole month containing `start` (or "today"); `days` is
    /// ignored.
    pub month: bool,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            start: None,
            days: 14,
            slots_per_day: 1,
            month: false,
        }
    }
}

/// Solver call settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub timeout_secs: Option<u64>,
}

impl SolverConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl SchedulingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_start(mut self, start: NaiveDate) -> Self {
        self.horizon.start = Some(start);
        self
    }

    /// Checks values that deserialization alone cannot reject.
    ///
    /// Rule bounds are checked later by the compiler.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let mut problems = Vec::new();
        if self.employees.total == 0 {
            problems.push("employees.total must be positive".to_string());
        }
        if self.horizon.days == 0 && !self.horizon.month {
            problems.push("horizon.days must be positive".to_string());
        }
        if self.horizon.slots_per_day == 0 {
            problems.push("horizon.slots_per_day must be positive".to_string());
        }
        let p = self.preferences.unavailable_probability;
        if !(0.0..=1.0).contains(&p) {
            problems.push(format!(
                "preferences.unavailable_probability must be within 0..=1, got {p}"
            ));
        }
        if self.solver.timeout_secs == Some(0) {
            problems.push("solver.timeout_secs must be positive".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems.join("; ")))
        }
    }

    /// RNG for preference generation.
    pub fn rng(&self) -> ChaCha8Rng {
        match self.random_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        }
    }

    /// The horizon's calendar.
    ///
    /// Starts at the configured date or the planning start derived from
    /// `today`. In month mode it covers the month containing the configured
    /// date, or the current month.
    pub fn calendar(&self, today: NaiveDate) -> std::result::Result<ShiftCalendar, ConfigError> {
        let calendar = if self.horizon.month {
            let anchor = self.horizon.start.unwrap_or(today);
            ShiftCalendar::for_month(anchor).ok_or_else(|| {
                ConfigError::Invalid(format!("no month calendar for {anchor}"))
            })?
        } else {
            let start = self
                .horizon
                .start
                .unwrap_or_else(|| ShiftCalendar::planning_start(today));
            ShiftCalendar::new(start, self.horizon.days)
        };
        Ok(calendar.with_slots(self.horizon.slots_per_day))
    }

    /// Validates the configuration and builds the frozen inputs of a run.
    ///
    /// # Errors
    ///
    /// `Error::Config` for invalid values, `Error::Roster` when the roster
    /// cannot be generated.
    pub fn build_problem(&self, today: NaiveDate) -> Result<SchedulingProblem> {
        self.validate()?;
        let roster = Roster::generate(&self.employees)?;
        let calendar = self.calendar(today)?;
        let preferences = self
            .preferences
            .generate(&roster, &calendar, &mut self.rng());
        info!(
            event = "problem_built",
            employees = roster.len(),
            shifts = calendar.shift_count(),
            start = %calendar.start,
            seeded = self.random_seed.is_some(),
        );
        Ok(SchedulingProblem {
            roster,
            calendar,
            preferences,
            rules: self.rules.clone(),
            weights: self.objective.clone(),
        })
    }

    /// Adapter configured with the solver timeout.
    pub fn adapter(&self) -> SolverAdapter {
        match self.solver.timeout() {
            Some(timeout) => SolverAdapter::new().with_timeout(timeout),
            None => SolverAdapter::new(),
        }
    }
}

/// Frozen inputs of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingProblem {
    pub roster: Roster,
    pub calendar: ShiftCalendar,
    pub preferences: PreferenceMatrix,
    pub rules: RuleSet,
    pub weights: ObjectiveWeights,
}

impl SchedulingProblem {
    /// Replaces generated preferences with externally supplied ones.
    pub fn with_preferences(mut self, preferences: PreferenceMatrix) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn compile(&self) -> std::result::Result<CompiledModel, ModelCompilationError> {
        ModelCompiler::new(&self.roster, &self.calendar, &self.preferences, &self.rules)
            .with_weights(self.weights.clone())
            .compile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::evaluator::evaluate;
    use crate::solver::GreedySolver;
    use std::sync::Arc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = SchedulingConfig::from_toml_str("").unwrap();
        assert_eq!(config, SchedulingConfig::default());
        assert_eq!(config.employees.total, 12);
        assert_eq!(config.employees.managers, 2);
        assert_eq!(config.employees.trainees, 1);
        assert_eq!(config.horizon.days, 14);
        assert!(config.rules.require_manager_per_shift);
        assert!((config.preferences.unavailable_probability - 0.1).abs() < 1e-10);
        assert_eq!(config.solver.timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_toml() {
        let config = SchedulingConfig::from_toml_str(
            r#"
            random_seed = 7

            [employees]
            total = 6
            managers = 1
            trainees = 1
            full_time = 2

            [[employees.pairings]]
            trainee = "Tr1"
            trainer = "Emp1"

            [horizon]
            start = "2026-11-01"
            days = 7
            slots_per_day = 2

            [rules]
            max_consecutive_shifts = 4
            allow_isolated_days_off = true
            shift_forecast = [1, 2, 1, 2, 1, 2, 1, 2, 1, 2, 1, 2, 1, 2]

            [objective]
            distribution_weight = 2.5
            neutral_cost = 0.0

            [preferences]
            unavailable_probability = 0.0

            [solver]
            timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.random_seed, Some(7));
        assert_eq!(config.employees.full_time, 2);
        assert_eq!(config.employees.pairings[0].trainer, "Emp1");
        assert_eq!(config.horizon.start, NaiveDate::from_ymd_opt(2026, 11, 1));
        assert_eq!(config.horizon.slots_per_day, 2);
        assert_eq!(config.rules.max_consecutive_shifts, 4);
        assert!(config.rules.allow_isolated_days_off);
        assert_eq!(config.rules.shift_forecast.as_ref().map(Vec::len), Some(14));
        assert!((config.objective.distribution_weight - 2.5).abs() < 1e-10);
        assert!((config.objective.load_weight - 1.0).abs() < 1e-10);
        assert_eq!(config.objective.neutral_cost, Some(0.0));
        assert_eq!(config.adapter().timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = SchedulingConfig::from_toml_str("[horizon]\ndays = \"two weeks\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = SchedulingConfig::load("/nonexistent/u-roster.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_from_toml_file() {
        let path = std::env::temp_dir().join("u_roster_config_test.toml");
        std::fs::write(&path, "[horizon]\ndays = 21\n").unwrap();
        let config = SchedulingConfig::from_toml_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.horizon.days, 21);
    }

    #[test]
    fn test_validate_collects_all_problems() {
        let mut config = SchedulingConfig::default();
        config.horizon.days = 0;
        config.preferences.unavailable_probability = 1.5;
        config.solver.timeout_secs = Some(0);

        match config.validate() {
            Err(ConfigError::Invalid(msg)) => {
                assert!(msg.contains("horizon.days"));
                assert!(msg.contains("unavailable_probability"));
                assert!(msg.contains("timeout_secs"));
            }
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn test_calendar_start() {
        let derived = SchedulingConfig::default().calendar(today()).unwrap();
        assert_eq!(derived.start, NaiveDate::from_ymd_opt(2026, 11, 1).unwrap());
        assert_eq!(derived.shift_count(), 14);

        let fixed = SchedulingConfig::default()
            .with_start(NaiveDate::from_ymd_opt(2026, 12, 6).unwrap())
            .calendar(today())
            .unwrap();
        assert_eq!(fixed.start, NaiveDate::from_ymd_opt(2026, 12, 6).unwrap());
    }

    #[test]
    fn test_month_horizon() {
        let config = SchedulingConfig::from_toml_str("[horizon]\nmonth = true\ndays = 0").unwrap();
        assert!(config.validate().is_ok());
        let current = config.calendar(today()).unwrap();
        assert_eq!(current.start, NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        assert_eq!(current.days, 31);

        let february = config
            .with_start(NaiveDate::from_ymd_opt(2028, 2, 17).unwrap())
            .calendar(today())
            .unwrap();
        assert_eq!(february.start, NaiveDate::from_ymd_opt(2028, 2, 1).unwrap());
        assert_eq!(february.shift_count(), 29);
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let config = SchedulingConfig::default().with_random_seed(11);
        let a = config.build_problem(today()).unwrap();
        let b = config.build_problem(today()).unwrap();
        assert_eq!(a.preferences, b.preferences);
        assert_eq!(a.roster, b.roster);
    }

    #[test]
    fn test_build_problem_errors() {
        let mut config = SchedulingConfig::default();
        config.employees = RosterSpec::new(2, 2, 1);
        assert!(matches!(config.build_problem(today()), Err(Error::Roster(_))));

        config.employees.total = 0;
        assert!(matches!(config.build_problem(today()), Err(Error::Config(_))));
    }

    #[test]
    fn test_end_to_end() {
        let mut config = SchedulingConfig::default().with_random_seed(3);
        config.preferences.unavailable_probability = 0.0;
        config.solver.timeout_secs = Some(30);

        let problem = config.build_problem(today()).unwrap();
        let model = problem.compile().unwrap();
        assert_eq!(model.employee_count(), 12);
        assert_eq!(model.shift_count(), 14);

        let report = config.adapter().solve(&model, Arc::new(GreedySolver::new()));
        let best = report.best().unwrap();
        assert_eq!(best.verdict, evaluate(&model, &best.assignment));
        assert_eq!(report.is_feasible(), best.verdict.feasible);
    }
}
