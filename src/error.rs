//! Error taxonomy.
//!
//! | Error | When | Recovery |
//! |-------|------|----------|
//! | [`ConfigError`] | configuration cannot be read or is malformed | fatal |
//! | [`RosterConfigurationError`] | role counts or trainer pairing impossible | fatal, before solving |
//! | [`ModelCompilationError`] | rule bounds mutually unsatisfiable | fatal, before solving |
//! | [`SolverUnavailableError`] | solver call failed or timed out | retry, or report "no solution" |
//!
//! [`InfeasibleResultWarning`] is not an error: it accompanies a best-effort
//! infeasible verdict.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::ValidationError;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The roster cannot be built from the configured counts or pairings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RosterConfigurationError {
    #[error(
        "roster needs at least {required} employees ({managers} managers + {trainees} trainees), got {total}"
    )]
    InsufficientEmployees {
        total: u32,
        managers: u32,
        trainees: u32,
        required: u32,
    },

    #[error("no distinct trainer available for each of {trainees} trainee(s): {available} eligible employee(s)")]
    EmptyTrainerPool { trainees: u32, available: u32 },

    #[error("{full_time} full-time employees requested but only {available} non-trainees exist")]
    TooManyFullTime { full_time: u32, available: u32 },

    #[error("invalid trainer pairing {trainee} -> {trainer}: {reason}")]
    InvalidPairing {
        trainee: String,
        trainer: String,
        reason: String,
    },

    #[error("invalid roster: {}", join_messages(.0))]
    InvalidRoster(Vec<ValidationError>),
}

/// The rule set cannot be satisfied by any assignment.
///
/// Raised before a solver is ever invoked.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelCompilationError {
    #[error("{what}: minimum {min} exceeds maximum {max}")]
    InvertedBounds {
        what: &'static str,
        min: u32,
        max: u32,
    },

    #[error("shift forecast has {actual} entries, horizon has {expected} shifts")]
    ForecastLength { expected: usize, actual: usize },

    #[error("preference matrix is {actual_employees}x{actual_shifts}, model is {expected_employees}x{expected_shifts}")]
    PreferenceShape {
        expected_employees: usize,
        expected_shifts: usize,
        actual_employees: usize,
        actual_shifts: usize,
    },

    #[error("{shift} needs at least {min} employees but the roster has {employees}")]
    ShiftMinimumExceedsRoster {
        shift: String,
        min: u32,
        employees: usize,
    },

    #[error("shift capacity {capacity} is below the {required} employee-shifts required by minimum loads")]
    CoverageBelowLoad { capacity: u64, required: u64 },

    #[error("employee capacity {capacity} is below the {required} employee-shifts required by minimum coverage")]
    LoadBelowCoverage { capacity: u64, required: u64 },

    #[error("{employee} is eligible for {eligible} day(s) but must work at least {required}")]
    InsufficientEligibility {
        employee: String,
        eligible: u32,
        required: u32,
    },

    #[error("{employee} is unavailable on pattern day {day}")]
    PatternConflict { employee: String, day: String },

    #[error("{employee} pattern works {run} consecutive days, cap is {cap}")]
    PatternExceedsConsecutiveCap { employee: String, run: u32, cap: u32 },

    #[error("a manager is required on every shift but the roster has no managers")]
    NoManagers,

    #[error("managers can cover {capacity} shift(s), horizon has {shifts}")]
    ManagerCapacity { capacity: u64, shifts: usize },

    #[error("managers must work at least {required} shift(s) but the horizon has only {shifts}")]
    ManagerMinimumExceedsShifts { required: u64, shifts: usize },

    #[error("{day}: {managers} pattern manager(s) are fixed on a day with {slots} shift(s)")]
    ManagerOverlap { day: String, managers: u32, slots: u32 },

    #[error("{day}: {available} manager(s) can work a day with {slots} shift(s)")]
    ManagerGap { day: String, available: u32, slots: u32 },

    #[error("max_consecutive_shifts is 0 but employees must work at least one shift")]
    ZeroConsecutiveCap,

    #[error("objective weight {name} must be finite and non-negative, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },
}

/// The external solver could not produce a response.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SolverUnavailableError {
    #[error("solver timed out after {0:?}")]
    TimedOut(Duration),

    #[error("solver failed: {0}")]
    Failed(String),

    #[error("solver terminated without a response")]
    Disconnected,
}

/// The best candidate a solver returned fails hard-constraint re-verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfeasibleResultWarning {
    /// Candidates evaluated (all infeasible).
    pub candidates: usize,
    /// Violations in the selected best candidate.
    pub violations: usize,
}

impl std::fmt::Display for InfeasibleResultWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "no feasible candidate among {}; best has {} violation(s)",
            self.candidates, self.violations
        )
    }
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Roster(#[from] RosterConfigurationError),

    #[error(transparent)]
    Compilation(#[from] ModelCompilationError),
}

/// Crate-level result.
pub type Result<T> = std::result::Result<T, Error>;

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
