//! Workforce shift-scheduling model for the U-Engine ecosystem.
//!
//! Builds a roster, a shift calendar and a preference matrix, compiles the
//! staffing rules into a binary quadratic model, hands it to an external
//! solver and re-verifies every returned candidate.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Employee`, `Roster`, `ShiftCalendar`,
//!   `PreferenceMatrix`, `RuleSet`, `Assignment`, `Verdict`
//! - **`validation`**: Roster integrity checks (duplicate IDs, trainer refs)
//! - **`compiler`**: Rules → `CompiledModel` (variables, labeled hard
//!   constraints, quadratic objective)
//! - **`evaluator`**: Feasibility and score of an `Assignment`, candidate
//!   ordering
//! - **`solver`**: `Solver` boundary, `SolverAdapter`, `GreedySolver`
//! - **`config`**: TOML configuration and problem assembly
//! - **`error`**: Error taxonomy
//!
//! # Pipeline
//!
//! ```text
//! SchedulingConfig ─► Roster + ShiftCalendar + PreferenceMatrix + RuleSet
//!                  ─► ModelCompiler ─► CompiledModel
//!                  ─► SolverAdapter(Solver) ─► evaluate ─► SolveReport
//! ```
//!
//! The core is pure and synchronous; a `CompiledModel` can be solved any
//! number of times. The library emits `tracing` events and never installs
//! a subscriber.
//!
//! # References
//!
//! - Ernst et al. (2004), "Staff scheduling and rostering: A review of
//!   applications, methods and models"
//! - Lucas (2014), "Ising formulations of many NP problems"

pub mod compiler;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod models;
pub mod solver;
pub mod validation;

pub use error::{
    ConfigError, Error, InfeasibleResultWarning, ModelCompilationError, Result,
    RosterConfigurationError, SolverUnavailableError,
};
