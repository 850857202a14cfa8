//! Shift-scheduling domain models.
//!
//! Provides the data types of a rostering problem and of its candidate
//! solutions. Everything here is built once per run and then treated as
//! immutable.
//!
//! # Domain Mappings
//!
//! | u-roster | Retail | Hospital ward | Call center |
//! |----------|--------|---------------|-------------|
//! | Employee | Store clerk | Nurse | Agent |
//! | Shift | Opening / closing | Day / night | Queue block |
//! | Manager | Shift lead | Charge nurse | Floor supervisor |
//! | Trainee | New hire | Student nurse | Agent in onboarding |

mod assignment;
mod calendar;
mod employee;
mod preference;
mod roster;
mod rules;
mod verdict;

pub use assignment::Assignment;
pub use calendar::{Shift, ShiftCalendar};
pub use employee::{Employee, Role, ShiftPattern};
pub use preference::{Preference, PreferenceGenerator, PreferenceMatrix};
pub use roster::{Roster, RosterSpec, TrainerPairing};
pub use rules::{ObjectiveWeights, RuleSet};
pub use verdict::{Verdict, Violation, ViolationKind};
