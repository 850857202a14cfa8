//! The compiled constraint model.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::expression::{Expression, Sense, VarId};
use crate::models::{
    Assignment, ObjectiveWeights, Preference, PreferenceMatrix, Roster, RuleSet, ShiftCalendar,
    ViolationKind,
};

/// Hard-constraint family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Unavailable pair pinned to 0.
    Unavailable,
    /// Load at most the maximum.
    Overtime,
    /// Load at least the minimum.
    Insufficient,
    /// Full-time pattern day (== 1) or rest day (== 0).
    Pattern,
    /// Headcount at least the minimum.
    Understaffed,
    /// Headcount at most the maximum.
    Overstaffed,
    /// Exactly one manager on the shift.
    Manager,
    /// At most one slot per employee per day.
    DoubleBooking,
    /// Trainee only alongside the trainer.
    Trainee,
    /// Window of `cap + 1` days holds at most `cap` worked days.
    Consecutive,
    /// No 1-0-1 pattern around a day.
    Isolated,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 11] = [
        ConstraintKind::Unavailable,
        ConstraintKind::Overtime,
        ConstraintKind::Insufficient,
        ConstraintKind::Pattern,
        ConstraintKind::Understaffed,
        ConstraintKind::Overstaffed,
        ConstraintKind::Manager,
        ConstraintKind::DoubleBooking,
        ConstraintKind::Trainee,
        ConstraintKind::Consecutive,
        ConstraintKind::Isolated,
    ];

    /// Key used in rendered labels.
    pub fn key(self) -> &'static str {
        match self {
            ConstraintKind::Unavailable => "unavailable",
            ConstraintKind::Overtime => "overtime",
            ConstraintKind::Insufficient => "insufficient",
            ConstraintKind::Pattern => "pattern",
            ConstraintKind::Understaffed => "understaffed",
            ConstraintKind::Overstaffed => "overstaffed",
            ConstraintKind::Manager => "manager_issue",
            ConstraintKind::DoubleBooking => "double_booking",
            ConstraintKind::Trainee => "trainee_issue",
            ConstraintKind::Consecutive => "too_many_consecutive",
            ConstraintKind::Isolated => "isolated",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }

    /// Domain violation reported when a constraint of this family fails.
    pub fn violation_kind(self) -> ViolationKind {
        match self {
            ConstraintKind::Unavailable => ViolationKind::Unavailable,
            ConstraintKind::Overtime => ViolationKind::Overtime,
            ConstraintKind::Insufficient => ViolationKind::Insufficient,
            ConstraintKind::Pattern => ViolationKind::PatternMismatch,
            ConstraintKind::Understaffed => ViolationKind::Understaffed,
            ConstraintKind::Overstaffed => ViolationKind::Overstaffed,
            ConstraintKind::Manager => ViolationKind::ManagerCoverage,
            ConstraintKind::DoubleBooking => ViolationKind::DoubleBooking,
            ConstraintKind::Trainee => ViolationKind::TraineeWithoutTrainer,
            ConstraintKind::Consecutive => ViolationKind::TooManyConsecutive,
            ConstraintKind::Isolated => ViolationKind::IsolatedDayOff,
        }
    }
}

/// Structured constraint label, rendered as `"kind,employee,shift"`.
///
/// `shift` is the 1-based dense shift index; day-level constraints
/// (pattern, double booking, consecutive, isolated) use the first slot of
/// the day. Empty fields render as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintLabel {
    pub kind: ConstraintKind,
    pub employee: Option<String>,
    /// 0-based dense shift index.
    pub shift: Option<usize>,
}

impl ConstraintLabel {
    pub fn new(kind: ConstraintKind, employee: Option<&str>, shift: Option<usize>) -> Self {
        Self {
            kind,
            employee: employee.map(str::to_string),
            shift,
        }
    }

    /// Parses a rendered label. Returns `None` for unknown kinds or
    /// malformed input.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.splitn(3, ',');
        let kind = ConstraintKind::from_key(parts.next()?)?;
        let employee = parts.next()?;
        let shift = parts.next()?;
        let shift = if shift.is_empty() {
            None
        } else {
            Some(shift.parse::<usize>().ok()?.checked_sub(1)?)
        };
        Some(Self {
            kind,
            employee: (!employee.is_empty()).then(|| employee.to_string()),
            shift,
        })
    }
}

impl fmt::Display for ConstraintLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},",
            self.kind.key(),
            self.employee.as_deref().unwrap_or("")
        )?;
        if let Some(s) = self.shift {
            write!(f, "{}", s + 1)?;
        }
        Ok(())
    }
}

/// A labeled hard constraint `expr <sense> rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardConstraint {
    pub label: ConstraintLabel,
    pub expr: Expression,
    pub sense: Sense,
    pub rhs: f64,
}

impl HardConstraint {
    pub fn new(label: ConstraintLabel, expr: Expression, sense: Sense, rhs: f64) -> Self {
        Self {
            label,
            expr,
            sense,
            rhs,
        }
    }

    /// Amount by which the sample violates this constraint (0 if satisfied).
    pub fn violation(&self, values: &[bool]) -> f64 {
        self.sense.deficit(self.expr.evaluate(values), self.rhs)
    }

    #[inline]
    pub fn is_satisfied(&self, values: &[bool]) -> bool {
        self.violation(values) == 0.0
    }
}

/// A decision variable: employee `employee` works shift `shift`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub id: VarId,
    /// Roster position.
    pub employee: usize,
    /// Dense shift index.
    pub shift: usize,
    /// External label `"{employee_id}_{shift + 1}"`.
    pub label: String,
}

/// How many shifts an employee must work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadRequirement {
    /// Any load within the bounds.
    Range { min: u32, max: u32 },
    /// Exactly the listed day offsets, one slot each.
    Pattern { days: Vec<u32> },
}

impl LoadRequirement {
    /// Lowest feasible load.
    pub fn min(&self) -> u32 {
        match self {
            LoadRequirement::Range { min, .. } => *min,
            LoadRequirement::Pattern { days } => days.len() as u32,
        }
    }

    /// Highest feasible load given a horizon of `days` days.
    pub fn max_within(&self, days: u32) -> u32 {
        match self {
            LoadRequirement::Range { max, .. } => (*max).min(days),
            LoadRequirement::Pattern { days: worked } => worked.len() as u32,
        }
    }

    /// Load the balancing term steers towards.
    pub fn target(&self) -> f64 {
        match self {
            LoadRequirement::Range { min, max } => (f64::from(*min) + f64::from(*max)) / 2.0,
            LoadRequirement::Pattern { days } => days.len() as f64,
        }
    }
}

/// Variables, hard constraints and soft objective of one run.
///
/// Owns frozen copies of its inputs so that evaluation needs nothing else.
/// Never mutated after compilation; reusable across solver attempts.
#[derive(Debug, Clone)]
pub struct CompiledModel {
    pub(crate) roster: Roster,
    pub(crate) calendar: ShiftCalendar,
    pub(crate) preferences: PreferenceMatrix,
    pub(crate) rules: RuleSet,
    pub(crate) weights: ObjectiveWeights,
    pub(crate) variables: Vec<Variable>,
    pub(crate) constraints: Vec<HardConstraint>,
    pub(crate) objective: Expression,
    pub(crate) neutral_cost: f64,
    pub(crate) coverage: Vec<(u32, u32)>,
    pub(crate) loads: Vec<LoadRequirement>,
    pub(crate) expected_headcount: f64,
}

impl CompiledModel {
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn calendar(&self) -> &ShiftCalendar {
        &self.calendar
    }

    pub fn preferences(&self) -> &PreferenceMatrix {
        &self.preferences
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn weights(&self) -> &ObjectiveWeights {
        &self.weights
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn constraints(&self) -> &[HardConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &Expression {
        &self.objective
    }

    #[inline]
    pub fn employee_count(&self) -> usize {
        self.roster.len()
    }

    #[inline]
    pub fn shift_count(&self) -> usize {
        self.calendar.shift_count()
    }

    /// Variable of an (employee, shift) pair.
    #[inline]
    pub fn var(&self, employee: usize, shift: usize) -> VarId {
        VarId(employee * self.shift_count() + shift)
    }

    /// Preference cost of assigning a pair; `None` when unavailable.
    pub fn cost(&self, employee: usize, shift: usize) -> Option<f64> {
        match self.preferences.get(employee, shift) {
            Preference::Ranked(rank) => Some(f64::from(rank)),
            Preference::Neutral => Some(self.neutral_cost),
            Preference::Unavailable => None,
        }
    }

    /// Cost charged for neutral pairs.
    pub fn neutral_cost(&self) -> f64 {
        self.neutral_cost
    }

    /// Headcount bounds `(min, max)` of a shift.
    pub fn coverage_bounds(&self, shift: usize) -> (u32, u32) {
        self.coverage.get(shift).copied().unwrap_or((0, 0))
    }

    /// Load requirement of an employee.
    pub fn load_requirement(&self, employee: usize) -> Option<&LoadRequirement> {
        self.loads.get(employee)
    }

    /// Mean headcount per shift implied by the target loads.
    pub fn expected_headcount(&self) -> f64 {
        self.expected_headcount
    }

    /// An all-false assignment shaped for this model.
    pub fn empty_assignment(&self) -> Assignment {
        Assignment::new(self.employee_count(), self.shift_count())
    }

    /// Whether an assignment has this model's shape.
    pub fn fits(&self, assignment: &Assignment) -> bool {
        assignment.employee_count() == self.employee_count()
            && assignment.shift_count() == self.shift_count()
    }

    /// Soft objective value of an assignment.
    pub fn objective_value(&self, assignment: &Assignment) -> f64 {
        self.objective.evaluate(assignment.values())
    }

    /// Compiled constraints the assignment violates, in compilation order.
    pub fn unsatisfied_constraints(&self, assignment: &Assignment) -> Vec<&HardConstraint> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(assignment.values()))
            .collect()
    }

    /// Number of compiled constraints of one family.
    pub fn count_constraints(&self, kind: ConstraintKind) -> usize {
        self.constraints
            .iter()
            .filter(|c| c.label.kind == kind)
            .count()
    }
}
