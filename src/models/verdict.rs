//! Evaluation results.
//!
//! A [`Verdict`] is the reporting-boundary view of one candidate
//! assignment: whether every hard rule holds, every individual violation
//! with the employees and shifts it implicates, and the soft score.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Shift;

/// Result of evaluating one assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether no hard rule is violated.
    pub feasible: bool,
    /// Hard-rule violations in detection order.
    pub violations: Vec<Violation>,
    /// Average preference cost of assigned available pairs (lower is better).
    pub score: f64,
    /// Full soft objective value of the assignment.
    pub objective: f64,
    /// Number of assigned pairs.
    pub assigned: usize,
}

/// A single hard-rule violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub kind: ViolationKind,
    /// Implicated employee IDs.
    pub employees: Vec<String>,
    /// Implicated shifts.
    pub shifts: Vec<Shift>,
    /// Human-readable description.
    pub message: String,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of hard-rule violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Employee assigned to a shift marked unavailable.
    Unavailable,
    /// Employee works more than the maximum load.
    Overtime,
    /// Employee works less than the minimum load.
    Insufficient,
    /// Full-time employee deviates from their pattern.
    PatternMismatch,
    /// Shift headcount below its minimum.
    Understaffed,
    /// Shift headcount above its maximum.
    Overstaffed,
    /// Shift without exactly one manager.
    ManagerCoverage,
    /// Employee works more than one slot on a day.
    DoubleBooking,
    /// Trainee works a shift their trainer does not.
    TraineeWithoutTrainer,
    /// Run of worked days longer than the cap.
    TooManyConsecutive,
    /// Single day off between two worked days.
    IsolatedDayOff,
}

impl ViolationKind {
    /// Default severity of this kind.
    pub fn severity(self) -> i32 {
        match self {
            ViolationKind::Unavailable => 100,
            ViolationKind::DoubleBooking | ViolationKind::TraineeWithoutTrainer => 95,
            ViolationKind::ManagerCoverage => 90,
            ViolationKind::Understaffed => 85,
            ViolationKind::Overstaffed => 80,
            ViolationKind::TooManyConsecutive => 70,
            ViolationKind::Overtime
            | ViolationKind::Insufficient
            | ViolationKind::PatternMismatch => 60,
            ViolationKind::IsolatedDayOff => 50,
        }
    }

    /// Report heading under which violations of this kind are grouped.
    pub fn heading(self) -> &'static str {
        match self {
            ViolationKind::Unavailable => "Employees scheduled when unavailable",
            ViolationKind::Overtime => "Employees with scheduled overtime",
            ViolationKind::Insufficient => "Employees with not enough scheduled time",
            ViolationKind::PatternMismatch => "Employees off their full-time pattern",
            ViolationKind::Understaffed => "Understaffed shifts",
            ViolationKind::Overstaffed => "Overstaffed shifts",
            ViolationKind::ManagerCoverage => "Shifts with no manager",
            ViolationKind::DoubleBooking => "Employees double-booked on a day",
            ViolationKind::TraineeWithoutTrainer => "Shifts with trainee scheduling issues",
            ViolationKind::TooManyConsecutive => "Employees with too many consecutive shifts",
            ViolationKind::IsolatedDayOff => "Isolated shifts",
        }
    }
}

impl Violation {
    /// Creates a violation with the kind's default severity.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            employees: Vec::new(),
            shifts: Vec::new(),
            message: message.into(),
            severity: kind.severity(),
        }
    }

    /// Adds an implicated employee.
    pub fn with_employee(mut self, id: impl Into<String>) -> Self {
        self.employees.push(id.into());
        self
    }

    /// Adds an implicated shift.
    pub fn with_shift(mut self, shift: Shift) -> Self {
        self.shifts.push(shift);
        self
    }

    /// Adds several implicated shifts.
    pub fn with_shifts(mut self, shifts: impl IntoIterator<Item = Shift>) -> Self {
        self.shifts.extend(shifts);
        self
    }
}

impl Verdict {
    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.feasible
    }

    #[inline]
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// Sum of violation severities.
    pub fn total_severity(&self) -> i64 {
        self.violations.iter().map(|v| i64::from(v.severity)).sum()
    }

    /// Violations of one kind.
    pub fn violations_of(&self, kind: ViolationKind) -> Vec<&Violation> {
        self.violations.iter().filter(|v| v.kind == kind).collect()
    }

    /// Violation messages grouped under their report heading.
    pub fn grouped(&self) -> BTreeMap<&'static str, Vec<&str>> {
        let mut groups: BTreeMap<&'static str, Vec<&str>> = BTreeMap::new();
        for v in &self.violations {
            groups.entry(v.kind.heading()).or_default().push(&v.message);
        }
        groups
    }
}
