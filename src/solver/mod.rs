//! Solver boundary.
//!
//! The optimization engine is an external collaborator behind the
//! [`Solver`] trait. It receives a [`SolverProblem`]: string-labeled binary
//! variables, labeled hard constraints and the quadratic objective of a
//! [`CompiledModel`](crate::compiler::CompiledModel). It answers with a
//! status and zero or more raw samples.
//!
//! [`SolverAdapter`] owns the round trip: it builds the problem, calls the
//! solver under a timeout, normalizes samples back into
//! [`Assignment`](crate::models::Assignment)s and lets the evaluator decide
//! which candidate is reported. A solver's own status claim never
//! overrides the evaluator.
//!
//! [`GreedySolver`] is a baseline implementation of the trait.

mod adapter;
mod greedy;

pub use adapter::{
    normalize_sample, EvaluatedCandidate, NoSolutionReason, SolveOutcome, SolveReport,
    SolverAdapter,
};
pub use greedy::GreedySolver;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::compiler::{CompiledModel, Expression, Sense};
use crate::error::SolverUnavailableError;

/// A black-box optimization engine.
pub trait Solver {
    /// Solver name, for logs and reports.
    fn name(&self) -> &str;

    /// Solves a problem.
    ///
    /// # Errors
    /// `SolverUnavailableError` when no response can be produced at all.
    /// "No feasible solution" is a status, not an error.
    fn solve(&self, problem: &SolverProblem) -> Result<SolverResponse, SolverUnavailableError>;
}

/// A labeled hard constraint in solver-facing form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledConstraint {
    /// `"kind,employee,shift"` label.
    pub label: String,
    pub expr: Expression,
    pub sense: Sense,
    pub rhs: f64,
}

impl LabeledConstraint {
    /// Amount by which a dense sample violates the constraint.
    pub fn violation(&self, values: &[bool]) -> f64 {
        self.sense.deficit(self.expr.evaluate(values), self.rhs)
    }
}

/// Solver input contract.
///
/// Variable `i` of every expression is `variables[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverProblem {
    /// Variable labels (`"{employee}_{shift}"`) in index order.
    pub variables: Vec<String>,
    pub constraints: Vec<LabeledConstraint>,
    /// Quadratic objective to minimize.
    pub objective: Expression,
    /// Time the solver may spend.
    pub time_limit: Option<Duration>,
}

impl SolverProblem {
    /// Builds the solver-facing view of a compiled model.
    pub fn from_model(model: &CompiledModel, time_limit: Option<Duration>) -> Self {
        Self {
            variables: model.variables().iter().map(|v| v.label.clone()).collect(),
            constraints: model
                .constraints()
                .iter()
                .map(|c| LabeledConstraint {
                    label: c.label.to_string(),
                    expr: c.expr.clone(),
                    sense: c.sense,
                    rhs: c.rhs,
                })
                .collect(),
            objective: model.objective().clone(),
            time_limit,
        }
    }

    #[inline]
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Sum of constraint deficits of a dense sample (0 when feasible).
    pub fn total_violation(&self, values: &[bool]) -> f64 {
        self.constraints.iter().map(|c| c.violation(values)).sum()
    }

    /// Labels of the constraints a dense sample violates.
    pub fn violated_labels(&self, values: &[bool]) -> Vec<&str> {
        self.constraints
            .iter()
            .filter(|c| c.violation(values) > 0.0)
            .map(|c| c.label.as_str())
            .collect()
    }

    pub fn is_feasible(&self, values: &[bool]) -> bool {
        self.constraints.iter().all(|c| c.violation(values) == 0.0)
    }
}

/// Solver outcome status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Solved to proven optimality.
    Optimal,
    /// A feasible solution was found.
    Feasible,
    /// The solver found no feasible solution (samples may still be present).
    NoFeasibleFound,
    /// The solver reported an internal error.
    SolverError,
}

/// One raw candidate as returned by a solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawSample {
    /// Values in variable index order.
    Dense(Vec<bool>),
    /// Values keyed by variable label; `>= 0.5` reads as assigned.
    Labeled(BTreeMap<String, f64>),
}

/// Solver output: a status and candidates, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverResponse {
    pub status: SolveStatus,
    pub samples: Vec<RawSample>,
}

impl SolverResponse {
    pub fn new(status: SolveStatus) -> Self {
        Self {
            status,
            samples: Vec::new(),
        }
    }

    /// Adds a sample.
    pub fn with_sample(mut self, sample: RawSample) -> Self {
        self.samples.push(sample);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ModelCompiler;
    use crate::models::{Employee, PreferenceMatrix, Roster, RuleSet, ShiftCalendar};
    use chrono::NaiveDate;

    fn model() -> CompiledModel {
        let roster = Roster::from_employees(vec![
            Employee::regular("E"),
            Employee::trainee("T", "E"),
        ])
        .unwrap();
        let cal = ShiftCalendar::new(NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(), 2);
        let prefs = PreferenceMatrix::new(&roster, &cal);
        let rules = RuleSet::default()
            .with_manager_required(false)
            .with_shift_bounds(0, 2)
            .with_load_bounds(0, 2);
        ModelCompiler::new(&roster, &cal, &prefs, &rules)
            .compile()
            .unwrap()
    }

    #[test]
    fn test_problem_from_model() {
        let model = model();
        let problem = SolverProblem::from_model(&model, Some(Duration::from_secs(3)));
        assert_eq!(problem.variables, vec!["E_1", "E_2", "T_1", "T_2"]);
        assert_eq!(problem.constraints.len(), model.constraints().len());
        assert!(problem
            .constraints
            .iter()
            .any(|c| c.label == "trainee_issue,T,2"));
        assert_eq!(problem.time_limit, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_problem_feasibility() {
        let problem = SolverProblem::from_model(&model(), None);
        assert!(problem.is_feasible(&[true, false, true, false]));
        let bad = [false, false, true, false];
        assert!(!problem.is_feasible(&bad));
        assert_eq!(problem.violated_labels(&bad), vec!["trainee_issue,T,1"]);
        assert!((problem.total_violation(&bad) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_problem_json() {
        let problem = SolverProblem::from_model(&model(), None);
        let json = serde_json::to_string(&problem).unwrap();
        let back: SolverProblem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, problem);
    }
}
