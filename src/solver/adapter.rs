//! Solver round trip and result reporting.

use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{RawSample, SolveStatus, Solver, SolverProblem, SolverResponse};
use crate::compiler::CompiledModel;
use crate::error::{InfeasibleResultWarning, SolverUnavailableError};
use crate::evaluator::{compare_verdicts, evaluate};
use crate::models::{Assignment, Verdict};

/// Calls a solver under a timeout and turns its answer into a report.
///
/// The adapter holds no model state: the same [`CompiledModel`] can be
/// solved again after a failure or timeout.
#[derive(Debug, Clone, Default)]
pub struct SolverAdapter {
    timeout: Option<Duration>,
}

/// A normalized candidate and its verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedCandidate {
    pub assignment: Assignment,
    pub verdict: Verdict,
}

/// Why a run produced no candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoSolutionReason {
    /// The solver call failed or timed out.
    Unavailable(SolverUnavailableError),
    /// The solver answered without any sample.
    NoCandidates(SolveStatus),
}

/// Final classification of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveOutcome {
    /// The best candidate satisfies every hard rule.
    Feasible,
    /// Best-effort result: no candidate is feasible.
    Infeasible(InfeasibleResultWarning),
    /// Nothing to report.
    NoSolution(NoSolutionReason),
}

/// Everything a caller learns from one solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    /// Solver name.
    pub solver: String,
    /// Status claimed by the solver, if it answered.
    pub status: Option<SolveStatus>,
    /// Candidates in selection order, best first.
    pub candidates: Vec<EvaluatedCandidate>,
    pub outcome: SolveOutcome,
}

impl SolveReport {
    /// The selected candidate.
    pub fn best(&self) -> Option<&EvaluatedCandidate> {
        self.candidates.first()
    }

    pub fn is_feasible(&self) -> bool {
        matches!(self.outcome, SolveOutcome::Feasible)
    }

    /// The warning attached to a best-effort infeasible result.
    pub fn warning(&self) -> Option<&InfeasibleResultWarning> {
        match &self.outcome {
            SolveOutcome::Infeasible(w) => Some(w),
            _ => None,
        }
    }
}

impl SolverAdapter {
    /// Creates an adapter without a timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the solver timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Solves `model` with `solver` and reports the evaluated candidates.
    ///
    /// Never fails: solver errors and timeouts become
    /// [`SolveOutcome::NoSolution`]. The solver runs on a worker thread; on
    /// timeout the worker is abandoned and its late answer dropped.
    pub fn solve<S>(&self, model: &CompiledModel, solver: Arc<S>) -> SolveReport
    where
        S: Solver + Send + Sync + ?Sized + 'static,
    {
        let name = solver.name().to_string();
        let problem = SolverProblem::from_model(model, self.timeout);
        info!(
            event = "solve_start",
            solver = %name,
            variables = problem.variable_count(),
            constraints = problem.constraints.len(),
            timeout = ?self.timeout,
        );

        let report = match self.call(solver, problem) {
            Ok(response) => self.report(model, name, response),
            Err(err) => {
                warn!(event = "solver_unavailable", solver = %name, error = %err);
                SolveReport {
                    solver: name,
                    status: None,
                    candidates: Vec::new(),
                    outcome: SolveOutcome::NoSolution(NoSolutionReason::Unavailable(err)),
                }
            }
        };

        info!(
            event = "solve_end",
            solver = %report.solver,
            status = ?report.status,
            candidates = report.candidates.len(),
            feasible = report.is_feasible(),
        );
        report
    }

    fn call<S>(
        &self,
        solver: Arc<S>,
        problem: SolverProblem,
    ) -> Result<SolverResponse, SolverUnavailableError>
    where
        S: Solver + Send + Sync + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("u-roster-solver".into())
            .spawn(move || {
                // The receiver is gone after a timeout.
                let _ = tx.send(solver.solve(&problem));
            })
            .map_err(|e| SolverUnavailableError::Failed(e.to_string()))?;

        match self.timeout {
            Some(limit) => rx.recv_timeout(limit).map_err(|e| match e {
                RecvTimeoutError::Timeout => SolverUnavailableError::TimedOut(limit),
                RecvTimeoutError::Disconnected => SolverUnavailableError::Disconnected,
            })?,
            None => rx.recv().map_err(|_| SolverUnavailableError::Disconnected)?,
        }
    }

    fn report(&self, model: &CompiledModel, solver: String, response: SolverResponse) -> SolveReport {
        let mut candidates: Vec<EvaluatedCandidate> = response
            .samples
            .iter()
            .map(|sample| {
                let assignment = normalize_sample(model, sample);
                let verdict = evaluate(model, &assignment);
                EvaluatedCandidate {
                    assignment,
                    verdict,
                }
            })
            .collect();
        candidates.sort_by(|a, b| compare_verdicts(&a.verdict, &b.verdict));

        let outcome = match candidates.first() {
            None => {
                warn!(event = "no_candidates", solver = %solver, status = ?response.status);
                SolveOutcome::NoSolution(NoSolutionReason::NoCandidates(response.status))
            }
            Some(best) if best.verdict.feasible => {
                if !matches!(response.status, SolveStatus::Optimal | SolveStatus::Feasible) {
                    debug!(event = "status_overridden", solver = %solver, status = ?response.status);
                }
                SolveOutcome::Feasible
            }
            Some(best) => {
                let warning = InfeasibleResultWarning {
                    candidates: candidates.len(),
                    violations: best.verdict.violation_count(),
                };
                warn!(event = "infeasible_result", solver = %solver, warning = %warning);
                SolveOutcome::Infeasible(warning)
            }
        };

        SolveReport {
            solver,
            status: Some(response.status),
            candidates,
            outcome,
        }
    }
}

/// Converts a raw solver sample into an assignment shaped for `model`.
///
/// Dense samples map by variable index; extra values are ignored and
/// missing ones read false. Labeled samples map by variable label with
/// `value >= 0.5` meaning assigned; unknown labels are ignored and missing
/// labels read false, both with a warning.
pub fn normalize_sample(model: &CompiledModel, sample: &RawSample) -> Assignment {
    let employees = model.employee_count();
    let shifts = model.shift_count();
    let expected = employees * shifts;
    let mut assignment = Assignment::new(employees, shifts);

    match sample {
        RawSample::Dense(values) => {
            if values.len() != expected {
                warn!(event = "sample_length_mismatch", expected, actual = values.len());
            }
            for (i, &value) in values.iter().enumerate().take(expected) {
                if value {
                    assignment.set(i / shifts, i % shifts, true);
                }
            }
        }
        RawSample::Labeled(values) => {
            let index: HashMap<&str, (usize, usize)> = model
                .variables()
                .iter()
                .map(|v| (v.label.as_str(), (v.employee, v.shift)))
                .collect();
            let mut unknown = Vec::new();
            for (label, &value) in values {
                match index.get(label.as_str()) {
                    Some(&(e, s)) => assignment.set(e, s, value >= 0.5),
                    None => unknown.push(label.as_str()),
                }
            }
            if let Some(first) = unknown.first() {
                warn!(event = "unknown_labels", count = unknown.len(), first = %first);
            }
            let missing = expected.saturating_sub(values.len() - unknown.len());
            if missing > 0 {
                warn!(event = "missing_labels", count = missing);
            }
        }
    }
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ModelCompiler;
    use crate::models::{Employee, PreferenceMatrix, Roster, RuleSet, ShiftCalendar, ViolationKind};
    use crate::solver::GreedySolver;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    /// Six regulars, two days, exactly three per day, one shift each.
    fn scenario_a() -> CompiledModel {
        let roster =
            Roster::from_employees((1..=6).map(|i| Employee::regular(format!("Emp{i}"))).collect())
                .unwrap();
        let cal = ShiftCalendar::new(NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(), 2);
        let prefs = PreferenceMatrix::new(&roster, &cal);
        let rules = RuleSet::default()
            .with_manager_required(false)
            .with_shift_bounds(3, 3)
            .with_load_bounds(1, 1);
        ModelCompiler::new(&roster, &cal, &prefs, &rules)
            .compile()
            .unwrap()
    }

    fn dense(day0: &[usize]) -> RawSample {
        // Employees in `day0` work day 0, everyone else day 1.
        let mut values = vec![false; 12];
        for e in 0..6 {
            let s = if day0.contains(&e) { 0 } else { 1 };
            values[e * 2 + s] = true;
        }
        RawSample::Dense(values)
    }

    struct FixedSolver(SolverResponse);

    impl Solver for FixedSolver {
        fn name(&self) -> &str {
            "fixed"
        }

        fn solve(&self, _: &SolverProblem) -> Result<SolverResponse, SolverUnavailableError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSolver;

    impl Solver for FailingSolver {
        fn name(&self) -> &str {
            "failing"
        }

        fn solve(&self, _: &SolverProblem) -> Result<SolverResponse, SolverUnavailableError> {
            Err(SolverUnavailableError::Failed("license expired".into()))
        }
    }

    struct SlowSolver;

    impl Solver for SlowSolver {
        fn name(&self) -> &str {
            "slow"
        }

        fn solve(&self, _: &SolverProblem) -> Result<SolverResponse, SolverUnavailableError> {
            thread::sleep(Duration::from_millis(500));
            Ok(SolverResponse::new(SolveStatus::NoFeasibleFound))
        }
    }

    struct PanickingSolver;

    impl Solver for PanickingSolver {
        fn name(&self) -> &str {
            "panicking"
        }

        fn solve(&self, _: &SolverProblem) -> Result<SolverResponse, SolverUnavailableError> {
            panic!("solver crashed")
        }
    }

    #[test]
    fn test_feasible_candidate_selected() {
        let model = scenario_a();
        let response = SolverResponse::new(SolveStatus::Feasible)
            .with_sample(dense(&[0, 1, 2, 3]))
            .with_sample(dense(&[0, 1, 2]));
        let report = SolverAdapter::new().solve(&model, Arc::new(FixedSolver(response)));

        assert_eq!(report.solver, "fixed");
        assert_eq!(report.outcome, SolveOutcome::Feasible);
        assert_eq!(report.candidates.len(), 2);
        let best = report.best().unwrap();
        assert!(best.verdict.feasible);
        assert!(best.assignment.is_assigned(2, 0));
        assert!(best.assignment.is_assigned(3, 1));
        assert!(!report.candidates[1].verdict.feasible);
    }

    #[test]
    fn test_evaluator_overrides_claimed_status() {
        let model = scenario_a();
        let response = SolverResponse::new(SolveStatus::Optimal).with_sample(dense(&[0, 1, 2, 3]));
        let report = SolverAdapter::new().solve(&model, Arc::new(FixedSolver(response)));

        assert_eq!(report.status, Some(SolveStatus::Optimal));
        let warning = report.warning().unwrap();
        assert_eq!(warning.candidates, 1);
        assert_eq!(warning.violations, 2);
        let best = report.best().unwrap();
        assert_eq!(best.verdict.violations_of(ViolationKind::Overstaffed).len(), 1);
        assert_eq!(best.verdict.violations_of(ViolationKind::Understaffed).len(), 1);
    }

    #[test]
    fn test_infeasible_best_effort_ranked() {
        let model = scenario_a();
        let response = SolverResponse::new(SolveStatus::NoFeasibleFound)
            .with_sample(RawSample::Dense(vec![false; 12]))
            .with_sample(dense(&[0, 1, 2, 3]));
        let report = SolverAdapter::new().solve(&model, Arc::new(FixedSolver(response)));

        assert!(!report.is_feasible());
        // 2 violations beat the 8 of the empty sample.
        assert_eq!(report.best().unwrap().verdict.violation_count(), 2);
        assert_eq!(report.candidates[1].verdict.violation_count(), 8);
    }

    #[test]
    fn test_no_samples() {
        let model = scenario_a();
        let response = SolverResponse::new(SolveStatus::NoFeasibleFound);
        let report = SolverAdapter::new().solve(&model, Arc::new(FixedSolver(response)));
        assert_eq!(
            report.outcome,
            SolveOutcome::NoSolution(NoSolutionReason::NoCandidates(
                SolveStatus::NoFeasibleFound
            ))
        );
        assert!(report.best().is_none());
    }

    #[test]
    fn test_solver_failure() {
        let model = scenario_a();
        let report = SolverAdapter::new().solve(&model, Arc::new(FailingSolver));
        assert_eq!(report.status, None);
        assert!(matches!(
            report.outcome,
            SolveOutcome::NoSolution(NoSolutionReason::Unavailable(
                SolverUnavailableError::Failed(_)
            ))
        ));
    }

    #[test]
    fn test_solver_timeout_then_reuse() {
        let model = scenario_a();
        let adapter = SolverAdapter::new().with_timeout(Duration::from_millis(20));
        let report = adapter.solve(&model, Arc::new(SlowSolver));
        assert_eq!(
            report.outcome,
            SolveOutcome::NoSolution(NoSolutionReason::Unavailable(
                SolverUnavailableError::TimedOut(Duration::from_millis(20))
            ))
        );

        // The model is untouched and can be solved again.
        let retry = adapter.solve(&model, Arc::new(GreedySolver::new()));
        assert!(retry.is_feasible());
    }

    #[test]
    fn test_solver_panic() {
        let model = scenario_a();
        let report = SolverAdapter::new().solve(&model, Arc::new(PanickingSolver));
        assert_eq!(
            report.outcome,
            SolveOutcome::NoSolution(NoSolutionReason::Unavailable(
                SolverUnavailableError::Disconnected
            ))
        );
    }

    #[test]
    fn test_dyn_solver() {
        let model = scenario_a();
        let solver: Arc<dyn Solver + Send + Sync> = Arc::new(GreedySolver::new());
        let report = SolverAdapter::new().solve(&model, solver);
        assert_eq!(report.solver, "greedy");
        assert!(report.is_feasible());
    }

    #[test]
    fn test_normalize_labeled_sample() {
        let model = scenario_a();
        let mut values = BTreeMap::new();
        values.insert("Emp1_1".to_string(), 1.0);
        values.insert("Emp1_2".to_string(), 0.49);
        values.insert("Emp2_2".to_string(), 0.5);
        values.insert("Ghost_1".to_string(), 1.0);
        let a = normalize_sample(&model, &RawSample::Labeled(values));

        assert!(a.is_assigned(0, 0));
        assert!(!a.is_assigned(0, 1));
        assert!(a.is_assigned(1, 1));
        assert_eq!(a.assigned_count(), 2);
    }

    #[test]
    fn test_normalize_dense_length_mismatch() {
        let model = scenario_a();
        let short = normalize_sample(&model, &RawSample::Dense(vec![true, true]));
        assert_eq!(short.assigned_pairs(), vec![(0, 0), (0, 1)]);

        let long = normalize_sample(&model, &RawSample::Dense(vec![true; 20]));
        assert_eq!(long.assigned_count(), 12);
    }

    #[test]
    fn test_report_json() {
        let model = scenario_a();
        let response = SolverResponse::new(SolveStatus::Feasible).with_sample(dense(&[0, 1, 2]));
        let report = SolverAdapter::new().solve(&model, Arc::new(FixedSolver(response)));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "feasible");
        assert_eq!(json["status"], "feasible");
        assert_eq!(json["candidates"][0]["verdict"]["feasible"], true);
    }
}
