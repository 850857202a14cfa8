//! Greedy descent baseline solver.
//!
//! # Algorithm
//!
//! 1. Start from the all-false sample.
//! 2. Visit variables in ascending linear objective cost.
//! 3. Flip a variable when the flip strictly lowers total constraint
//!    violation, or keeps it and strictly lowers the objective.
//! 4. Repeat passes until no flip is accepted, the pass limit is reached or
//!    the problem's time limit runs out.
//!
//! Every accepted flip lowers `(violation, objective)` lexicographically, so
//! the descent terminates. It is a local search: it may stop at an
//! infeasible sample, in which case the sample is still returned with
//! [`SolveStatus::NoFeasibleFound`].

use std::time::Instant;

use tracing::debug;

use super::{RawSample, SolveStatus, Solver, SolverProblem, SolverResponse};
use crate::compiler::TOLERANCE;
use crate::error::SolverUnavailableError;

/// Greedy bit-flip descent over a [`SolverProblem`].
#[derive(Debug, Clone)]
pub struct GreedySolver {
    max_passes: usize,
}

impl Default for GreedySolver {
    fn default() -> Self {
        Self { max_passes: 50 }
    }
}

impl GreedySolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pass limit (at least 1).
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }
}

/// Per-variable view of the objective and constraint structure.
struct Neighborhood {
    linear: Vec<f64>,
    pairs: Vec<Vec<(usize, f64)>>,
    touching: Vec<Vec<usize>>,
}

impl Neighborhood {
    fn build(problem: &SolverProblem) -> Self {
        let n = problem.variable_count();
        let mut linear = vec![0.0; n];
        let mut pairs = vec![Vec::new(); n];
        let mut touching = vec![Vec::new(); n];

        for term in &problem.objective.linear {
            if let Some(c) = linear.get_mut(term.var.0) {
                *c += term.coef;
            }
        }
        for term in &problem.objective.quadratic {
            let (a, b) = (term.a.0, term.b.0);
            if a < n && b < n {
                pairs[a].push((b, term.coef));
                pairs[b].push((a, term.coef));
            }
        }
        for (c, constraint) in problem.constraints.iter().enumerate() {
            let vars = constraint
                .expr
                .linear
                .iter()
                .map(|t| t.var.0)
                .chain(constraint.expr.quadratic.iter().flat_map(|t| [t.a.0, t.b.0]));
            for v in vars {
                if let Some(list) = touching.get_mut(v) {
                    if list.last() != Some(&c) {
                        list.push(c);
                    }
                }
            }
        }
        for list in &mut touching {
            list.sort_unstable();
            list.dedup();
        }

        Self {
            linear,
            pairs,
            touching,
        }
    }

    /// Objective change of flipping `var` in `values`.
    fn objective_delta(&self, values: &[bool], var: usize) -> f64 {
        let marginal = self.linear[var]
            + self.pairs[var]
                .iter()
                .filter(|&&(other, _)| values[other])
                .map(|&(_, coef)| coef)
                .sum::<f64>();
        if values[var] {
            -marginal
        } else {
            marginal
        }
    }
}

impl Solver for GreedySolver {
    fn name(&self) -> &str {
        "greedy"
    }

    fn solve(&self, problem: &SolverProblem) -> Result<SolverResponse, SolverUnavailableError> {
        let started = Instant::now();
        let n = problem.variable_count();
        let hood = Neighborhood::build(problem);

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| hood.linear[a].total_cmp(&hood.linear[b]).then(a.cmp(&b)));

        let mut values = vec![false; n];
        let mut passes = 0;
        let mut flips = 0;
        while passes < self.max_passes {
            if problem.time_limit.is_some_and(|limit| started.elapsed() >= limit) {
                debug!(event = "greedy_time_limit", passes);
                break;
            }
            passes += 1;
            let mut improved = false;

            for &var in &order {
                let touched = &hood.touching[var];
                let before: f64 = touched
                    .iter()
                    .map(|&c| problem.constraints[c].violation(&values))
                    .sum();
                let objective_delta = hood.objective_delta(&values, var);

                values[var] = !values[var];
                let after: f64 = touched
                    .iter()
                    .map(|&c| problem.constraints[c].violation(&values))
                    .sum();
                let violation_delta = after - before;

                let accept = violation_delta < -TOLERANCE
                    || (violation_delta.abs() <= TOLERANCE && objective_delta < -TOLERANCE);
                if accept {
                    improved = true;
                    flips += 1;
                } else {
                    values[var] = !values[var];
                }
            }

            if !improved {
                break;
            }
        }

        let status = if problem.is_feasible(&values) {
            SolveStatus::Feasible
        } else {
            SolveStatus::NoFeasibleFound
        };
        debug!(event = "greedy_finished", passes, flips, status = ?status);
        Ok(SolverResponse::new(status).with_sample(RawSample::Dense(values)))
    }
}
