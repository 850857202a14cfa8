//! Candidate selection order.

use std::cmp::Ordering;

use crate::models::Verdict;

/// Orders verdicts from best to worst.
///
/// - Feasible beats infeasible.
/// - Among feasible: lower score, then lower objective.
/// - Among infeasible: fewer violations, then lower total severity, then
///   lower objective, then lower score.
///
/// Candidates equal on every key compare `Equal`; [`rank_candidates`]
/// then keeps the solver's own order.
pub fn compare_verdicts(a: &Verdict, b: &Verdict) -> Ordering {
    match (a.feasible, b.feasible) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => a
            .score
            .total_cmp(&b.score)
            .then_with(|| a.objective.total_cmp(&b.objective)),
        (false, false) => a
            .violation_count()
            .cmp(&b.violation_count())
            .then_with(|| a.total_severity().cmp(&b.total_severity()))
            .then_with(|| a.objective.total_cmp(&b.objective))
            .then_with(|| a.score.total_cmp(&b.score)),
    }
}

/// Indices of `verdicts` in selection order (stable).
pub fn rank_candidates(verdicts: &[Verdict]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..verdicts.len()).collect();
    order.sort_by(|&i, &j| compare_verdicts(&verdicts[i], &verdicts[j]));
    order
}

/// Index of the best verdict, or `None` when there are none.
pub fn select_best(verdicts: &[Verdict]) -> Option<usize> {
    rank_candidates(verdicts).first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Violation, ViolationKind};

    fn feasible(score: f64, objective: f64) -> Verdict {
        Verdict {
            feasible: true,
            violations: Vec::new(),
            score,
            objective,
            assigned: 1,
        }
    }

    fn infeasible(kinds: &[ViolationKind], objective: f64) -> Verdict {
        Verdict {
            feasible: false,
            violations: kinds.iter().map(|&k| Violation::new(k, "x")).collect(),
            score: 0.0,
            objective,
            assigned: 1,
        }
    }

    #[test]
    fn test_feasible_beats_infeasible() {
        let good = feasible(10.0, 100.0);
        let bad = infeasible(&[ViolationKind::IsolatedDayOff], 0.0);
        assert_eq!(compare_verdicts(&good, &bad), Ordering::Less);
        assert_eq!(compare_verdicts(&bad, &good), Ordering::Greater);
    }

    #[test]
    fn test_feasible_by_score_then_objective() {
        let verdicts = vec![feasible(2.0, 1.0), feasible(1.0, 9.0), feasible(1.0, 3.0)];
        assert_eq!(rank_candidates(&verdicts), vec![2, 1, 0]);
    }

    #[test]
    fn test_infeasible_by_count_then_severity() {
        let verdicts = vec![
            infeasible(&[ViolationKind::Unavailable, ViolationKind::Overtime], 0.0),
            infeasible(&[ViolationKind::Unavailable], 5.0),
            infeasible(&[ViolationKind::IsolatedDayOff], 50.0),
        ];
        // One violation each for 1 and 2; isolated (50) is less severe than unavailable (100).
        assert_eq!(rank_candidates(&verdicts), vec![2, 1, 0]);
    }

    #[test]
    fn test_ties_keep_solver_order() {
        let verdicts = vec![
            infeasible(&[ViolationKind::Understaffed], 1.0),
            feasible(0.5, 2.0),
            infeasible(&[ViolationKind::Understaffed], 1.0),
            feasible(0.5, 2.0),
        ];
        assert_eq!(rank_candidates(&verdicts), vec![1, 3, 0, 2]);
        assert_eq!(select_best(&verdicts), Some(1));
    }

    #[test]
    fn test_select_best_empty() {
        assert_eq!(select_best(&[]), None);
    }
}
