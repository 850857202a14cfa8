//! Feasibility and score evaluation.
//!
//! [`evaluate`] re-checks every hard rule of a [`CompiledModel`] against a
//! candidate [`Assignment`] directly on the domain (loads, headcounts, runs
//! of worked days), independent of how the candidate was produced, and
//! reports each violation individually.
//!
//! # Score
//! Average preference cost over assigned pairs: the rank for ranked pairs,
//! the model's neutral cost for neutral ones. Pairs assigned while
//! unavailable are reported as violations and left out of the average.
//! Lower is better; 0 means everyone got their top choice.
//!
//! # Selection
//! See [`compare_verdicts`] for the candidate order.

mod compare;

pub use compare::{compare_verdicts, rank_candidates, select_best};

use tracing::debug;

use crate::compiler::{CompiledModel, LoadRequirement};
use crate::models::{Assignment, Shift, Verdict, Violation, ViolationKind};

/// Evaluates an assignment against a compiled model.
///
/// Pure: the same (model, assignment) always yields an identical
/// [`Verdict`]. Violations are reported family by family in a fixed
/// order. Pairs outside the assignment's shape read as unassigned.
pub fn evaluate(model: &CompiledModel, assignment: &Assignment) -> Verdict {
    let check = Check { model, assignment };
    let mut violations = Vec::new();

    check.availability(&mut violations);
    check.loads(&mut violations);
    check.coverage(&mut violations);
    check.managers(&mut violations);
    check.double_booking(&mut violations);
    check.trainees(&mut violations);
    check.consecutive(&mut violations);
    check.isolated_days_off(&mut violations);

    let verdict = Verdict {
        feasible: violations.is_empty(),
        violations,
        score: check.score(),
        objective: model.objective_value(assignment),
        assigned: assignment.assigned_count(),
    };
    debug!(
        event = "candidate_evaluated",
        feasible = verdict.feasible,
        violations = verdict.violations.len(),
        score = verdict.score,
        objective = verdict.objective,
    );
    verdict
}

struct Check<'a> {
    model: &'a CompiledModel,
    assignment: &'a Assignment,
}

impl Check<'_> {
    fn id(&self, employee: usize) -> &str {
        self.model
            .roster()
            .employee(employee)
            .map(|e| e.id.as_str())
            .unwrap_or_default()
    }

    fn shift(&self, index: usize) -> Shift {
        self.model.calendar().shift_at(index).unwrap_or(Shift::on_day(0))
    }

    fn label(&self, index: usize) -> String {
        self.model.calendar().label(self.shift(index))
    }

    fn slots(&self) -> usize {
        self.model.calendar().slots_per_day as usize
    }

    /// Assigned shifts of an employee on one day.
    fn day_shifts(&self, employee: usize, day: u32) -> Vec<Shift> {
        let slots = self.slots();
        (0..slots)
            .filter(|&slot| self.assignment.is_assigned(employee, day as usize * slots + slot))
            .map(|slot| Shift::new(day, slot as u32))
            .collect()
    }

    fn works_on(&self, employee: usize, day: u32) -> bool {
        !self.day_shifts(employee, day).is_empty()
    }

    fn availability(&self, out: &mut Vec<Violation>) {
        let prefs = self.model.preferences();
        for (e, s) in self.assignment.assigned_pairs() {
            if !prefs.is_available(e, s) {
                out.push(
                    Violation::new(
                        ViolationKind::Unavailable,
                        format!("{} on {}", self.id(e), self.label(s)),
                    )
                    .with_employee(self.id(e))
                    .with_shift(self.shift(s)),
                );
            }
        }
    }

    fn loads(&self, out: &mut Vec<Violation>) {
        let days = self.model.calendar().days;
        for e in 0..self.model.employee_count() {
            let Some(requirement) = self.model.load_requirement(e) else {
                continue;
            };
            let id = self.id(e);
            match requirement {
                LoadRequirement::Range { min, max } => {
                    let load = self.assignment.load(e);
                    if load > *max as usize {
                        out.push(
                            Violation::new(
                                ViolationKind::Overtime,
                                format!("{id} works {load} shifts, maximum {max}"),
                            )
                            .with_employee(id),
                        );
                    } else if load < *min as usize {
                        out.push(
                            Violation::new(
                                ViolationKind::Insufficient,
                                format!("{id} works {load} shifts, minimum {min}"),
                            )
                            .with_employee(id),
                        );
                    }
                }
                LoadRequirement::Pattern { days: worked } => {
                    for d in 0..days {
                        let expected = usize::from(worked.contains(&d));
                        let actual = self.day_shifts(e, d);
                        if actual.len() != expected {
                            let day = self.model.calendar().day_label(d);
                            let message = if expected == 1 {
                                format!("{id} off pattern on {day}: expected to work")
                            } else {
                                format!("{id} off pattern on {day}: expected a day off")
                            };
                            out.push(
                                Violation::new(ViolationKind::PatternMismatch, message)
                                    .with_employee(id)
                                    .with_shift(Shift::on_day(d)),
                            );
                        }
                    }
                }
            }
        }
    }

    fn coverage(&self, out: &mut Vec<Violation>) {
        for s in 0..self.model.shift_count() {
            let (min, max) = self.model.coverage_bounds(s);
            let headcount = self.assignment.headcount(s);
            if headcount < min as usize {
                out.push(
                    Violation::new(
                        ViolationKind::Understaffed,
                        format!("{} is understaffed ({headcount} of {min})", self.label(s)),
                    )
                    .with_shift(self.shift(s)),
                );
            } else if headcount > max as usize {
                out.push(
                    Violation::new(
                        ViolationKind::Overstaffed,
                        format!("{} is overstaffed ({headcount}, maximum {max})", self.label(s)),
                    )
                    .with_shift(self.shift(s)),
                );
            }
        }
    }

    fn managers(&self, out: &mut Vec<Violation>) {
        if !self.model.rules().require_manager_per_shift {
            return;
        }
        let managers = self.model.roster().managers();
        for s in 0..self.model.shift_count() {
            let on_shift: Vec<usize> = managers
                .iter()
                .copied()
                .filter(|&m| self.assignment.is_assigned(m, s))
                .collect();
            if on_shift.len() == 1 {
                continue;
            }
            let message = if on_shift.is_empty() {
                format!("No manager scheduled on {}", self.label(s))
            } else {
                format!("{} managers scheduled on {}", on_shift.len(), self.label(s))
            };
            let mut v = Violation::new(ViolationKind::ManagerCoverage, message)
                .with_shift(self.shift(s));
            for m in on_shift {
                v = v.with_employee(self.id(m));
            }
            out.push(v);
        }
    }

    fn double_booking(&self, out: &mut Vec<Violation>) {
        if self.slots() < 2 {
            return;
        }
        for e in 0..self.model.employee_count() {
            for d in 0..self.model.calendar().days {
                let shifts = self.day_shifts(e, d);
                if shifts.len() > 1 {
                    out.push(
                        Violation::new(
                            ViolationKind::DoubleBooking,
                            format!(
                                "{} works {} shifts on {}",
                                self.id(e),
                                shifts.len(),
                                self.model.calendar().day_label(d)
                            ),
                        )
                        .with_employee(self.id(e))
                        .with_shifts(shifts),
                    );
                }
            }
        }
    }

    fn trainees(&self, out: &mut Vec<Violation>) {
        for (trainee, trainer) in self.model.roster().trainee_pairs() {
            for s in 0..self.model.shift_count() {
                if self.assignment.is_assigned(trainee, s)
                    && !self.assignment.is_assigned(trainer, s)
                {
                    out.push(
                        Violation::new(
                            ViolationKind::TraineeWithoutTrainer,
                            format!(
                                "Trainee scheduling issue on {}: {} without {}",
                                self.label(s),
                                self.id(trainee),
                                self.id(trainer)
                            ),
                        )
                        .with_employee(self.id(trainee))
                        .with_employee(self.id(trainer))
                        .with_shift(self.shift(s)),
                    );
                }
            }
        }
    }

    /// One violation per maximal run of worked days longer than the cap.
    fn consecutive(&self, out: &mut Vec<Violation>) {
        let cap = self.model.rules().max_consecutive_shifts;
        let days = self.model.calendar().days;
        for e in 0..self.model.employee_count() {
            let mut start = 0;
            let mut len = 0;
            for d in 0..=days {
                if d < days && self.works_on(e, d) {
                    if len == 0 {
                        start = d;
                    }
                    len += 1;
                    continue;
                }
                if len > cap {
                    let id = self.id(e);
                    out.push(
                        Violation::new(
                            ViolationKind::TooManyConsecutive,
                            format!(
                                "{id} works {len} consecutive days starting with {}",
                                self.model.calendar().day_label(start)
                            ),
                        )
                        .with_employee(id)
                        .with_shifts((start..start + len).flat_map(|d| self.day_shifts(e, d))),
                    );
                }
                len = 0;
            }
        }
    }

    /// A day off counts as isolated only between two worked days inside
    /// the horizon.
    fn isolated_days_off(&self, out: &mut Vec<Violation>) {
        if self.model.rules().allow_isolated_days_off {
            return;
        }
        let days = self.model.calendar().days;
        for e in 0..self.model.employee_count() {
            for d in 1..days.saturating_sub(1) {
                if self.works_on(e, d - 1) && !self.works_on(e, d) && self.works_on(e, d + 1) {
                    let id = self.id(e);
                    out.push(
                        Violation::new(
                            ViolationKind::IsolatedDayOff,
                            format!(
                                "{} is an isolated day off for {id}",
                                self.model.calendar().day_label(d)
                            ),
                        )
                        .with_employee(id)
                        .with_shift(Shift::on_day(d)),
                    );
                }
            }
        }
    }

    fn score(&self) -> f64 {
        let costs: Vec<f64> = self
            .assignment
            .assigned_pairs()
            .into_iter()
            .filter_map(|(e, s)| self.model.cost(e, s))
            .collect();
        if costs.is_empty() {
            0.0
        } else {
            costs.iter().sum::<f64>() / costs.len() as f64
        }
    }
}
