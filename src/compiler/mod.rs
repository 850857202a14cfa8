//! Constraint compilation.
//!
//! Translates a roster, shift calendar, preference matrix and rule set into
//! a [`CompiledModel`]: one binary variable per (employee, shift) pair,
//! labeled hard constraints and a quadratic soft objective. Any solver
//! consumes the model through the same contract, and every candidate is
//! judged against it by the evaluator.
//!
//! # Hard constraints
//!
//! | Family | Form |
//! |--------|------|
//! | Unavailable | `x = 0` for every unavailable pair |
//! | Load | `min ≤ Σₛ x ≤ max`, or one slot per pattern day and none otherwise |
//! | Coverage | `min ≤ Σₑ x ≤ max` per shift (forecast: `= demand`) |
//! | Manager | `Σ managers = 1` per shift |
//! | Double booking | `Σ slots ≤ 1` per employee and day |
//! | Trainee | `x_trainee − x_trainer ≤ 0` per shift |
//! | Consecutive | `Σ` over any `cap + 1` day window `≤ cap` |
//! | Isolated day off | `−3w_d + w_{d−1}w_d + w_d w_{d+1} + w_{d−1}w_{d+1} ≤ 0` |
//!
//! # Objective
//! `Σ cost·x + λ_d·Σₛ (headcount − mean)² + λ_l·Σₑ (load − target)²`,
//! where cost is the preference rank (or the neutral cost).
//!
//! # Early rejection
//! Rule sets that no assignment can satisfy are rejected with a
//! [`ModelCompilationError`] before any solver runs.
//!
//! # Reference
//! Ernst et al. (2004), "Staff scheduling and rostering: A review of
//! applications, methods and models"

mod expression;
mod model;

pub use expression::{Expression, LinearTerm, QuadraticTerm, Sense, VarId, TOLERANCE};
pub use model::{
    CompiledModel, ConstraintKind, ConstraintLabel, HardConstraint, LoadRequirement, Variable,
};

use tracing::{debug, info};

use crate::error::ModelCompilationError;
use crate::models::{ObjectiveWeights, PreferenceMatrix, Roster, RuleSet, Shift, ShiftCalendar};

/// Builds a [`CompiledModel`] from borrowed domain inputs.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use u_roster::compiler::ModelCompiler;
/// use u_roster::models::{PreferenceMatrix, Roster, RosterSpec, RuleSet, ShiftCalendar};
///
/// let roster = Roster::generate(&RosterSpec::new(6, 2, 1)).unwrap();
/// let calendar = ShiftCalendar::new(NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(), 7);
/// let prefs = PreferenceMatrix::new(&roster, &calendar);
/// let rules = RuleSet::default().with_load_bounds(2, 5).with_shift_bounds(1, 6);
///
/// let model = ModelCompiler::new(&roster, &calendar, &prefs, &rules).compile().unwrap();
/// assert_eq!(model.variables().len(), 6 * 7);
/// ```
pub struct ModelCompiler<'a> {
    roster: &'a Roster,
    calendar: &'a ShiftCalendar,
    preferences: &'a PreferenceMatrix,
    rules: &'a RuleSet,
    weights: ObjectiveWeights,
}

impl<'a> ModelCompiler<'a> {
    /// Creates a compiler with default objective weights.
    pub fn new(
        roster: &'a Roster,
        calendar: &'a ShiftCalendar,
        preferences: &'a PreferenceMatrix,
        rules: &'a RuleSet,
    ) -> Self {
        Self {
            roster,
            calendar,
            preferences,
            rules,
            weights: ObjectiveWeights::default(),
        }
    }

    /// Sets the objective weights.
    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Compiles the model.
    ///
    /// Deterministic: the same inputs always yield the same variables,
    /// constraints (in the same order) and objective.
    ///
    /// # Errors
    /// [`ModelCompilationError`] when the rules are unsatisfiable on their
    /// face or the inputs disagree in shape.
    pub fn compile(&self) -> Result<CompiledModel, ModelCompilationError> {
        self.check_shape()?;
        self.check_bounds()?;
        self.check_weights()?;

        let loads = self.load_requirements();
        if self.rules.max_consecutive_shifts == 0 && loads.iter().any(|l| l.min() > 0) {
            return Err(ModelCompilationError::ZeroConsecutiveCap);
        }

        let shift_count = self.calendar.shift_count();
        let coverage: Vec<(u32, u32)> = (0..shift_count)
            .map(|s| self.rules.coverage_bounds(s))
            .collect();

        self.check_capacity(&coverage, &loads)?;
        self.check_eligibility(&loads)?;
        self.check_managers(&loads)?;

        let neutral_cost = self.weights.neutral_cost_for(shift_count);
        let expected_headcount = if shift_count == 0 {
            0.0
        } else {
            loads.iter().map(LoadRequirement::target).sum::<f64>() / shift_count as f64
        };

        let variables = self.variables();
        let constraints = self.constraints(&coverage, &loads);
        let mut model = CompiledModel {
            roster: self.roster.clone(),
            calendar: self.calendar.clone(),
            preferences: self.preferences.clone(),
            rules: self.rules.clone(),
            weights: self.weights.clone(),
            variables,
            constraints,
            objective: Expression::new(),
            neutral_cost,
            coverage,
            loads,
            expected_headcount,
        };
        model.objective = self.objective(&model);

        for kind in ConstraintKind::ALL {
            debug!(
                event = "constraint_family",
                kind = kind.key(),
                count = model.count_constraints(kind),
            );
        }
        info!(
            event = "model_compiled",
            employees = model.employee_count(),
            shifts = shift_count,
            variables = model.variables.len(),
            constraints = model.constraints.len(),
            objective_terms = model.objective.term_count(),
        );
        Ok(model)
    }

    fn check_shape(&self) -> Result<(), ModelCompilationError> {
        let expected_employees = self.roster.len();
        let expected_shifts = self.calendar.shift_count();
        if self.preferences.employee_count() != expected_employees
            || self.preferences.shift_count() != expected_shifts
        {
            return Err(ModelCompilationError::PreferenceShape {
                expected_employees,
                expected_shifts,
                actual_employees: self.preferences.employee_count(),
                actual_shifts: self.preferences.shift_count(),
            });
        }
        Ok(())
    }

    fn check_bounds(&self) -> Result<(), ModelCompilationError> {
        let r = self.rules;
        if r.min_shifts_per_employee > r.max_shifts_per_employee {
            return Err(ModelCompilationError::InvertedBounds {
                what: "shifts per employee",
                min: r.min_shifts_per_employee,
                max: r.max_shifts_per_employee,
            });
        }
        if r.min_employees_per_shift > r.max_employees_per_shift {
            return Err(ModelCompilationError::InvertedBounds {
                what: "employees per shift",
                min: r.min_employees_per_shift,
                max: r.max_employees_per_shift,
            });
        }
        if let Some(forecast) = &r.shift_forecast {
            let expected = self.calendar.shift_count();
            if forecast.len() != expected {
                return Err(ModelCompilationError::ForecastLength {
                    expected,
                    actual: forecast.len(),
                });
            }
        }
        Ok(())
    }

    fn check_weights(&self) -> Result<(), ModelCompilationError> {
        let w = &self.weights;
        let mut named = vec![
            ("distribution_weight", w.distribution_weight),
            ("load_weight", w.load_weight),
        ];
        if let Some(cost) = w.neutral_cost {
            named.push(("neutral_cost", cost));
        }
        match named.into_iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            Some((name, value)) => Err(ModelCompilationError::InvalidWeight { name, value }),
            None => Ok(()),
        }
    }

    fn load_requirements(&self) -> Vec<LoadRequirement> {
        self.roster
            .employees()
            .iter()
            .map(|e| match e.shift_pattern {
                Some(pattern) => LoadRequirement::Pattern {
                    days: (0..self.calendar.days)
                        .filter(|&d| pattern.works_on(self.calendar.weekday_of(d)))
                        .collect(),
                },
                None => LoadRequirement::Range {
                    min: self.rules.min_shifts_per_employee,
                    max: self.rules.max_shifts_per_employee,
                },
            })
            .collect()
    }

    fn check_capacity(
        &self,
        coverage: &[(u32, u32)],
        loads: &[LoadRequirement],
    ) -> Result<(), ModelCompilationError> {
        let employees = self.roster.len();
        for (s, &(min, _)) in coverage.iter().enumerate() {
            if min as usize > employees {
                return Err(ModelCompilationError::ShiftMinimumExceedsRoster {
                    shift: self
                        .calendar
                        .shift_at(s)
                        .map(|shift| self.calendar.label(shift))
                        .unwrap_or_default(),
                    min,
                    employees,
                });
            }
        }

        let days = self.calendar.days;
        let min_load: u64 = loads.iter().map(|l| u64::from(l.min())).sum();
        let max_load: u64 = loads.iter().map(|l| u64::from(l.max_within(days))).sum();
        let min_cov: u64 = coverage.iter().map(|&(min, _)| u64::from(min)).sum();
        let max_cov: u64 = coverage
            .iter()
            .map(|&(_, max)| (max as usize).min(employees) as u64)
            .sum();

        if max_cov < min_load {
            return Err(ModelCompilationError::CoverageBelowLoad {
                capacity: max_cov,
                required: min_load,
            });
        }
        if max_load < min_cov {
            return Err(ModelCompilationError::LoadBelowCoverage {
                capacity: max_load,
                required: min_cov,
            });
        }
        Ok(())
    }

    fn check_eligibility(&self, loads: &[LoadRequirement]) -> Result<(), ModelCompilationError> {
        let cap = self.rules.max_consecutive_shifts;
        for (e, load) in loads.iter().enumerate() {
            let employee = &self.roster.employees()[e];
            match load {
                LoadRequirement::Range { min, .. } => {
                    if *min == 0 {
                        continue;
                    }
                    let eligible = (0..self.calendar.days)
                        .filter(|&d| self.eligible_on(e, d))
                        .count() as u32;
                    if eligible < *min {
                        return Err(ModelCompilationError::InsufficientEligibility {
                            employee: employee.id.clone(),
                            eligible,
                            required: *min,
                        });
                    }
                }
                LoadRequirement::Pattern { days } => {
                    if let Some(&day) = days.iter().find(|&&d| !self.eligible_on(e, d)) {
                        return Err(ModelCompilationError::PatternConflict {
                            employee: employee.id.clone(),
                            day: self.calendar.label(Shift::on_day(day)),
                        });
                    }
                    let run = longest_run(days);
                    if run > cap {
                        return Err(ModelCompilationError::PatternExceedsConsecutiveCap {
                            employee: employee.id.clone(),
                            run,
                            cap,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Exactly one manager per shift means managers work exactly
    /// `shifts` shifts between them, at most one per day each.
    fn check_managers(&self, loads: &[LoadRequirement]) -> Result<(), ModelCompilationError> {
        let shifts = self.calendar.shift_count();
        if !self.rules.require_manager_per_shift || shifts == 0 {
            return Ok(());
        }
        let managers = self.roster.managers();
        if managers.is_empty() {
            return Err(ModelCompilationError::NoManagers);
        }

        let slots = self.calendar.slots_per_day;
        for day in 0..self.calendar.days {
            let mut fixed = 0u32;
            let mut available = 0u32;
            for &m in &managers {
                match &loads[m] {
                    LoadRequirement::Pattern { days } if days.contains(&day) => fixed += 1,
                    LoadRequirement::Pattern { .. } => {}
                    LoadRequirement::Range { .. } => {
                        if self.eligible_on(m, day) {
                            available += 1;
                        }
                    }
                }
            }
            let day_label = || self.calendar.day_label(day);
            if fixed > slots {
                return Err(ModelCompilationError::ManagerOverlap {
                    day: day_label(),
                    managers: fixed,
                    slots,
                });
            }
            if fixed + available < slots {
                return Err(ModelCompilationError::ManagerGap {
                    day: day_label(),
                    available: fixed + available,
                    slots,
                });
            }
        }

        let capacity: u64 = managers
            .iter()
            .map(|&m| u64::from(loads[m].max_within(self.calendar.days)))
            .sum();
        if capacity < shifts as u64 {
            return Err(ModelCompilationError::ManagerCapacity { capacity, shifts });
        }
        let required: u64 = managers.iter().map(|&m| u64::from(loads[m].min())).sum();
        if required > shifts as u64 {
            return Err(ModelCompilationError::ManagerMinimumExceedsShifts { required, shifts });
        }
        Ok(())
    }

    /// Whether the employee (and their trainer, for trainees) is available
    /// on some slot of `day`.
    fn eligible_on(&self, employee: usize, day: u32) -> bool {
        let trainer = self.roster.trainer_of(employee);
        self.day_shifts(day).any(|s| {
            self.preferences.is_available(employee, s)
                && trainer.map_or(true, |t| self.preferences.is_available(t, s))
        })
    }

    fn day_shifts(&self, day: u32) -> impl Iterator<Item = usize> {
        let slots = self.calendar.slots_per_day as usize;
        let first = day as usize * slots;
        first..first + slots
    }

    fn day_vars(&self, employee: usize, day: u32) -> Vec<VarId> {
        let shift_count = self.calendar.shift_count();
        self.day_shifts(day)
            .map(|s| VarId(employee * shift_count + s))
            .collect()
    }

    fn variables(&self) -> Vec<Variable> {
        let shift_count = self.calendar.shift_count();
        self.roster
            .employees()
            .iter()
            .enumerate()
            .flat_map(|(e, employee)| {
                (0..shift_count).map(move |s| Variable {
                    id: VarId(e * shift_count + s),
                    employee: e,
                    shift: s,
                    label: format!("{}_{}", employee.id, s + 1),
                })
            })
            .collect()
    }

    fn constraints(
        &self,
        coverage: &[(u32, u32)],
        loads: &[LoadRequirement],
    ) -> Vec<HardConstraint> {
        let shift_count = self.calendar.shift_count();
        let days = self.calendar.days;
        let slots = self.calendar.slots_per_day as usize;
        let employees = self.roster.employees();
        let var = |e: usize, s: usize| VarId(e * shift_count + s);
        let mut out = Vec::new();

        // Unavailable pairs
        for (e, emp) in employees.iter().enumerate() {
            for s in 0..shift_count {
                if !self.preferences.is_available(e, s) {
                    out.push(HardConstraint::new(
                        ConstraintLabel::new(ConstraintKind::Unavailable, Some(emp.id.as_str()), Some(s)),
                        Expression::sum([var(e, s)]),
                        Sense::Eq,
                        0.0,
                    ));
                }
            }
        }

        // Employee load
        for (e, emp) in employees.iter().enumerate() {
            match &loads[e] {
                LoadRequirement::Range { min, max } => {
                    let all = Expression::sum((0..shift_count).map(|s| var(e, s)));
                    out.push(HardConstraint::new(
                        ConstraintLabel::new(ConstraintKind::Overtime, Some(emp.id.as_str()), None),
                        all.clone(),
                        Sense::Le,
                        f64::from(*max),
                    ));
                    if *min > 0 {
                        out.push(HardConstraint::new(
                            ConstraintLabel::new(ConstraintKind::Insufficient, Some(emp.id.as_str()), None),
                            all,
                            Sense::Ge,
                            f64::from(*min),
                        ));
                    }
                }
                LoadRequirement::Pattern { days: worked } => {
                    for d in 0..days {
                        let rhs = if worked.contains(&d) { 1.0 } else { 0.0 };
                        out.push(HardConstraint::new(
                            ConstraintLabel::new(
                                ConstraintKind::Pattern,
                                Some(emp.id.as_str()),
                                Some(d as usize * slots),
                            ),
                            Expression::sum(self.day_vars(e, d)),
                            Sense::Eq,
                            rhs,
                        ));
                    }
                }
            }
        }

        // Coverage
        for (s, &(min, max)) in coverage.iter().enumerate() {
            let headcount = Expression::sum((0..employees.len()).map(|e| var(e, s)));
            if min > 0 {
                out.push(HardConstraint::new(
                    ConstraintLabel::new(ConstraintKind::Understaffed, None, Some(s)),
                    headcount.clone(),
                    Sense::Ge,
                    f64::from(min),
                ));
            }
            out.push(HardConstraint::new(
                ConstraintLabel::new(ConstraintKind::Overstaffed, None, Some(s)),
                headcount,
                Sense::Le,
                f64::from(max),
            ));
        }

        // Exactly one manager per shift
        if self.rules.require_manager_per_shift {
            let managers = self.roster.managers();
            for s in 0..shift_count {
                out.push(HardConstraint::new(
                    ConstraintLabel::new(ConstraintKind::Manager, None, Some(s)),
                    Expression::sum(managers.iter().map(|&m| var(m, s))),
                    Sense::Eq,
                    1.0,
                ));
            }
        }

        // At most one slot per day
        if slots > 1 {
            for (e, emp) in employees.iter().enumerate() {
                for d in 0..days {
                    out.push(HardConstraint::new(
                        ConstraintLabel::new(
                            ConstraintKind::DoubleBooking,
                            Some(emp.id.as_str()),
                            Some(d as usize * slots),
                        ),
                        Expression::sum(self.day_vars(e, d)),
                        Sense::Le,
                        1.0,
                    ));
                }
            }
        }

        // Trainee works only alongside the trainer
        for (t, trainer) in self.roster.trainee_pairs() {
            for s in 0..shift_count {
                let mut expr = Expression::new();
                expr.add_linear(var(t, s), 1.0);
                expr.add_linear(var(trainer, s), -1.0);
                out.push(HardConstraint::new(
                    ConstraintLabel::new(ConstraintKind::Trainee, Some(employees[t].id.as_str()), Some(s)),
                    expr,
                    Sense::Le,
                    0.0,
                ));
            }
        }

        // Consecutive cap over sliding windows of cap + 1 days
        let cap = self.rules.max_consecutive_shifts;
        if cap < days {
            for (e, emp) in employees.iter().enumerate() {
                for start in 0..=(days - cap - 1) {
                    let window = (start..=start + cap).flat_map(|d| self.day_vars(e, d));
                    out.push(HardConstraint::new(
                        ConstraintLabel::new(
                            ConstraintKind::Consecutive,
                            Some(emp.id.as_str()),
                            Some(start as usize * slots),
                        ),
                        Expression::sum(window),
                        Sense::Le,
                        f64::from(cap),
                    ));
                }
            }
        }

        // Isolated days off
        if !self.rules.allow_isolated_days_off && days >= 3 {
            for (e, emp) in employees.iter().enumerate() {
                for d in 1..days - 1 {
                    let (before, today, after) = (
                        self.day_vars(e, d - 1),
                        self.day_vars(e, d),
                        self.day_vars(e, d + 1),
                    );
                    let mut expr = Expression::new();
                    for &v in &today {
                        expr.add_linear(v, -3.0);
                    }
                    expr.add_product(&before, &today, 1.0);
                    expr.add_product(&today, &after, 1.0);
                    expr.add_product(&before, &after, 1.0);
                    out.push(HardConstraint::new(
                        ConstraintLabel::new(
                            ConstraintKind::Isolated,
                            Some(emp.id.as_str()),
                            Some(d as usize * slots),
                        ),
                        expr,
                        Sense::Le,
                        0.0,
                    ));
                }
            }
        }

        out
    }

    fn objective(&self, model: &CompiledModel) -> Expression {
        let employees = model.employee_count();
        let shift_count = model.shift_count();
        let mut objective = Expression::new();

        for e in 0..employees {
            for s in 0..shift_count {
                if let Some(cost) = model.cost(e, s) {
                    if cost != 0.0 {
                        objective.add_linear(model.var(e, s), cost);
                    }
                }
            }
        }

        let distribution = self.weights.distribution_weight;
        if distribution > 0.0 {
            for s in 0..shift_count {
                let vars: Vec<VarId> = (0..employees).map(|e| model.var(e, s)).collect();
                objective.extend(
                    Expression::squared_deviation(&vars, model.expected_headcount)
                        .scaled(distribution),
                );
            }
        }

        let balance = self.weights.load_weight;
        if balance > 0.0 {
            for (e, load) in model.loads.iter().enumerate() {
                let vars: Vec<VarId> = (0..shift_count).map(|s| model.var(e, s)).collect();
                objective.extend(Expression::squared_deviation(&vars, load.target()).scaled(balance));
            }
        }

        objective
    }
}

/// Longest run of consecutive values in an ascending day list.
fn longest_run(days: &[u32]) -> u32 {
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<u32> = None;
    for &d in days {
        run = match prev {
            Some(p) if p + 1 == d => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(d);
    }
    best
}
