//! Staffing rules and objective weights.
//!
//! A [`RuleSet`] is immutable for the duration of a run. Full-time
//! employees with a [`ShiftPattern`](super::ShiftPattern) ignore the
//! shifts-per-employee bounds and work exactly their pattern's days.

use serde::{Deserialize, Serialize};

/// Hard staffing rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// Minimum headcount per shift.
    pub min_employees_per_shift: u32,
    /// Maximum headcount per shift.
    pub max_employees_per_shift: u32,
    /// Minimum shifts worked per (non-pattern) employee.
    pub min_shifts_per_employee: u32,
    /// Maximum shifts worked per (non-pattern) employee.
    pub max_shifts_per_employee: u32,
    /// Maximum run of consecutive worked days.
    pub max_consecutive_shifts: u32,
    /// Whether a single day off between two worked days is allowed.
    pub allow_isolated_days_off: bool,
    /// Whether every shift needs exactly one manager.
    pub require_manager_per_shift: bool,
    /// Exact per-shift headcount, overriding the min/max headcount bounds.
    pub shift_forecast: Option<Vec<u32>>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            min_employees_per_shift: 1,
            max_employees_per_shift: 10,
            min_shifts_per_employee: 5,
            max_shifts_per_employee: 7,
            max_consecutive_shifts: 5,
            allow_isolated_days_off: false,
            require_manager_per_shift: true,
            shift_forecast: None,
        }
    }
}

impl RuleSet {
    /// Sets the headcount bounds per shift.
    pub fn with_shift_bounds(mut self, min: u32, max: u32) -> Self {
        self.min_employees_per_shift = min;
        self.max_employees_per_shift = max;
        self
    }

    /// Sets the shifts-per-employee bounds.
    pub fn with_load_bounds(mut self, min: u32, max: u32) -> Self {
        self.min_shifts_per_employee = min;
        self.max_shifts_per_employee = max;
        self
    }

    pub fn with_max_consecutive(mut self, max: u32) -> Self {
        self.max_consecutive_shifts = max;
        self
    }

    pub fn with_isolated_days_off(mut self, allow: bool) -> Self {
        self.allow_isolated_days_off = allow;
        self
    }

    pub fn with_manager_required(mut self, required: bool) -> Self {
        self.require_manager_per_shift = required;
        self
    }

    /// Sets an exact per-shift headcount forecast.
    pub fn with_forecast(mut self, forecast: Vec<u32>) -> Self {
        self.shift_forecast = Some(forecast);
        self
    }

    /// Headcount bounds `(min, max)` for the shift at dense index `shift`.
    pub fn coverage_bounds(&self, shift: usize) -> (u32, u32) {
        match self.shift_forecast.as_ref().and_then(|f| f.get(shift)) {
            Some(&demand) => (demand, demand),
            None => (self.min_employees_per_shift, self.max_employees_per_shift),
        }
    }

    /// Target load of a non-pattern employee: the midpoint of the bounds.
    pub fn target_load(&self) -> f64 {
        (f64::from(self.min_shifts_per_employee) + f64::from(self.max_shifts_per_employee)) / 2.0
    }
}

/// Weights of the soft objective terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveWeights {
    /// Weight of the per-shift headcount balancing term.
    pub distribution_weight: f64,
    /// Weight of the per-employee load balancing term.
    pub load_weight: f64,
    /// Cost of assigning a neutral pair. Defaults to the middle rank.
    pub neutral_cost: Option<f64>,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            distribution_weight: 1.0,
            load_weight: 1.0,
            neutral_cost: None,
        }
    }
}

impl ObjectiveWeights {
    pub fn with_distribution_weight(mut self, weight: f64) -> Self {
        self.distribution_weight = weight;
        self
    }

    pub fn with_load_weight(mut self, weight: f64) -> Self {
        self.load_weight = weight;
        self
    }

    pub fn with_neutral_cost(mut self, cost: f64) -> Self {
        self.neutral_cost = Some(cost);
        self
    }

    /// Neutral cost for a horizon of `shift_count` shifts.
    ///
    /// Without an explicit value this is the middle of the rank range
    /// `0..shift_count`.
    pub fn neutral_cost_for(&self, shift_count: usize) -> f64 {
        self.neutral_cost
            .unwrap_or(shift_count.saturating_sub(1) as f64 / 2.0)
    }
}
