//! Candidate assignments.
//!
//! An [`Assignment`] maps every (employee, shift) decision variable to a
//! boolean. Storage is row-major (`employee * shift_count + shift`), the
//! same layout as compiled variable IDs, so a dense solver sample converts
//! without reindexing.

use serde::{Deserialize, Serialize};

/// A concrete value for every decision variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    employee_count: usize,
    shift_count: usize,
    values: Vec<bool>,
}

impl Assignment {
    /// Creates an all-false assignment.
    pub fn new(employee_count: usize, shift_count: usize) -> Self {
        Self {
            employee_count,
            shift_count,
            values: vec![false; employee_count * shift_count],
        }
    }

    /// Creates an assignment from row-major values.
    ///
    /// Returns `None` when `values` does not have `employee_count *
    /// shift_count` entries.
    pub fn from_values(employee_count: usize, shift_count: usize, values: Vec<bool>) -> Option<Self> {
        (values.len() == employee_count * shift_count).then_some(Self {
            employee_count,
            shift_count,
            values,
        })
    }

    /// Builder form: assigns `employee` to `shift`.
    pub fn with(mut self, employee: usize, shift: usize) -> Self {
        self.set(employee, shift, true);
        self
    }

    /// Sets one variable (ignored when out of range).
    pub fn set(&mut self, employee: usize, shift: usize, value: bool) {
        if employee < self.employee_count && shift < self.shift_count {
            self.values[employee * self.shift_count + shift] = value;
        }
    }

    /// Whether `employee` works `shift`. Out-of-range pairs are unassigned.
    #[inline]
    pub fn is_assigned(&self, employee: usize, shift: usize) -> bool {
        employee < self.employee_count
            && shift < self.shift_count
            && self.values[employee * self.shift_count + shift]
    }

    #[inline]
    pub fn employee_count(&self) -> usize {
        self.employee_count
    }

    #[inline]
    pub fn shift_count(&self) -> usize {
        self.shift_count
    }

    /// Number of employees assigned to a shift.
    pub fn headcount(&self, shift: usize) -> usize {
        (0..self.employee_count)
            .filter(|&e| self.is_assigned(e, shift))
            .count()
    }

    /// Number of shifts assigned to an employee.
    pub fn load(&self, employee: usize) -> usize {
        (0..self.shift_count)
            .filter(|&s| self.is_assigned(employee, s))
            .count()
    }

    /// All assigned `(employee, shift)` pairs in row-major order.
    pub fn assigned_pairs(&self) -> Vec<(usize, usize)> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v)
            .map(|(i, _)| (i / self.shift_count, i % self.shift_count))
            .collect()
    }

    /// Total number of assigned pairs.
    pub fn assigned_count(&self) -> usize {
        self.values.iter().filter(|&&v| v).count()
    }

    /// Row-major variable values.
    #[inline]
    pub fn values(&self) -> &[bool] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let a = Assignment::new(3, 4).with(0, 1).with(2, 1).with(2, 3);
        assert_eq!(a.headcount(1), 2);
        assert_eq!(a.headcount(0), 0);
        assert_eq!(a.load(2), 2);
        assert_eq!(a.assigned_count(), 3);
        assert_eq!(a.assigned_pairs(), vec![(0, 1), (2, 1), (2, 3)]);
    }

    #[test]
    fn test_out_of_range() {
        let mut a = Assignment::new(2, 2);
        a.set(5, 0, true);
        assert!(!a.is_assigned(5, 0));
        assert!(!a.is_assigned(0, 9));
        assert_eq!(a.assigned_count(), 0);
    }

    #[test]
    fn test_from_values() {
        let a = Assignment::from_values(2, 2, vec![true, false, false, true]).unwrap();
        assert!(a.is_assigned(0, 0));
        assert!(a.is_assigned(1, 1));
        assert!(!a.is_assigned(1, 0));
        assert!(Assignment::from_values(2, 2, vec![true]).is_none());
    }
}
