//! Preference and availability matrix.
//!
//! Every (employee, shift) pair holds exactly one [`Preference`]: a rank
//! (0 = most preferred), a hard unavailability, or neutral. Unavailability
//! always wins: an unavailable pair is never assignable, whatever rank it
//! might otherwise have had.
//!
//! # Random generation
//! [`PreferenceGenerator`] draws from an injected RNG. For each employee it
//! first marks shifts unavailable with a fixed probability, then ranks the
//! remaining candidate shifts with a random permutation of `0..N`, so no
//! two candidate shifts of one employee share a rank.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Roster, Shift, ShiftCalendar};
use crate::error::ConfigError;

/// Preference state of one (employee, shift) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    /// Ranked preference, 0 = most preferred.
    Ranked(u32),
    /// Hard-excluded from the employee's domain.
    Unavailable,
    /// Available without a stated preference.
    #[default]
    Neutral,
}

impl Preference {
    /// Decodes the 0/1/2 availability encoding:
    /// 0 = unavailable, 1 = available, 2 = requested (rank 0).
    pub fn from_availability_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Preference::Unavailable),
            1 => Some(Preference::Neutral),
            2 => Some(Preference::Ranked(0)),
            _ => None,
        }
    }

    /// Whether the pair may be assigned.
    #[inline]
    pub fn is_available(self) -> bool {
        self != Preference::Unavailable
    }

    /// The rank, if ranked.
    pub fn rank(self) -> Option<u32> {
        match self {
            Preference::Ranked(r) => Some(r),
            _ => None,
        }
    }
}

/// Employee × shift preference matrix.
///
/// Rows follow roster order, columns follow the calendar's dense shift
/// index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceMatrix {
    employee_ids: Vec<String>,
    slots_per_day: u32,
    shift_count: usize,
    entries: Vec<Preference>,
}

impl PreferenceMatrix {
    /// Creates an all-neutral matrix shaped for `roster` × `calendar`.
    pub fn new(roster: &Roster, calendar: &ShiftCalendar) -> Self {
        let shift_count = calendar.shift_count();
        Self {
            employee_ids: roster.employees().iter().map(|e| e.id.clone()).collect(),
            slots_per_day: calendar.slots_per_day,
            shift_count,
            entries: vec![Preference::Neutral; roster.len() * shift_count],
        }
    }

    /// Builds a matrix from per-employee 0/1/2 availability codes.
    ///
    /// Employees missing from `codes` stay neutral.
    ///
    /// # Errors
    /// `ConfigError::Invalid` for unknown employees, wrong list lengths or
    /// codes outside 0..=2.
    pub fn from_availability_codes(
        roster: &Roster,
        calendar: &ShiftCalendar,
        codes: &HashMap<String, Vec<u8>>,
    ) -> Result<Self, ConfigError> {
        let mut matrix = Self::new(roster, calendar);
        for (id, row) in codes {
            let e = roster
                .index_of(id)
                .ok_or_else(|| ConfigError::Invalid(format!("unknown employee '{id}'")))?;
            if row.len() != matrix.shift_count {
                return Err(ConfigError::Invalid(format!(
                    "availability for '{id}' has {} entries, expected {}",
                    row.len(),
                    matrix.shift_count
                )));
            }
            for (s, &code) in row.iter().enumerate() {
                let pref = Preference::from_availability_code(code).ok_or_else(|| {
                    ConfigError::Invalid(format!("availability code {code} for '{id}'"))
                })?;
                matrix.set(e, s, pref);
            }
        }
        Ok(matrix)
    }

    /// Sets the preference of a pair (ignored when out of range).
    pub fn set(&mut self, employee: usize, shift: usize, preference: Preference) {
        if let Some(slot) = self.offset(employee, shift) {
            self.entries[slot] = preference;
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with_entry(mut self, employee: usize, shift: usize, preference: Preference) -> Self {
        self.set(employee, shift, preference);
        self
    }

    /// Preference by roster position and dense shift index.
    ///
    /// Out-of-range pairs read as `Unavailable`.
    pub fn get(&self, employee: usize, shift: usize) -> Preference {
        self.offset(employee, shift)
            .map(|i| self.entries[i])
            .unwrap_or(Preference::Unavailable)
    }

    /// Preference by employee ID and shift. `None` for unknown pairs.
    pub fn preference(&self, employee_id: &str, shift: Shift) -> Option<Preference> {
        let e = self.employee_ids.iter().position(|id| id == employee_id)?;
        if shift.slot >= self.slots_per_day {
            return None;
        }
        let s = (shift.day * self.slots_per_day + shift.slot) as usize;
        self.offset(e, s).map(|i| self.entries[i])
    }

    #[inline]
    pub fn is_available(&self, employee: usize, shift: usize) -> bool {
        self.get(employee, shift).is_available()
    }

    /// Number of employee rows.
    #[inline]
    pub fn employee_count(&self) -> usize {
        self.employee_ids.len()
    }

    /// Number of shift columns.
    #[inline]
    pub fn shift_count(&self) -> usize {
        self.shift_count
    }

    /// Shift indices the employee may be assigned to.
    pub fn candidate_shifts(&self, employee: usize) -> Vec<usize> {
        (0..self.shift_count)
            .filter(|&s| self.is_available(employee, s))
            .collect()
    }

    /// Ranks used by an employee, in shift order.
    pub fn ranks(&self, employee: usize) -> Vec<u32> {
        (0..self.shift_count)
            .filter_map(|s| self.get(employee, s).rank())
            .collect()
    }

    fn offset(&self, employee: usize, shift: usize) -> Option<usize> {
        (employee < self.employee_ids.len() && shift < self.shift_count)
            .then(|| employee * self.shift_count + shift)
    }
}

/// Seeded random preference generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceGenerator {
    /// Probability that a shift is marked unavailable (0.0..=1.0).
    pub unavailable_probability: f64,
}

impl Default for PreferenceGenerator {
    fn default() -> Self {
        Self {
            unavailable_probability: 0.1,
        }
    }
}

impl PreferenceGenerator {
    pub fn new(unavailable_probability: f64) -> Self {
        Self {
            unavailable_probability,
        }
    }

    /// Generates a matrix for `roster` × `calendar`.
    ///
    /// Trainees and full-time employees never receive random
    /// unavailability: trainees follow their trainer, and full-time
    /// patterns are fixed.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        roster: &Roster,
        calendar: &ShiftCalendar,
        rng: &mut R,
    ) -> PreferenceMatrix {
        let p = if self.unavailable_probability.is_finite() {
            self.unavailable_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let mut matrix = PreferenceMatrix::new(roster, calendar);
        let shift_count = calendar.shift_count();

        for (e, employee) in roster.employees().iter().enumerate() {
            let exempt = employee.is_trainee() || employee.is_full_time();
            let mut candidates = Vec::with_capacity(shift_count);
            for s in 0..shift_count {
                if !exempt && rng.random_bool(p) {
                    matrix.set(e, s, Preference::Unavailable);
                } else {
                    candidates.push(s);
                }
            }

            let mut ranks: Vec<u32> = (0..candidates.len() as u32).collect();
            ranks.shuffle(rng);
            for (s, rank) in candidates.into_iter().zip(ranks) {
                matrix.set(e, s, Preference::Ranked(rank));
            }
        }
        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, RosterSpec};
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn calendar(days: u32) -> ShiftCalendar {
        ShiftCalendar::new(NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(), days)
    }

    fn small_roster() -> Roster {
        Roster::from_employees(vec![
            Employee::manager("A-Mgr"),
            Employee::regular("E"),
            Employee::trainee("E-Tr", "E"),
        ])
        .unwrap()
    }

    #[test]
    fn test_availability_codes() {
        assert_eq!(Preference::from_availability_code(0), Some(Preference::Unavailable));
        assert_eq!(Preference::from_availability_code(1), Some(Preference::Neutral));
        assert_eq!(Preference::from_availability_code(2), Some(Preference::Ranked(0)));
        assert_eq!(Preference::from_availability_code(3), None);
    }

    #[test]
    fn test_new_matrix_is_neutral() {
        let m = PreferenceMatrix::new(&small_roster(), &calendar(3));
        assert_eq!(m.employee_count(), 3);
        assert_eq!(m.shift_count(), 3);
        assert!((0..3).all(|e| (0..3).all(|s| m.get(e, s) == Preference::Neutral)));
        assert_eq!(m.get(5, 0), Preference::Unavailable);
    }

    #[test]
    fn test_lookup_by_id() {
        let m = PreferenceMatrix::new(&small_roster(), &calendar(3))
            .with_entry(1, 2, Preference::Ranked(4))
            .with_entry(0, 0, Preference::Unavailable);
        assert_eq!(m.preference("E", Shift::on_day(2)), Some(Preference::Ranked(4)));
        assert_eq!(m.preference("A-Mgr", Shift::on_day(0)), Some(Preference::Unavailable));
        assert_eq!(m.preference("nobody", Shift::on_day(0)), None);
        assert_eq!(m.preference("E", Shift::on_day(9)), None);
        assert_eq!(m.preference("E", Shift::new(0, 1)), None);
        assert_eq!(m.candidate_shifts(0), vec![1, 2]);
    }

    #[test]
    fn test_from_availability_codes() {
        let roster = small_roster();
        let mut codes = HashMap::new();
        codes.insert("E".to_string(), vec![0, 1, 2]);
        let m = PreferenceMatrix::from_availability_codes(&roster, &calendar(3), &codes).unwrap();
        assert_eq!(m.get(1, 0), Preference::Unavailable);
        assert_eq!(m.get(1, 1), Preference::Neutral);
        assert_eq!(m.get(1, 2), Preference::Ranked(0));
        assert_eq!(m.get(0, 0), Preference::Neutral);

        codes.insert("E".to_string(), vec![0, 1]);
        assert!(PreferenceMatrix::from_availability_codes(&roster, &calendar(3), &codes).is_err());

        let mut bad = HashMap::new();
        bad.insert("X".to_string(), vec![1, 1, 1]);
        assert!(PreferenceMatrix::from_availability_codes(&roster, &calendar(3), &bad).is_err());

        let mut bad_code = HashMap::new();
        bad_code.insert("E".to_string(), vec![1, 7, 1]);
        assert!(
            PreferenceMatrix::from_availability_codes(&roster, &calendar(3), &bad_code).is_err()
        );
    }

    #[test]
    fn test_generated_ranks_are_permutations() {
        let roster = Roster::generate(&RosterSpec::new(12, 2, 1)).unwrap();
        let cal = calendar(14);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let m = PreferenceGenerator::new(0.25).generate(&roster, &cal, &mut rng);

        for e in 0..roster.len() {
            let candidates = m.candidate_shifts(e);
            let mut ranks = m.ranks(e);
            assert_eq!(ranks.len(), candidates.len());
            ranks.sort_unstable();
            let expected: Vec<u32> = (0..candidates.len() as u32).collect();
            assert_eq!(ranks, expected, "employee {e}");
        }
    }

    #[test]
    fn test_generation_is_seeded() {
        let roster = Roster::generate(&RosterSpec::new(8, 2, 1)).unwrap();
        let cal = calendar(14);
        let gen = PreferenceGenerator::default();
        let a = gen.generate(&roster, &cal, &mut ChaCha8Rng::seed_from_u64(42));
        let b = gen.generate(&roster, &cal, &mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_exempt_employees_always_available() {
        let roster = Roster::generate(&RosterSpec::new(6, 2, 1).with_full_time(2)).unwrap();
        let cal = calendar(14);
        let m = PreferenceGenerator::new(1.0).generate(&roster, &cal, &mut ChaCha8Rng::seed_from_u64(1));

        // Full-time regulars and the trainee keep every shift.
        for id in ["Emp1", "Emp2", "Tr1"] {
            let e = roster.index_of(id).unwrap();
            assert_eq!(m.candidate_shifts(e).len(), 14, "{id}");
        }
        // Part-time regulars lose everything at p = 1.
        let e = roster.index_of("Emp3").unwrap();
        assert!(m.candidate_shifts(e).is_empty());
        assert!(m.ranks(e).is_empty());
    }
}
