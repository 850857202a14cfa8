//! Roster model.
//!
//! A roster is the immutable, validated set of employees for one run.
//! It is either generated from role counts ([`RosterSpec`]) or built from
//! an explicit employee list.
//!
//! # Generated layout
//! Managers first (`Mgr1..`), then regular staff (`Emp1..`), then trainees
//! (`Tr1..`). `full_time` non-trainees receive 5-on/2-off patterns in
//! [`ShiftPattern::ALL`] rotation order: regulars first, managers only once
//! every regular has a pattern.
//!
//! # Trainer pairing
//! Explicit pairings are applied first. Remaining trainees, in roster
//! order, take the first unused trainer from: part-time regulars, full-time
//! regulars, managers (each group in roster order).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Employee, Role, ShiftPattern};
use crate::error::RosterConfigurationError;
use crate::validation::validate_roster;

/// Role counts from which a roster is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterSpec {
    /// Total employees, trainees included.
    pub total: u32,
    /// Number of managers.
    pub managers: u32,
    /// Number of trainees.
    pub trainees: u32,
    /// Number of non-trainees working a fixed full-time pattern.
    pub full_time: u32,
    /// Explicit trainee → trainer pairings by generated ID.
    pub pairings: Vec<TrainerPairing>,
}

/// An explicit trainee → trainer pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerPairing {
    pub trainee: String,
    pub trainer: String,
}

impl Default for RosterSpec {
    fn default() -> Self {
        Self {
            total: 12,
            managers: 2,
            trainees: 1,
            full_time: 0,
            pairings: Vec::new(),
        }
    }
}

impl RosterSpec {
    /// Creates a spec with the given counts and no full-time employees.
    pub fn new(total: u32, managers: u32, trainees: u32) -> Self {
        Self {
            total,
            managers,
            trainees,
            full_time: 0,
            pairings: Vec::new(),
        }
    }

    /// Sets the number of full-time employees.
    pub fn with_full_time(mut self, full_time: u32) -> Self {
        self.full_time = full_time;
        self
    }

    /// Adds an explicit pairing.
    pub fn with_pairing(mut self, trainee: impl Into<String>, trainer: impl Into<String>) -> Self {
        self.pairings.push(TrainerPairing {
            trainee: trainee.into(),
            trainer: trainer.into(),
        });
        self
    }
}

/// The validated employee set of one scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Employee>", into = "Vec<Employee>")]
pub struct Roster {
    employees: Vec<Employee>,
    index: HashMap<String, usize>,
}

impl Roster {
    /// Builds a roster from an explicit employee list.
    ///
    /// # Errors
    /// `RosterConfigurationError::InvalidRoster` with every integrity
    /// problem found by [`validate_roster`].
    pub fn from_employees(employees: Vec<Employee>) -> Result<Self, RosterConfigurationError> {
        validate_roster(&employees).map_err(RosterConfigurationError::InvalidRoster)?;
        let index = employees
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        Ok(Self { employees, index })
    }

    /// Generates a roster from role counts.
    pub fn generate(spec: &RosterSpec) -> Result<Self, RosterConfigurationError> {
        let required = spec.managers.checked_add(spec.trainees);
        if required.map_or(true, |r| spec.total < r) || spec.total == 0 {
            return Err(RosterConfigurationError::InsufficientEmployees {
                total: spec.total,
                managers: spec.managers,
                trainees: spec.trainees,
                required: required.unwrap_or(u32::MAX).max(1),
            });
        }

        let non_trainees = spec.total - spec.trainees;
        if spec.trainees > non_trainees {
            return Err(RosterConfigurationError::EmptyTrainerPool {
                trainees: spec.trainees,
                available: non_trainees,
            });
        }
        if spec.full_time > non_trainees {
            return Err(RosterConfigurationError::TooManyFullTime {
                full_time: spec.full_time,
                available: non_trainees,
            });
        }

        let regulars = non_trainees.saturating_sub(spec.managers);
        let mut employees: Vec<Employee> = Vec::new();
        employees.extend((1..=spec.managers).map(|n| Employee::manager(generated_id(Role::Manager, n))));
        employees.extend((1..=regulars).map(|n| Employee::regular(generated_id(Role::Regular, n))));

        // Regulars take patterns before managers.
        let managers = spec.managers as usize;
        let pattern_order = (managers..employees.len()).chain(0..managers);
        for (i, e) in pattern_order.take(spec.full_time as usize).enumerate() {
            employees[e].shift_pattern = Some(ShiftPattern::rotation(i));
        }

        let trainee_ids: Vec<String> = (1..=spec.trainees)
            .map(|n| generated_id(Role::Trainee, n))
            .collect();
        let trainers = pair_trainers(&employees, &trainee_ids, &spec.pairings)?;
        employees.extend(
            trainee_ids
                .into_iter()
                .zip(trainers)
                .map(|(id, trainer)| Employee::trainee(id, trainer)),
        );

        let roster = Self::from_employees(employees)?;
        info!(
            event = "roster_built",
            employees = roster.len(),
            managers = spec.managers,
            trainees = spec.trainees,
            full_time = spec.full_time,
        );
        Ok(roster)
    }

    /// All employees in roster order.
    #[inline]
    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.employees.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    /// Employee at roster position `index`.
    pub fn employee(&self, index: usize) -> Option<&Employee> {
        self.employees.get(index)
    }

    /// Finds an employee by ID.
    pub fn get(&self, id: &str) -> Option<&Employee> {
        self.index_of(id).map(|i| &self.employees[i])
    }

    /// Roster position of an employee ID.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Roster position of the trainer of the employee at `index`.
    pub fn trainer_of(&self, index: usize) -> Option<usize> {
        self.employees
            .get(index)?
            .trainer_id
            .as_deref()
            .and_then(|id| self.index_of(id))
    }

    /// Roster positions of all managers.
    pub fn managers(&self) -> Vec<usize> {
        self.positions(|e| e.is_manager())
    }

    /// `(trainee, trainer)` roster positions for every trainee.
    pub fn trainee_pairs(&self) -> Vec<(usize, usize)> {
        self.positions(|e| e.is_trainee())
            .into_iter()
            .filter_map(|t| self.trainer_of(t).map(|tr| (t, tr)))
            .collect()
    }

    /// Number of employees with the given role.
    pub fn count_role(&self, role: Role) -> usize {
        self.employees.iter().filter(|e| e.role == role).count()
    }

    fn positions(&self, pred: impl Fn(&Employee) -> bool) -> Vec<usize> {
        self.employees
            .iter()
            .enumerate()
            .filter(|(_, e)| pred(e))
            .map(|(i, _)| i)
            .collect()
    }
}

impl TryFrom<Vec<Employee>> for Roster {
    type Error = RosterConfigurationError;

    fn try_from(employees: Vec<Employee>) -> Result<Self, Self::Error> {
        Self::from_employees(employees)
    }
}

impl From<Roster> for Vec<Employee> {
    fn from(roster: Roster) -> Self {
        roster.employees
    }
}

fn generated_id(role: Role, n: u32) -> String {
    format!("{}{n}", role.tag())
}

/// Resolves one trainer ID per trainee, in trainee order.
fn pair_trainers(
    staff: &[Employee],
    trainee_ids: &[String],
    pairings: &[TrainerPairing],
) -> Result<Vec<String>, RosterConfigurationError> {
    let mut assigned: HashMap<&str, &str> = HashMap::new();
    let mut used: HashSet<&str> = HashSet::new();

    for p in pairings {
        let invalid = |reason: &str| RosterConfigurationError::InvalidPairing {
            trainee: p.trainee.clone(),
            trainer: p.trainer.clone(),
            reason: reason.to_string(),
        };
        if !trainee_ids.iter().any(|t| *t == p.trainee) {
            return Err(invalid("unknown trainee"));
        }
        if !staff.iter().any(|e| e.id == p.trainer) {
            return Err(invalid("unknown trainer"));
        }
        if assigned.contains_key(p.trainee.as_str()) {
            return Err(invalid("trainee paired twice"));
        }
        if !used.insert(p.trainer.as_str()) {
            return Err(invalid("trainer already paired"));
        }
        assigned.insert(p.trainee.as_str(), p.trainer.as_str());
    }

    let pool: Vec<&str> = staff
        .iter()
        .filter(|e| e.role == Role::Regular && !e.is_full_time())
        .chain(staff.iter().filter(|e| e.role == Role::Regular && e.is_full_time()))
        .chain(staff.iter().filter(|e| e.is_manager()))
        .map(|e| e.id.as_str())
        .collect();

    let mut trainers = Vec::with_capacity(trainee_ids.len());
    for trainee in trainee_ids {
        if let Some(trainer) = assigned.get(trainee.as_str()) {
            trainers.push((*trainer).to_string());
            continue;
        }
        let trainer = pool
            .iter()
            .find(|id| !used.contains(**id))
            .copied()
            .ok_or(RosterConfigurationError::EmptyTrainerPool {
                trainees: trainee_ids.len() as u32,
                available: pool.len() as u32,
            })?;
        used.insert(trainer);
        trainers.push(trainer.to_string());
    }
    Ok(trainers)
}
