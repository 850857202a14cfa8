//! Input validation for rosters.
//!
//! Checks structural integrity of an explicitly supplied employee list
//! before any model is built. Detects:
//! - Empty rosters
//! - Duplicate IDs
//! - Trainees without a trainer, and non-trainees carrying one
//! - Trainer references to unknown employees or to other trainees
//! - Trainers shared by several trainees
//!
//! All problems are collected, not just the first one.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::Employee;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// The roster has no employees.
    EmptyRoster,
    /// Two employees share the same ID.
    DuplicateId,
    /// A trainee has no trainer.
    MissingTrainer,
    /// A manager or regular employee has a trainer.
    UnexpectedTrainer,
    /// A trainer reference points to no employee.
    InvalidTrainerReference,
    /// A trainer reference points to another trainee.
    InvalidTrainerRole,
    /// Several trainees share one trainer.
    SharedTrainer,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates an employee list.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_roster(employees: &[Employee]) -> ValidationResult {
    let mut errors = Vec::new();

    if employees.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyRoster,
            "Roster has no employees",
        ));
    }

    let mut by_id: HashMap<&str, &Employee> = HashMap::new();
    for e in employees {
        if by_id.insert(e.id.as_str(), e).is_some() {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate employee ID: {}", e.id),
            ));
        }
    }

    let mut used_trainers: HashSet<&str> = HashSet::new();
    for e in employees {
        match (e.is_trainee(), e.trainer_id.as_deref()) {
            (true, None) => errors.push(ValidationError::new(
                ValidationErrorKind::MissingTrainer,
                format!("Trainee '{}' has no trainer", e.id),
            )),
            (false, Some(trainer)) => errors.push(ValidationError::new(
                ValidationErrorKind::UnexpectedTrainer,
                format!("Employee '{}' is not a trainee but has trainer '{trainer}'", e.id),
            )),
            (true, Some(trainer)) => match by_id.get(trainer) {
                None => errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidTrainerReference,
                    format!("Trainee '{}' references unknown trainer '{trainer}'", e.id),
                )),
                Some(t) if !t.role.can_train() => errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidTrainerRole,
                    format!("Trainee '{}' references trainee '{trainer}' as trainer", e.id),
                )),
                Some(_) => {
                    if !used_trainers.insert(trainer) {
                        errors.push(ValidationError::new(
                            ValidationErrorKind::SharedTrainer,
                            format!("Trainer '{trainer}' is assigned to more than one trainee"),
                        ));
                    }
                }
            },
            (false, None) => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_employees() -> Vec<Employee> {
        vec![
            Employee::manager("A-Mgr"),
            Employee::manager("B-Mgr"),
            Employee::regular("C"),
            Employee::regular("E"),
            Employee::trainee("E-Tr", "E"),
        ]
    }

    #[test]
    fn test_valid_roster() {
        assert!(validate_roster(&sample_employees()).is_ok());
    }

    #[test]
    fn test_empty_roster() {
        let errors = validate_roster(&[]).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::EmptyRoster);
    }

    #[test]
    fn test_duplicate_id() {
        let mut employees = sample_employees();
        employees.push(Employee::regular("C"));
        let errors = validate_roster(&employees).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("C")));
    }

    #[test]
    fn test_missing_trainer() {
        let mut t = Employee::trainee("T", "x");
        t.trainer_id = None;
        let errors = validate_roster(&[Employee::regular("R"), t]).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::MissingTrainer));
    }

    #[test]
    fn test_unexpected_trainer() {
        let mut r = Employee::regular("R");
        r.trainer_id = Some("M".into());
        let errors = validate_roster(&[Employee::manager("M"), r]).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnexpectedTrainer));
    }

    #[test]
    fn test_unknown_trainer() {
        let employees = vec![Employee::regular("R"), Employee::trainee("T", "NOBODY")];
        let errors = validate_roster(&employees).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidTrainerReference));
    }

    #[test]
    fn test_trainee_cannot_train() {
        let employees = vec![
            Employee::regular("R"),
            Employee::trainee("T1", "R"),
            Employee::trainee("T2", "T1"),
        ];
        let errors = validate_roster(&employees).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidTrainerRole));
    }

    #[test]
    fn test_shared_trainer() {
        let employees = vec![
            Employee::regular("R"),
            Employee::trainee("T1", "R"),
            Employee::trainee("T2", "R"),
        ];
        let errors = validate_roster(&employees).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::SharedTrainer));
    }

    #[test]
    fn test_multiple_errors() {
        let employees = vec![
            Employee::regular("R"),
            Employee::regular("R"),
            Employee::trainee("T", "NOBODY"),
        ];
        let errors = validate_roster(&employees).unwrap_err();
        assert!(errors.len() >= 2);
    }
}
