//! Employee model.
//!
//! Employees are the schedulable workforce. Each has a role, an optional
//! trainer reference (trainees only) and an optional fixed full-time
//! shift pattern.
//!
//! The trainee → trainer relation is an identifier lookup resolved against
//! the owning [`Roster`](super::Roster); employees never hold references to
//! each other.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// An employee that can be assigned to shifts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique employee identifier.
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Employee role.
    pub role: Role,
    /// Trainer employee ID. Set iff `role == Role::Trainee`.
    #[serde(default)]
    pub trainer_id: Option<String>,
    /// Fixed weekly pattern for full-time employees.
    #[serde(default)]
    pub shift_pattern: Option<ShiftPattern>,
}

/// Employee role.
///
/// Determines coverage semantics: managers satisfy the manager-per-shift
/// policy, trainees must always work alongside their trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Shift manager.
    Manager,
    /// Regular staff.
    Regular,
    /// Trainee; never works a shift without their trainer.
    Trainee,
}

impl Role {
    /// Whether employees of this role may act as a trainer.
    #[inline]
    pub fn can_train(self) -> bool {
        !matches!(self, Role::Trainee)
    }

    /// Short tag used in generated employee IDs.
    pub fn tag(self) -> &'static str {
        match self {
            Role::Manager => "Mgr",
            Role::Regular => "Emp",
            Role::Trainee => "Tr",
        }
    }
}

/// A 5-on/2-off weekly template for full-time employees.
///
/// Each variant names the first and last day of the five-day working
/// block; the two days after it are always off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftPattern {
    MonToFri,
    TueToSat,
    WedToSun,
    ThuToMon,
    FriToTue,
    SatToWed,
    SunToThu,
}

impl ShiftPattern {
    /// All patterns, in the rotation order used when auto-assigning.
    pub const ALL: [ShiftPattern; 7] = [
        ShiftPattern::MonToFri,
        ShiftPattern::TueToSat,
        ShiftPattern::WedToSun,
        ShiftPattern::ThuToMon,
        ShiftPattern::FriToTue,
        ShiftPattern::SatToWed,
        ShiftPattern::SunToThu,
    ];

    /// Length of the working block.
    pub const WORK_DAYS: u32 = 5;

    /// Length of the rest block.
    pub const REST_DAYS: u32 = 2;

    /// First day of the working block.
    pub fn first_day(self) -> Weekday {
        match self {
            ShiftPattern::MonToFri => Weekday::Mon,
            ShiftPattern::TueToSat => Weekday::Tue,
            ShiftPattern::WedToSun => Weekday::Wed,
            ShiftPattern::ThuToMon => Weekday::Thu,
            ShiftPattern::FriToTue => Weekday::Fri,
            ShiftPattern::SatToWed => Weekday::Sat,
            ShiftPattern::SunToThu => Weekday::Sun,
        }
    }

    /// Whether the pattern works on the given weekday.
    pub fn works_on(self, weekday: Weekday) -> bool {
        let first = self.first_day().num_days_from_monday();
        let offset = (7 + weekday.num_days_from_monday() - first) % 7;
        offset < Self::WORK_DAYS
    }

    /// Pattern at position `index` of the rotation (wraps around).
    pub fn rotation(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }
}

impl Employee {
    /// Creates a new employee without trainer or pattern.
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            role,
            trainer_id: None,
            shift_pattern: None,
        }
    }

    /// Creates a manager.
    pub fn manager(id: impl Into<String>) -> Self {
        Self::new(id, Role::Manager)
    }

    /// Creates a regular employee.
    pub fn regular(id: impl Into<String>) -> Self {
        Self::new(id, Role::Regular)
    }

    /// Creates a trainee paired with `trainer_id`.
    pub fn trainee(id: impl Into<String>, trainer_id: impl Into<String>) -> Self {
        Self {
            trainer_id: Some(trainer_id.into()),
            ..Self::new(id, Role::Trainee)
        }
    }

    /// Sets the employee name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the full-time shift pattern.
    pub fn with_pattern(mut self, pattern: ShiftPattern) -> Self {
        self.shift_pattern = Some(pattern);
        self
    }

    #[inline]
    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }

    #[inline]
    pub fn is_trainee(&self) -> bool {
        self.role == Role::Trainee
    }

    /// Whether the employee works a fixed full-time pattern.
    #[inline]
    pub fn is_full_time(&self) -> bool {
        self.shift_pattern.is_some()
    }

    /// Display name, falling back to the ID.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employee_builders() {
        let m = Employee::manager("A-Mgr").with_name("Alice");
        assert!(m.is_manager());
        assert_eq!(m.display_name(), "Alice");
        assert!(m.trainer_id.is_none());

        let t = Employee::trainee("E-Tr", "E");
        assert!(t.is_trainee());
        assert_eq!(t.trainer_id.as_deref(), Some("E"));
        assert_eq!(t.display_name(), "E-Tr");

        let ft = Employee::regular("F").with_pattern(ShiftPattern::MonToFri);
        assert!(ft.is_full_time());
    }

    #[test]
    fn test_role_can_train() {
        assert!(Role::Manager.can_train());
        assert!(Role::Regular.can_train());
        assert!(!Role::Trainee.can_train());
    }

    #[test]
    fn test_pattern_works_five_days() {
        for pattern in ShiftPattern::ALL {
            let days = [
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
                Weekday::Sun,
            ];
            let worked = days.iter().filter(|d| pattern.works_on(**d)).count();
            assert_eq!(worked, 5, "{pattern:?}");
            assert!(pattern.works_on(pattern.first_day()));
        }
    }

    #[test]
    fn test_pattern_wraps_week() {
        let p = ShiftPattern::ThuToMon;
        assert!(p.works_on(Weekday::Sun));
        assert!(p.works_on(Weekday::Mon));
        assert!(!p.works_on(Weekday::Tue));
        assert!(!p.works_on(Weekday::Wed));
    }

    #[test]
    fn test_pattern_rotation() {
        assert_eq!(ShiftPattern::rotation(0), ShiftPattern::MonToFri);
        assert_eq!(ShiftPattern::rotation(7), ShiftPattern::MonToFri);
        assert_eq!(ShiftPattern::rotation(8), ShiftPattern::TueToSat);
    }
}
