//! Shift calendar model.
//!
//! The planning horizon is a contiguous run of calendar days, each split
//! into a fixed number of shift slots. Shifts are identified by
//! `(day, slot)` and totally ordered by day, then slot.
//!
//! # Determinism
//! Nothing in this module reads the clock. Callers inject "today" when a
//! horizon has to be derived from the current date.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// A schedulable (day, slot) unit.
///
/// `day` is the 0-based offset from the horizon start. Field order makes
/// the derived ordering "by day, then slot".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Shift {
    /// Day offset from the horizon start.
    pub day: u32,
    /// Slot within the day (0-based).
    pub slot: u32,
}

impl Shift {
    /// Creates a shift.
    pub fn new(day: u32, slot: u32) -> Self {
        Self { day, slot }
    }

    /// The single shift of `day` in a one-slot calendar.
    pub fn on_day(day: u32) -> Self {
        Self::new(day, 0)
    }
}

/// The shift grid of a planning horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftCalendar {
    /// First day of the horizon.
    pub start: NaiveDate,
    /// Number of days in the horizon.
    pub days: u32,
    /// Shift slots per day (at least 1).
    pub slots_per_day: u32,
}

impl ShiftCalendar {
    /// Creates a one-slot-per-day calendar.
    pub fn new(start: NaiveDate, days: u32) -> Self {
        Self {
            start,
            days,
            slots_per_day: 1,
        }
    }

    /// Sets the number of slots per day (clamped to at least 1).
    pub fn with_slots(mut self, slots_per_day: u32) -> Self {
        self.slots_per_day = slots_per_day.max(1);
        self
    }

    /// Calendar covering the whole month that contains `date`.
    ///
    /// Returns `None` only for dates at the edge of chrono's range.
    pub fn for_month(date: NaiveDate) -> Option<Self> {
        let first = date.with_day(1)?;
        let (year, month) = if first.month() == 12 {
            (first.year() + 1, 1)
        } else {
            (first.year(), first.month() + 1)
        };
        let next = NaiveDate::from_ymd_opt(year, month, 1)?;
        let days = next.signed_duration_since(first).num_days();
        Some(Self::new(first, u32::try_from(days).ok()?))
    }

    /// Default planning start derived from `today`: the Sunday two weeks
    /// after the upcoming Sunday (today itself counts when it is Sunday).
    pub fn planning_start(today: NaiveDate) -> NaiveDate {
        let to_sunday = 6 - today.weekday().num_days_from_monday();
        today + Days::new(u64::from(to_sunday) + 14)
    }

    /// Total number of shifts in the horizon.
    #[inline]
    pub fn shift_count(&self) -> usize {
        (self.days as usize).saturating_mul(self.slots_per_day as usize)
    }

    /// All shifts in order.
    pub fn shifts(&self) -> Vec<Shift> {
        (0..self.days)
            .flat_map(|day| (0..self.slots_per_day).map(move |slot| Shift::new(day, slot)))
            .collect()
    }

    /// Whether the shift lies inside this horizon.
    #[inline]
    pub fn contains(&self, shift: Shift) -> bool {
        shift.day < self.days && shift.slot < self.slots_per_day
    }

    /// Dense index of a shift (`day * slots_per_day + slot`).
    pub fn index_of(&self, shift: Shift) -> Option<usize> {
        self.contains(shift)
            .then(|| shift.day as usize * self.slots_per_day as usize + shift.slot as usize)
    }

    /// Shift at a dense index.
    pub fn shift_at(&self, index: usize) -> Option<Shift> {
        if index >= self.shift_count() {
            return None;
        }
        let slots = self.slots_per_day as usize;
        Some(Shift::new((index / slots) as u32, (index % slots) as u32))
    }

    /// Calendar date of a day offset.
    pub fn date_of(&self, day: u32) -> NaiveDate {
        self.start + Days::new(u64::from(day))
    }

    /// Weekday of a day offset.
    pub fn weekday_of(&self, day: u32) -> Weekday {
        self.date_of(day).weekday()
    }

    /// Human-readable label, e.g. `"Sun 14"` or `"Sun 14 #2"` with
    /// several slots per day.
    pub fn label(&self, shift: Shift) -> String {
        let day = self.day_label(shift.day);
        if self.slots_per_day > 1 {
            format!("{day} #{}", shift.slot + 1)
        } else {
            day
        }
    }

    /// Label of a whole day, e.g. `"Sun 14"`.
    pub fn day_label(&self, day: u32) -> String {
        let date = self.date_of(day);
        let name = DAY_NAMES[date.weekday().num_days_from_monday() as usize];
        format!("{name} {}", date.day())
    }
}
