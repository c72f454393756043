//! Schedule definitions: weekly worksheet lines and date-ranged overrides.
//! Hours are fractional hours of the day (9.5 = 09:30).

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Who a weekly entry belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScheduleOwner {
    Person(String),
    Calendar(String),
}

impl ScheduleOwner {
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleOwner::Person(_) => "person",
            ScheduleOwner::Calendar(_) => "calendar",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ScheduleOwner::Person(id) | ScheduleOwner::Calendar(id) => id,
        }
    }
}

/// The hours of a single working day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ShiftHours {
    pub start_hour: f64,
    pub end_hour: f64,
    #[serde(default)]
    pub break_start: f64,
    #[serde(default)]
    pub break_end: f64,
}

impl ShiftHours {
    pub fn new(start_hour: f64, end_hour: f64) -> Self {
        Self {
            start_hour,
            end_hour,
            break_start: 0.0,
            break_end: 0.0,
        }
    }

    pub fn with_break(mut self, break_start: f64, break_end: f64) -> Self {
        self.break_start = break_start;
        self.break_end = break_end;
        self
    }

    /// 0/0 means "no work that day".
    pub fn is_week_off(&self) -> bool {
        self.start_hour == 0.0 && self.end_hour == 0.0
    }

    pub fn is_night_shift(&self) -> bool {
        self.end_hour < self.start_hour
    }

    pub fn has_break(&self) -> bool {
        self.break_end > self.break_start
    }

    /// Scheduled duration minus scheduled break, floored at 0.
    pub fn planned_work_hours(&self) -> f64 {
        let span = if self.is_night_shift() {
            (24.0 - self.start_hour) + self.end_hour
        } else {
            self.end_hour - self.start_hour
        };
        let brk = (self.break_end - self.break_start).max(0.0);
        (span - brk).max(0.0)
    }

    pub fn validate(&self) -> AppResult<()> {
        for (label, h) in [
            ("start", self.start_hour),
            ("end", self.end_hour),
            ("break start", self.break_start),
            ("break end", self.break_end),
        ] {
            if !(0.0..24.0).contains(&h) {
                return Err(AppError::InvalidHour(format!(
                    "{label} hour {h} must be within [0, 24)"
                )));
            }
        }
        if self.break_start > self.break_end {
            return Err(AppError::InvalidSchedule(format!(
                "break start {} is later than break end {}",
                self.break_start, self.break_end
            )));
        }
        Ok(())
    }
}

/// One worksheet line of a weekly schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyEntry {
    pub owner: ScheduleOwner,
    pub weekday: Weekday,
    pub hours: ShiftHours,
}

/// A date-ranged schedule that wins over the weekly schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftOverride {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub person_ids: Vec<String>,
    #[serde(flatten)]
    pub hours: ShiftHours,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ShiftOverride {
    pub fn covers(&self, person_id: &str, date: NaiveDate) -> bool {
        date >= self.date_from && date <= self.date_to && self.person_ids.iter().any(|p| p == person_id)
    }

    pub fn overlaps(&self, other: &ShiftOverride) -> bool {
        self.date_from <= other.date_to && self.date_to >= other.date_from
    }

    pub fn validate(&self) -> AppResult<()> {
        self.hours.validate()?;
        if self.date_from > self.date_to {
            return Err(AppError::InvalidSchedule(format!(
                "override {}: start date {} is after end date {}",
                self.id, self.date_from, self.date_to
            )));
        }
        if self.person_ids.is_empty() {
            return Err(AppError::InvalidSchedule(format!(
                "override {} has no employees",
                self.id
            )));
        }
        Ok(())
    }
}

/// Reject any pair of overrides sharing a person over overlapping dates.
pub fn check_override_overlaps(overrides: &[ShiftOverride]) -> AppResult<()> {
    for (i, a) in overrides.iter().enumerate() {
        for b in &overrides[i + 1..] {
            if a.id == b.id || !a.overlaps(b) {
                continue;
            }
            if let Some(p) = a.person_ids.iter().find(|p| b.person_ids.contains(p)) {
                return Err(AppError::InvalidSchedule(format!(
                    "overrides {} and {} overlap for employee {}",
                    a.id, b.id, p
                )));
            }
        }
    }
    Ok(())
}

pub fn weekday_from_index(i: u32) -> Option<Weekday> {
    match i {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}
