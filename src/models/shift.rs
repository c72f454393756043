use crate::models::schedule::ScheduleOwner;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Where a resolved shift came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ShiftSource {
    Override(i64),
    Weekly(ScheduleOwner),
    /// An explicit 0/0 worksheet line.
    WeekOff,
    /// No override and no worksheet line at all.
    Unscheduled,
}

/// The effective shift of one person on one calendar date.
///
/// Derived on demand, never persisted. For holidays only
/// `planned_work_hours == 0` is meaningful; `start`/`end` sit at local midnight.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedShift {
    pub date: NaiveDate,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub break_start: Option<DateTime<Tz>>,
    pub break_end: Option<DateTime<Tz>>,
    pub is_night_shift: bool,
    pub planned_work_hours: f64,
    pub is_holiday: bool,
    pub source: ShiftSource,
}

impl ResolvedShift {
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.with_timezone(&Utc)
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.with_timezone(&Utc)
    }

    /// Scheduled break as a UTC interval, if one is defined.
    pub fn break_utc(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (&self.break_start, &self.break_end) {
            (Some(s), Some(e)) if e > s => Some((s.with_timezone(&Utc), e.with_timezone(&Utc))),
            _ => None,
        }
    }

    pub fn zone(&self) -> Tz {
        self.start.timezone()
    }

    pub fn is_scheduled(&self) -> bool {
        !self.is_holiday
    }
}
