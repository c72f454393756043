//! Shift resolution: which hours apply to a person on a given date.
//!
//! Precedence: date-ranged override > own weekly line > shared calendar line
//! > no shift (holiday).

use crate::core::calculator::interval::hour_to_local;
use crate::core::ports::ScheduleRepository;
use crate::errors::AppResult;
use crate::models::person::Person;
use crate::models::schedule::{ScheduleOwner, ShiftHours};
use crate::models::shift::{ResolvedShift, ShiftSource};
use chrono::{Datelike, Duration, NaiveDate};
use chrono_tz::Tz;
use tracing::debug;

pub struct ShiftResolver<'a> {
    schedules: &'a dyn ScheduleRepository,
}

impl<'a> ShiftResolver<'a> {
    pub fn new(schedules: &'a dyn ScheduleRepository) -> Self {
        Self { schedules }
    }

    pub fn resolve(&self, person: &Person, tz: Tz, date: NaiveDate) -> AppResult<ResolvedShift> {
        // 1) overrides: most recently created wins
        let chosen = self
            .schedules
            .overrides_for(&person.id, date)?
            .into_iter()
            .filter(|o| o.covers(&person.id, date))
            .max_by_key(|o| (o.created_at, o.id));

        if let Some(ov) = chosen {
            debug!(person = %person.id, %date, override_id = ov.id, "shift from override");
            if ov.hours.is_week_off() {
                return Ok(holiday(date, tz, ShiftSource::WeekOff));
            }
            return Ok(build(date, tz, &ov.hours, ShiftSource::Override(ov.id)));
        }

        // 2) weekly schedule: own line first, then the shared calendar
        let weekday = date.weekday();
        let own = ScheduleOwner::Person(person.id.clone());
        let mut entry = self.schedules.weekly_entry(&own, weekday)?;

        if entry.is_none()
            && let Some(cal) = &person.calendar_id
        {
            entry = self
                .schedules
                .weekly_entry(&ScheduleOwner::Calendar(cal.clone()), weekday)?;
        }

        match entry {
            None => Ok(holiday(date, tz, ShiftSource::Unscheduled)),
            Some(e) if e.hours.is_week_off() => Ok(holiday(date, tz, ShiftSource::WeekOff)),
            Some(e) => Ok(build(date, tz, &e.hours, ShiftSource::Weekly(e.owner))),
        }
    }
}

fn holiday(date: NaiveDate, tz: Tz, source: ShiftSource) -> ResolvedShift {
    let midnight = hour_to_local(date, 0.0, tz);
    ResolvedShift {
        date,
        start: midnight,
        end: midnight,
        break_start: None,
        break_end: None,
        is_night_shift: false,
        planned_work_hours: 0.0,
        is_holiday: true,
        source,
    }
}

fn build(date: NaiveDate, tz: Tz, hours: &ShiftHours, source: ShiftSource) -> ResolvedShift {
    let night = hours.is_night_shift();
    let next_day = date + Duration::days(1);

    // On a night shift, any hour earlier than the start belongs to the next day.
    let anchor = |h: f64| {
        if night && h < hours.start_hour {
            hour_to_local(next_day, h, tz)
        } else {
            hour_to_local(date, h, tz)
        }
    };

    let (break_start, break_end) = if hours.has_break() {
        (Some(anchor(hours.break_start)), Some(anchor(hours.break_end)))
    } else {
        (None, None)
    };

    ResolvedShift {
        date,
        start: hour_to_local(date, hours.start_hour, tz),
        end: anchor(hours.end_hour),
        break_start,
        break_end,
        is_night_shift: night,
        planned_work_hours: hours.planned_work_hours(),
        is_holiday: false,
        source,
    }
}
