//! Workday assignment: which calendar date a punch belongs to.

use crate::core::calculator::shift::ShiftResolver;
use crate::core::policy::Policy;
use crate::errors::AppResult;
use crate::models::person::Person;
use chrono::{DateTime, Duration, NaiveDate};
use chrono_tz::Tz;
use tracing::warn;

/// Why a punch landed on its workday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkdayBasis {
    /// Tail of the previous day's night shift.
    PreviousNightShift,
    /// Inside (or just before) the same day's shift.
    Scheduled,
    /// Nothing matched: default to the punch's own date.
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkdayAssignment {
    pub workday: NaiveDate,
    pub basis: WorkdayBasis,
}

pub fn assign_workday(
    resolver: &ShiftResolver<'_>,
    person: &Person,
    punch: DateTime<Tz>,
    policy: &Policy,
) -> AppResult<WorkdayAssignment> {
    let tz = punch.timezone();
    let date = punch.date_naive();
    let prev_date = date - Duration::days(1);

    let prev = resolver.resolve(person, tz, prev_date)?;
    if !prev.is_holiday && prev.is_night_shift && punch <= prev.end + policy.night_departure_window
    {
        return Ok(WorkdayAssignment {
            workday: prev_date,
            basis: WorkdayBasis::PreviousNightShift,
        });
    }

    let current = resolver.resolve(person, tz, date)?;
    if !current.is_holiday && punch >= current.start - policy.early_arrival_window {
        return Ok(WorkdayAssignment {
            workday: date,
            basis: WorkdayBasis::Scheduled,
        });
    }

    warn!(
        person = %person.id,
        punch = %punch.format("%Y-%m-%d %H:%M"),
        "no shift window matched, defaulting to the punch date"
    );
    Ok(WorkdayAssignment {
        workday: date,
        basis: WorkdayBasis::Fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calculator::interval::localize;
    use crate::core::memory::MemoryStore;
    use crate::models::schedule::{ScheduleOwner, ShiftHours};
    use chrono::{NaiveDateTime, Weekday};

    fn local(s: &str) -> DateTime<Tz> {
        let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap();
        localize(naive, Tz::UTC)
    }

    fn night_store() -> MemoryStore {
        let store = MemoryStore::new();
        // 2025-08-15 is a Friday
        store.set_weekly(
            ScheduleOwner::Person("p1".into()),
            Weekday::Fri,
            ShiftHours::new(22.0, 6.0),
        );
        store
    }

    #[test]
    fn after_midnight_punch_belongs_to_previous_night_shift() {
        let store = night_store();
        let p = Person::new("p1", "111");
        let r = ShiftResolver::new(&store);
        let policy = Policy::default();

        let a = assign_workday(&r, &p, local("2025-08-16 00:40"), &policy).unwrap();
        assert_eq!(a.workday, "2025-08-15".parse::<NaiveDate>().unwrap());
        assert_eq!(a.basis, WorkdayBasis::PreviousNightShift);

        // still inside the 4h tail after 06:00
        let a = assign_workday(&r, &p, local("2025-08-16 10:00"), &policy).unwrap();
        assert_eq!(a.workday, "2025-08-15".parse::<NaiveDate>().unwrap());

        // past the tail, Saturday is unscheduled → own date
        let a = assign_workday(&r, &p, local("2025-08-16 10:01"), &policy).unwrap();
        assert_eq!(a.workday, "2025-08-16".parse::<NaiveDate>().unwrap());
        assert_eq!(a.basis, WorkdayBasis::Fallback);
    }

    #[test]
    fn night_shift_start_stays_on_its_own_day() {
        let store = night_store();
        let p = Person::new("p1", "111");
        let r = ShiftResolver::new(&store);

        let a = assign_workday(&r, &p, local("2025-08-15 21:50"), &Policy::default()).unwrap();
        assert_eq!(a.workday, "2025-08-15".parse::<NaiveDate>().unwrap());
        assert_eq!(a.basis, WorkdayBasis::Scheduled);
    }

    #[test]
    fn early_arrival_window_for_day_shift() {
        let store = MemoryStore::new();
        store.set_weekly(
            ScheduleOwner::Person("p1".into()),
            Weekday::Tue,
            ShiftHours::new(9.0, 17.5),
        );
        let p = Person::new("p1", "111");
        let r = ShiftResolver::new(&store);
        let policy = Policy::default();

        let a = assign_workday(&r, &p, local("2025-08-12 06:00"), &policy).unwrap();
        assert_eq!(a.basis, WorkdayBasis::Scheduled);

        let a = assign_workday(&r, &p, local("2025-08-12 05:59"), &policy).unwrap();
        assert_eq!(a.basis, WorkdayBasis::Fallback);
        assert_eq!(a.workday, "2025-08-12".parse::<NaiveDate>().unwrap());
    }
}
