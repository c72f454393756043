use crate::core::calculator::attendance::process_attendance;
use crate::core::calculator::interval::localize;
use crate::core::calculator::shift::ShiftResolver;
use crate::core::policy::Policy;
use crate::core::ports::AttendanceBackend;
use crate::errors::{AppError, AppResult};
use crate::models::attendance::AttendanceRecord;
use crate::models::status_flag::StatusFlag;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::info;

/// Human corrections: the only path that sets (or clears) the locks.
pub struct CorrectLogic;

impl CorrectLogic {
    /// Set check-in and/or check-out from local wall-clock times, lock the
    /// corrected sides and recompute hours against the day's shift.
    #[allow(clippy::too_many_arguments)]
    pub fn apply<S: AttendanceBackend>(
        store: &S,
        policy: &Policy,
        org_zone: Option<Tz>,
        person_id: &str,
        workday: NaiveDate,
        check_in: Option<NaiveTime>,
        check_out: Option<NaiveTime>,
        now: DateTime<Utc>,
    ) -> AppResult<AttendanceRecord> {
        if check_in.is_none() && check_out.is_none() {
            return Err(AppError::InvalidTime(
                "nothing to correct: pass --in and/or --out".into(),
            ));
        }

        let person = store
            .get(person_id)?
            .ok_or_else(|| AppError::UnknownPerson(person_id.to_string()))?;
        let tz = person.zone(org_zone)?;

        let mut rec = store
            .find(person_id, workday)?
            .unwrap_or_else(|| AttendanceRecord::new(person_id, workday));
        let shift = ShiftResolver::new(store).resolve(&person, tz, workday)?;

        // ------------------------------------------------
        // Times
        // ------------------------------------------------
        if let Some(t) = check_in {
            rec.check_in = Some(at_local(workday, t, tz));
            rec.check_in_locked = true;
        }
        if let Some(t) = check_out {
            let next_day = match rec.check_in {
                Some(ci) => at_local(workday, t, tz) < ci,
                // no check-in: follow the shift's own end anchoring
                None => shift.is_night_shift && t < shift.start.naive_local().time(),
            };
            let date = if next_day {
                workday + Duration::days(1)
            } else {
                workday
            };
            rec.check_out = Some(at_local(date, t, tz));
            rec.check_out_locked = true;
        }

        // ------------------------------------------------
        // Hours and flags
        // ------------------------------------------------
        match (rec.check_in, rec.check_out) {
            (Some(ci), Some(co)) => {
                if co <= ci {
                    return Err(AppError::InvalidTime(format!(
                        "check-out {} is not after check-in {}",
                        co.with_timezone(&tz).format("%Y-%m-%d %H:%M"),
                        ci.with_timezone(&tz).format("%Y-%m-%d %H:%M")
                    )));
                }
                let computed = process_attendance(&[ci, co], &shift, policy, now);
                rec.worked_hours = computed.worked_hours;
                rec.overtime_hours = computed.overtime_hours;
                rec.status_flags = computed.status_flags;
            }
            (ci, co) => {
                rec.worked_hours = 0.0;
                rec.overtime_hours = 0.0;
                rec.status_flags.remove(&StatusFlag::Absent);
                set_flag(&mut rec, StatusFlag::MissingCheckin, ci.is_none());
                set_flag(&mut rec, StatusFlag::MissingCheckout, co.is_none());
            }
        }

        store.upsert(&rec)?;
        store.audit("edit", &rec.key(), &describe(&rec, tz))?;
        info!(record = %rec.key(), "manual correction stored");
        Ok(rec)
    }

    /// Clear both locks so the next sync may recompute the record.
    pub fn unlock<S: AttendanceBackend>(
        store: &S,
        person_id: &str,
        workday: NaiveDate,
    ) -> AppResult<AttendanceRecord> {
        let mut rec = store
            .find(person_id, workday)?
            .ok_or_else(|| AppError::NoRecord(format!("{person_id}@{workday}")))?;

        rec.check_in_locked = false;
        rec.check_out_locked = false;
        store.upsert(&rec)?;
        store.audit("unlock", &rec.key(), "locks cleared")?;
        Ok(rec)
    }
}

fn at_local(date: NaiveDate, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    localize(date.and_time(time), tz).with_timezone(&Utc)
}

fn set_flag(rec: &mut AttendanceRecord, flag: StatusFlag, on: bool) {
    if on {
        rec.status_flags.insert(flag);
    } else {
        rec.status_flags.remove(&flag);
    }
}

fn describe(rec: &AttendanceRecord, tz: Tz) -> String {
    let fmt = |v: Option<DateTime<Utc>>| {
        v.map(|d| d.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "--".into())
    };
    format!(
        "in={} out={} worked={:.2}h",
        fmt(rec.check_in),
        fmt(rec.check_out),
        rec.worked_hours
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::MemoryStore;
    use crate::core::ports::AttendanceStore;
    use crate::models::person::Person;
    use crate::models::schedule::{ScheduleOwner, ShiftHours};
    use chrono::Weekday;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-08-20T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.add_person(Person::new("p1", "101").with_timezone("Europe/Rome"));
        store.set_workweek(
            ScheduleOwner::Person("p1".into()),
            ShiftHours::new(9.0, 17.5).with_break(12.0, 13.0),
        );
        store
    }

    #[test]
    fn correction_locks_and_recomputes() {
        let store = store();
        let rec = CorrectLogic::apply(
            &store,
            &Policy::default(),
            None,
            "p1",
            d("2025-08-12"),
            Some(t("09:00")),
            Some(t("18:30")),
            now(),
        )
        .unwrap();

        assert!(rec.check_in_locked && rec.check_out_locked);
        // Rome is UTC+2 in August
        assert_eq!(rec.check_in.unwrap().to_rfc3339(), "2025-08-12T07:00:00+00:00");
        assert!((rec.worked_hours - 8.5).abs() < 1e-9);
        assert!(rec.status_flags.contains(&StatusFlag::ExtraHours));
        assert!(rec.status_flags.contains(&StatusFlag::LateCheckout));
        assert_eq!(store.find("p1", d("2025-08-12")).unwrap(), Some(rec));
        assert!(store.audit_lines().iter().any(|(op, _, _)| op == "edit"));
    }

    #[test]
    fn out_before_in_rolls_to_next_day() {
        let store = store();
        let rec = CorrectLogic::apply(
            &store,
            &Policy::default(),
            None,
            "p1",
            d("2025-08-12"),
            Some(t("22:00")),
            Some(t("06:00")),
            now(),
        )
        .unwrap();
        assert_eq!(rec.check_out.unwrap().to_rfc3339(), "2025-08-13T04:00:00+00:00");
    }

    #[test]
    fn lone_check_out_on_a_night_shift_lands_on_the_next_day() {
        let store = store();
        store.add_person(Person::new("p2", "102").with_timezone("UTC"));
        store.set_weekly(
            ScheduleOwner::Person("p2".into()),
            Weekday::Fri,
            ShiftHours::new(22.0, 6.0),
        );

        let rec = CorrectLogic::apply(
            &store,
            &Policy::default(),
            None,
            "p2",
            d("2025-08-15"),
            None,
            Some(t("06:00")),
            now(),
        )
        .unwrap();
        assert_eq!(rec.check_out.unwrap().to_rfc3339(), "2025-08-16T06:00:00+00:00");
        assert!(rec.check_out_locked);
        assert!(rec.status_flags.contains(&StatusFlag::MissingCheckin));

        // a day shift keeps the check-out on the workday
        let rec = CorrectLogic::apply(
            &store,
            &Policy::default(),
            None,
            "p1",
            d("2025-08-12"),
            None,
            Some(t("17:30")),
            now(),
        )
        .unwrap();
        assert_eq!(rec.check_out.unwrap().to_rfc3339(), "2025-08-12T15:30:00+00:00");
    }

    #[test]
    fn one_sided_correction_keeps_the_other_side_missing() {
        let store = store();
        let rec = CorrectLogic::apply(
            &store,
            &Policy::default(),
            None,
            "p1",
            d("2025-08-12"),
            Some(t("09:00")),
            None,
            now(),
        )
        .unwrap();
        assert!(rec.check_in_locked);
        assert!(!rec.check_out_locked);
        assert!(rec.status_flags.contains(&StatusFlag::MissingCheckout));
        assert!(!rec.status_flags.contains(&StatusFlag::MissingCheckin));
    }

    #[test]
    fn unknown_person_and_missing_record_are_errors() {
        let store = store();
        let err = CorrectLogic::apply(
            &store,
            &Policy::default(),
            None,
            "ghost",
            d("2025-08-12"),
            Some(t("09:00")),
            None,
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::UnknownPerson(_)));

        let err = CorrectLogic::unlock(&store, "p1", d("2025-08-12")).unwrap_err();
        assert!(matches!(err, AppError::NoRecord(_)));
    }

    #[test]
    fn unlock_clears_both_locks() {
        let store = store();
        CorrectLogic::apply(
            &store,
            &Policy::default(),
            None,
            "p1",
            d("2025-08-12"),
            Some(t("09:00")),
            Some(t("17:30")),
            now(),
        )
        .unwrap();
        let rec = CorrectLogic::unlock(&store, "p1", d("2025-08-12")).unwrap();
        assert!(!rec.is_locked());
        assert!(!store.find("p1", d("2025-08-12")).unwrap().unwrap().is_locked());
    }
}
