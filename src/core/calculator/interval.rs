//! Interval and time-zone arithmetic shared by the engine.
//! Everything here is pure.

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;

const SECS_PER_HOUR: f64 = 3600.0;

/// Length of the intersection of `[a_start, a_end]` and `[b_start, b_end]`
/// in seconds, never negative.
pub fn overlap_seconds(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> i64 {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    (end - start).num_seconds().max(0)
}

pub fn to_local(instant: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    instant.with_timezone(&tz)
}

/// Attach `tz` to a naive wall-clock time.
///
/// Both DST edge cases are read with the standard offset: an ambiguous
/// fall-back time takes the later (standard) instant, a time inside a
/// spring-forward gap takes the offset in force before the gap.
pub fn localize(local: NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(_, standard) => standard,
        LocalResult::None => {
            let before = local - Duration::hours(24);
            let offset = tz.offset_from_utc_datetime(&before).fix();
            let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
            tz.from_utc_datetime(&utc)
        }
    }
}

pub fn to_utc(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    localize(local, tz).with_timezone(&Utc)
}

/// `date` at `hours` past local midnight (9.5 → 09:30).
pub fn hour_to_local(date: NaiveDate, hours: f64, tz: Tz) -> DateTime<Tz> {
    let secs = (hours * SECS_PER_HOUR).round() as i64;
    let naive = date.and_time(chrono::NaiveTime::MIN) + Duration::seconds(secs);
    localize(naive, tz)
}

/// Inverse of [`hour_to_local`] on the wall clock.
pub fn local_to_hour<T: TimeZone>(dt: &DateTime<T>) -> f64 {
    f64::from(dt.num_seconds_from_midnight()) / SECS_PER_HOUR
}

pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / SECS_PER_HOUR
}

pub fn seconds_to_hours(secs: i64) -> f64 {
    secs as f64 / SECS_PER_HOUR
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn overlap_is_commutative_and_clamped() {
        let a = (utc("2025-08-12T08:58:00Z"), utc("2025-08-12T17:02:00Z"));
        let b = (utc("2025-08-12T12:00:00Z"), utc("2025-08-12T13:00:00Z"));
        assert_eq!(overlap_seconds(a.0, a.1, b.0, b.1), 3600);
        assert_eq!(overlap_seconds(b.0, b.1, a.0, a.1), 3600);

        let c = (utc("2025-08-12T18:00:00Z"), utc("2025-08-12T19:00:00Z"));
        assert_eq!(overlap_seconds(a.0, a.1, c.0, c.1), 0);

        let d = (utc("2025-08-12T16:30:00Z"), utc("2025-08-12T19:00:00Z"));
        assert_eq!(overlap_seconds(a.0, a.1, d.0, d.1), 32 * 60);
    }

    #[test]
    fn fractional_hours_round_trip() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 12).unwrap();
        let dt = hour_to_local(date, 17.5, chrono_tz::Europe::Rome);
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2025-08-12 17:30");
        assert!((local_to_hour(&dt) - 17.5).abs() < 1e-9);
        // CEST is UTC+2 in August
        assert_eq!(dt.with_timezone(&Utc), utc("2025-08-12T15:30:00Z"));
    }

    #[test]
    fn localize_handles_dst_edges() {
        let tz = chrono_tz::Europe::Rome;
        // 2025-03-30 02:30 does not exist in Rome
        let gap = NaiveDate::from_ymd_opt(2025, 3, 30)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let dt = localize(gap, tz);
        assert_eq!(dt.with_timezone(&Utc), utc("2025-03-30T01:30:00Z"));

        // 2025-10-26 02:30 happens twice: take the standard-time one (CET)
        let amb = NaiveDate::from_ymd_opt(2025, 10, 26)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert_eq!(to_utc(amb, tz), utc("2025-10-26T01:30:00Z"));
    }
}
