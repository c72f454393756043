//! Turns the punches of one workday and its resolved shift into a
//! check-in/check-out pair, status flags and hour totals.
//!
//! Pure: no store access, `now` is passed in.

use crate::core::calculator::aggregate::dedup_sorted;
use crate::core::calculator::interval::{hours_between, overlap_seconds, seconds_to_hours};
use crate::core::policy::Policy;
use crate::models::shift::{ResolvedShift, ShiftSource};
use crate::models::status_flag::{StatusFlag, StatusFlags};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceComputation {
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub status_flags: StatusFlags,
    pub worked_hours: f64,
    pub overtime_hours: f64,
}

impl AttendanceComputation {
    /// Nothing to store: neither side of the pair exists.
    pub fn is_empty(&self) -> bool {
        self.check_in.is_none() && self.check_out.is_none()
    }

    pub fn has(&self, flag: StatusFlag) -> bool {
        self.status_flags.contains(&flag)
    }
}

pub fn process_attendance(
    punches: &[DateTime<Utc>],
    shift: &ResolvedShift,
    policy: &Policy,
    now: DateTime<Utc>,
) -> AttendanceComputation {
    let punches = dedup_sorted(punches.to_vec());

    if shift.is_holiday {
        return holiday_work(&punches, shift);
    }

    let mut out = AttendanceComputation::default();

    if punches.is_empty() {
        out.status_flags.insert(StatusFlag::Absent);
        return out;
    }

    let start = shift.start_utc();
    let end = shift.end_utc();

    let (observed_in, observed_out) = match punches.as_slice() {
        [single] => {
            let to_start = (*single - start).num_seconds().abs();
            let to_end = (*single - end).num_seconds().abs();
            if to_start <= to_end {
                (Some(*single), None)
            } else {
                (None, Some(*single))
            }
        }
        [first, .., last] => (Some(*first), Some(*last)),
        [] => (None, None),
    };

    // Deviations are judged on what was actually punched.
    if let Some(ci) = observed_in {
        if ci < start {
            out.status_flags.insert(StatusFlag::EarlyCheckin);
        }
        if ci > start + policy.late_grace {
            out.status_flags.insert(StatusFlag::LateCheckin);
        }
    }
    if let Some(co) = observed_out {
        if co < end {
            out.status_flags.insert(StatusFlag::EarlyCheckout);
        }
        if co > end {
            out.status_flags.insert(StatusFlag::LateCheckout);
        }
    }
    if shift.is_night_shift {
        out.status_flags.insert(StatusFlag::NightShift);
    }

    let check_in = match observed_in {
        Some(ci) => ci,
        None => {
            out.status_flags.insert(StatusFlag::MissingCheckin);
            start
        }
    };

    let mut check_out = observed_out;
    if check_out.is_none() {
        out.status_flags.insert(StatusFlag::MissingCheckout);
        if now - check_in > policy.abandonment {
            check_out = Some(check_in + policy.abandonment);
        }
    }

    let mut breaks = observed_breaks(&punches);
    if let Some(co) = check_out {
        let (co, fixed) = fix_order(check_in, co, end);
        if fixed {
            out.status_flags.insert(StatusFlag::InvalidOrderFixed);
            breaks.clear();
        }
        check_out = Some(co);
    }

    out.check_in = Some(check_in);
    out.check_out = check_out;

    if let Some(co) = check_out {
        if breaks.is_empty()
            && let Some(b) = shift.break_utc()
        {
            breaks.push(b);
        }
        let break_secs: i64 = breaks
            .iter()
            .map(|(bs, be)| overlap_seconds(check_in, co, *bs, *be))
            .sum();
        let worked_secs = ((co - check_in).num_seconds() - break_secs).max(0);

        out.worked_hours = seconds_to_hours(worked_secs);
        out.overtime_hours = out.worked_hours - shift.planned_work_hours;

        let tolerance = seconds_to_hours(policy.overtime_tolerance.num_seconds());
        if out.overtime_hours > tolerance {
            out.status_flags.insert(StatusFlag::ExtraHours);
        } else if out.overtime_hours < -tolerance {
            out.status_flags.insert(StatusFlag::LessHours);
        }
    }

    out
}

/// Work on a day without a shift: everything counts as overtime.
fn holiday_work(punches: &[DateTime<Utc>], shift: &ResolvedShift) -> AttendanceComputation {
    let mut out = AttendanceComputation::default();
    let (Some(first), Some(last)) = (punches.first(), punches.last()) else {
        return out;
    };

    out.check_in = Some(*first);
    out.check_out = (punches.len() > 1).then_some(*last);
    out.status_flags.insert(StatusFlag::HolidayWork);
    out.status_flags.insert(StatusFlag::ExtraHours);
    if shift.source == ShiftSource::Unscheduled {
        out.status_flags.insert(StatusFlag::Unscheduled);
    }

    match out.check_out {
        Some(co) => {
            out.worked_hours = hours_between(*first, co);
            out.overtime_hours = out.worked_hours;
        }
        None => {
            out.status_flags.insert(StatusFlag::MissingCheckout);
        }
    }
    out
}

/// Interior punches that pair up cleanly are taken as the breaks actually
/// taken; an odd interior count says nothing reliable.
fn observed_breaks(punches: &[DateTime<Utc>]) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    if punches.len() < 4 {
        return Vec::new();
    }
    let interior = &punches[1..punches.len() - 1];
    if interior.len() % 2 != 0 {
        return Vec::new();
    }
    interior.chunks_exact(2).map(|c| (c[0], c[1])).collect()
}

/// A check-out before the check-in is replaced by the shift end
/// (or the check-in itself when even that is earlier).
fn fix_order(
    check_in: DateTime<Utc>,
    check_out: DateTime<Utc>,
    shift_end: DateTime<Utc>,
) -> (DateTime<Utc>, bool) {
    if check_out >= check_in {
        (check_out, false)
    } else {
        (shift_end.max(check_in), true)
    }
}
