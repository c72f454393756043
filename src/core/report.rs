//! Per-person attendance statistics over a period.

use crate::core::calculator::shift::ShiftResolver;
use crate::core::ports::{AttendanceStore, PersonDirectory, ScheduleRepository};
use crate::errors::{AppError, AppResult};
use crate::models::attendance::AttendanceRecord;
use crate::models::person::Person;
use crate::models::report::AttendanceReport;
use crate::models::shift::ShiftSource;
use crate::models::status_flag::StatusFlag;
use crate::utils::date::days_in;
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::collections::HashSet;

pub struct ReportLogic;

impl ReportLogic {
    pub fn build<S: AttendanceStore + PersonDirectory + ScheduleRepository>(
        store: &S,
        org_zone: Option<Tz>,
        person_id: Option<&str>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<AttendanceReport>> {
        let persons: Vec<Person> = match person_id {
            Some(id) => vec![
                store
                    .get(id)?
                    .ok_or_else(|| AppError::UnknownPerson(id.to_string()))?,
            ],
            None => store.list()?,
        };

        let resolver = ShiftResolver::new(store);
        let mut out = Vec::with_capacity(persons.len());

        for person in persons {
            let tz = person.zone(org_zone)?;
            let mut rep = AttendanceReport {
                person_id: person.id.clone(),
                ..Default::default()
            };

            let mut working: HashSet<NaiveDate> = HashSet::new();
            for day in days_in(from, to) {
                let shift = resolver.resolve(&person, tz, day)?;
                if !shift.is_holiday {
                    rep.working_days += 1;
                    working.insert(day);
                } else if shift.source == ShiftSource::WeekOff {
                    rep.week_offs += 1;
                }
                // unscheduled days are neither
            }

            let records = store.records_between(Some(&person.id), from, to)?;
            let mut present_on_working = 0u32;
            for rec in &records {
                tally(&mut rep, rec);
                if rec.check_in.is_some() && working.contains(&rec.workday) {
                    present_on_working += 1;
                }
            }
            rep.absent_days = rep.working_days.saturating_sub(present_on_working);

            out.push(rep);
        }

        Ok(out)
    }
}

fn tally(rep: &mut AttendanceReport, rec: &AttendanceRecord) {
    if rec.check_in.is_some() {
        rep.present_days += 1;
    }

    rep.worked_hours += rec.worked_hours;
    rep.overtime_hours += rec.overtime_hours;

    // No shift, no punctuality.
    if rec.has(StatusFlag::HolidayWork) {
        return;
    }

    // Auto-filled sides say nothing about punctuality.
    if rec.check_in.is_some() && !rec.has(StatusFlag::MissingCheckin) {
        if rec.has(StatusFlag::EarlyCheckin) {
            rep.early_in += 1;
        } else if rec.has(StatusFlag::LateCheckin) {
            rep.late_in += 1;
        } else {
            rep.on_time_check_in += 1;
        }
    }
    if rec.check_out.is_some() && !rec.has(StatusFlag::MissingCheckout) {
        if rec.has(StatusFlag::EarlyCheckout) {
            rep.early_out += 1;
        } else if rec.has(StatusFlag::LateCheckout) {
            rep.late_out += 1;
        } else {
            rep.on_time_check_out += 1;
        }
    }
}
