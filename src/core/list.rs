use crate::core::ports::{AttendanceStore, PersonDirectory};
use crate::errors::AppResult;
use crate::models::attendance::AttendanceRecord;
use crate::models::status_flag::flags_to_db;
use crate::utils::time::local_hm;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::HashMap;

/// Flat, display-ready attendance row (local times in the person's zone).
/// Shared by the terminal listing and the CSV/JSON export.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct AttendanceLine {
    pub person_id: String,
    pub name: String,
    pub workday: String,
    pub check_in: String,
    pub check_out: String,
    pub worked_hours: f64,
    pub overtime_hours: f64,
    pub status_flags: String,
    pub check_in_locked: bool,
    pub check_out_locked: bool,
}

impl AttendanceLine {
    fn from_record(rec: &AttendanceRecord, name: &str, tz: Tz) -> Self {
        let fmt = |v: Option<DateTime<Utc>>| match v {
            Some(dt) => local_hm(dt, tz, rec.workday),
            None => String::new(),
        };
        Self {
            person_id: rec.person_id.clone(),
            name: name.to_string(),
            workday: rec.workday.format("%Y-%m-%d").to_string(),
            check_in: fmt(rec.check_in),
            check_out: fmt(rec.check_out),
            worked_hours: round2(rec.worked_hours),
            overtime_hours: round2(rec.overtime_hours),
            status_flags: flags_to_db(&rec.status_flags),
            check_in_locked: rec.check_in_locked,
            check_out_locked: rec.check_out_locked,
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub struct ListLogic;

impl ListLogic {
    pub fn lines<S: AttendanceStore + PersonDirectory>(
        store: &S,
        org_zone: Option<Tz>,
        person_id: Option<&str>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<AttendanceLine>> {
        let mut people: HashMap<String, (String, Tz)> = HashMap::new();
        for p in store.list()? {
            let tz = p.zone(org_zone)?;
            people.insert(p.id.clone(), (p.display_name().to_string(), tz));
        }

        let fallback_tz = org_zone.unwrap_or(Tz::UTC);
        Ok(store
            .records_between(person_id, from, to)?
            .iter()
            .map(|rec| match people.get(&rec.person_id) {
                Some((name, tz)) => AttendanceLine::from_record(rec, name, *tz),
                None => AttendanceLine::from_record(rec, &rec.person_id, fallback_tz),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::MemoryStore;
    use crate::models::person::Person;

    #[test]
    fn lines_use_person_zone_and_flag_text() {
        let store = MemoryStore::new();
        let mut p = Person::new("p1", "101").with_timezone("Asia/Muscat");
        p.name = "Amal".into();
        store.add_person(p);

        let day: NaiveDate = "2025-08-12".parse().unwrap();
        let mut rec = AttendanceRecord::new("p1", day);
        rec.check_in = Some(
            DateTime::parse_from_rfc3339("2025-08-12T05:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        );
        rec.worked_hours = 7.123;
        rec.status_flags.insert(crate::models::status_flag::StatusFlag::MissingCheckout);
        store.put_record(rec);

        let lines = ListLogic::lines(&store, None, None, day, day).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "Amal");
        assert_eq!(lines[0].check_in, "09:00");
        assert_eq!(lines[0].check_out, "");
        assert_eq!(lines[0].worked_hours, 7.12);
        assert_eq!(lines[0].status_flags, "missing_checkout");
    }
}
