//! Roster import: persons, weekly schedules and shift overrides from YAML.
//!
//! ```yaml
//! persons:
//!   - { id: p1, device_id: "101", name: Alice, timezone: Europe/Rome, calendar_id: std }
//! calendars:
//!   std:
//!     mon: { start_hour: 9, end_hour: 17.5, break_start: 12, break_end: 13 }
//! schedules:
//!   p1:
//!     sat: { start_hour: 0, end_hour: 0 }
//! overrides:
//!   - { id: 1, name: nights, date_from: 2025-08-10, date_to: 2025-08-20,
//!       person_ids: [p1], start_hour: 22, end_hour: 6 }
//! ```

use crate::core::ports::PersonDirectory;
use crate::db::store::SqliteStore;
use crate::errors::{AppError, AppResult};
use crate::models::person::{Person, parse_tz};
use crate::models::schedule::{ScheduleOwner, ShiftHours, ShiftOverride, check_override_overlaps};
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

type WeekLines = BTreeMap<String, ShiftHours>;

#[derive(Debug, Default, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub persons: Vec<Person>,
    #[serde(default)]
    pub calendars: BTreeMap<String, WeekLines>,
    #[serde(default)]
    pub schedules: BTreeMap<String, WeekLines>,
    #[serde(default)]
    pub overrides: Vec<RosterOverride>,
}

#[derive(Debug, Deserialize)]
pub struct RosterOverride {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub person_ids: Vec<String>,
    #[serde(flatten)]
    pub hours: ShiftHours,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub persons: usize,
    pub weekly_lines: usize,
    pub overrides: usize,
}

pub struct ImportLogic;

impl ImportLogic {
    pub fn load(path: &Path) -> AppResult<Roster> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Validate the whole roster, then write it in one transaction.
    pub fn apply(store: &SqliteStore<'_>, roster: &Roster) -> AppResult<ImportSummary> {
        let now = Utc::now();

        // ------------------------------------------------
        // 1) validation (nothing written yet)
        // ------------------------------------------------
        let mut known: HashSet<String> = store.list()?.into_iter().map(|p| p.id).collect();
        for p in &roster.persons {
            if p.id.trim().is_empty() || p.device_id.trim().is_empty() {
                return Err(AppError::InvalidSchedule(
                    "every person needs an id and a device_id".into(),
                ));
            }
            if let Some(tz) = &p.timezone {
                parse_tz(tz)?;
            }
            known.insert(p.id.clone());
        }

        let mut lines: Vec<(ScheduleOwner, Weekday, ShiftHours)> = Vec::new();
        for (cal, week) in &roster.calendars {
            collect_lines(ScheduleOwner::Calendar(cal.clone()), week, &mut lines)?;
        }
        for (pid, week) in &roster.schedules {
            if !known.contains(pid) {
                return Err(AppError::UnknownPerson(pid.clone()));
            }
            collect_lines(ScheduleOwner::Person(pid.clone()), week, &mut lines)?;
        }

        let existing = store.all_overrides()?;
        let mut incoming = Vec::with_capacity(roster.overrides.len());
        for ro in &roster.overrides {
            let created_at = ro.created_at.unwrap_or_else(|| {
                existing
                    .iter()
                    .find(|e| e.id == ro.id)
                    .map_or(now, |e| e.created_at)
            });
            let ov = ShiftOverride {
                id: ro.id,
                name: ro.name.clone(),
                date_from: ro.date_from,
                date_to: ro.date_to,
                person_ids: ro.person_ids.clone(),
                hours: ro.hours,
                created_at,
            };
            ov.validate()?;
            if let Some(p) = ov.person_ids.iter().find(|p| !known.contains(*p)) {
                return Err(AppError::UnknownPerson(p.clone()));
            }
            incoming.push(ov);
        }

        let replaced: HashSet<i64> = incoming.iter().map(|o| o.id).collect();
        let mut combined: Vec<ShiftOverride> = existing
            .into_iter()
            .filter(|o| !replaced.contains(&o.id))
            .collect();
        combined.extend(incoming.iter().cloned());
        check_override_overlaps(&combined)?;

        // ------------------------------------------------
        // 2) write
        // ------------------------------------------------
        let tx = store.conn().unchecked_transaction()?;

        for p in &roster.persons {
            store.upsert_person(p)?;
        }

        let owners: HashSet<&ScheduleOwner> = lines.iter().map(|(o, _, _)| o).collect();
        for owner in owners {
            store.clear_weekly(owner)?;
        }
        for (owner, weekday, hours) in &lines {
            store.set_weekly(owner, *weekday, hours)?;
        }

        for ov in &incoming {
            store.upsert_override(ov)?;
        }

        let summary = ImportSummary {
            persons: roster.persons.len(),
            weekly_lines: lines.len(),
            overrides: incoming.len(),
        };
        crate::db::log::ttlog(
            store.conn(),
            "import",
            "roster",
            &format!(
                "persons={} weekly_lines={} overrides={}",
                summary.persons, summary.weekly_lines, summary.overrides
            ),
        )?;

        tx.commit()?;
        Ok(summary)
    }
}

fn collect_lines(
    owner: ScheduleOwner,
    week: &WeekLines,
    out: &mut Vec<(ScheduleOwner, Weekday, ShiftHours)>,
) -> AppResult<()> {
    for (day, hours) in week {
        let weekday: Weekday = day
            .parse()
            .map_err(|_| AppError::InvalidSchedule(format!("{}: unknown weekday '{day}'", owner.id())))?;
        hours.validate()?;
        out.push((owner.clone(), weekday, *hours));
    }
    Ok(())
}
