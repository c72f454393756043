//! Punch aggregation: one de-duplicated, sorted punch list per
//! (person, workday).

use crate::core::calculator::interval::hour_to_local;
use crate::core::calculator::shift::ShiftResolver;
use crate::core::calculator::workday::assign_workday;
use crate::core::policy::Policy;
use crate::core::ports::RawLogStore;
use crate::errors::AppResult;
use crate::models::person::Person;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkdayKey {
    pub person_id: String,
    pub workday: NaiveDate,
}

impl WorkdayKey {
    pub fn new(person_id: &str, workday: NaiveDate) -> Self {
        Self {
            person_id: person_id.to_string(),
            workday,
        }
    }
}

/// Accumulates punch instants per key. Exact-instant duplicates collapse.
#[derive(Debug, Default)]
pub struct PunchAggregator {
    groups: BTreeMap<WorkdayKey, Vec<DateTime<Utc>>>,
}

impl PunchAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: WorkdayKey, punch: DateTime<Utc>) {
        self.groups.entry(key).or_default().push(punch);
    }

    pub fn extend(&mut self, key: &WorkdayKey, punches: impl IntoIterator<Item = DateTime<Utc>>) {
        self.groups.entry(key.clone()).or_default().extend(punches);
    }

    pub fn keys(&self) -> Vec<WorkdayKey> {
        self.groups.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Partitions in (person, workday) order, each sorted and de-duplicated.
    pub fn into_partitions(self) -> Vec<(WorkdayKey, Vec<DateTime<Utc>>)> {
        self.groups
            .into_iter()
            .map(|(k, v)| (k, dedup_sorted(v)))
            .collect()
    }
}

pub fn dedup_sorted(mut punches: Vec<DateTime<Utc>>) -> Vec<DateTime<Utc>> {
    punches.sort();
    punches.dedup();
    punches
}

/// Raw-log punches of `person` that belong to `workday`.
///
/// Only the punch's own date or the day after can map to `workday`, so the
/// lookup covers those two local days and re-runs the assignment on each hit.
pub fn stored_punches_for(
    raw_log: &dyn RawLogStore,
    resolver: &ShiftResolver<'_>,
    person: &Person,
    tz: Tz,
    workday: NaiveDate,
    policy: &Policy,
) -> AppResult<Vec<DateTime<Utc>>> {
    let from = hour_to_local(workday, 0.0, tz).with_timezone(&Utc);
    let to = hour_to_local(workday + Duration::days(2), 0.0, tz).with_timezone(&Utc)
        - Duration::seconds(1);

    let mut out = Vec::new();
    for raw in raw_log.punches_between(&person.id, from, to)? {
        let assigned = assign_workday(resolver, person, raw.local_in(tz), policy)?;
        if assigned.workday == workday {
            out.push(raw.utc);
        }
    }
    Ok(out)
}
