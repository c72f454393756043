//! One reconciliation pass over a batch of device punches.
//!
//! Flow: resolve person -> localize -> raw log -> assign workday ->
//! aggregate -> compute -> reconcile, then advance the source watermark.

use crate::core::calculator::aggregate::{PunchAggregator, WorkdayKey, stored_punches_for};
use crate::core::calculator::attendance::process_attendance;
use crate::core::calculator::interval::localize;
use crate::core::calculator::shift::ShiftResolver;
use crate::core::calculator::workday::{WorkdayBasis, assign_workday};
use crate::core::policy::Policy;
use crate::core::ports::{AttendanceBackend, NotificationSink, PunchSource};
use crate::core::reconcile::{ReconcileLogic, ReconcileOutcome};
use crate::errors::{AppError, AppResult};
use crate::models::person::Person;
use crate::models::punch::RawPunch;
use crate::models::status_flag::StatusFlag;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub now: DateTime<Utc>,
    /// Skip punches at or before the source's high-watermark.
    pub since_watermark: bool,
    /// 0 = no age limit.
    pub days_to_sync: i64,
    pub org_zone: Option<Tz>,
    pub recipients: Vec<String>,
}

impl SyncOptions {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            since_watermark: false,
            days_to_sync: 0,
            org_zone: None,
            recipients: Vec::new(),
        }
    }

    fn cutoff(&self) -> Option<DateTime<Utc>> {
        (self.days_to_sync > 0).then(|| self.now - Duration::days(self.days_to_sync))
    }
}

/// Counters surfaced to the operator after a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub punches_read: usize,
    pub unresolved: usize,
    pub duplicates: usize,
    pub too_old: usize,
    pub before_watermark: usize,
    pub fallback_workdays: usize,
    pub partitions: usize,
    pub no_record: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub locked_skipped: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
}

impl BatchSummary {
    /// The pass as a single success/failure.
    pub fn into_result(self) -> AppResult<Self> {
        if self.notifications_failed > 0 {
            return Err(AppError::NotificationFailure {
                count: self.notifications_failed,
            });
        }
        Ok(self)
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read {}, unresolved {}, duplicates {}, too old {}, before watermark {}, \
             fallback workdays {} | records: created {}, updated {}, unchanged {}, \
             locked {}, none {} | notifications: sent {}, failed {}",
            self.punches_read,
            self.unresolved,
            self.duplicates,
            self.too_old,
            self.before_watermark,
            self.fallback_workdays,
            self.created,
            self.updated,
            self.unchanged,
            self.locked_skipped,
            self.no_record,
            self.notifications_sent,
            self.notifications_failed,
        )
    }
}

pub struct SyncLogic<'a, S: AttendanceBackend> {
    store: &'a S,
    sink: &'a dyn NotificationSink,
    policy: Policy,
}

impl<'a, S: AttendanceBackend> SyncLogic<'a, S> {
    pub fn new(store: &'a S, sink: &'a dyn NotificationSink, policy: Policy) -> Self {
        Self {
            store,
            sink,
            policy,
        }
    }

    pub fn run(&self, source: &mut dyn PunchSource, opts: &SyncOptions) -> AppResult<BatchSummary> {
        let source_id = source.source_id().to_string();
        let mut summary = BatchSummary::default();

        self.store
            .audit("sync_start", &source_id, &format!("now={}", opts.now.to_rfc3339()))?;

        let batch = source.fetch()?;
        info!(source = %source_id, punches = batch.len(), "sync pass started");

        let resolver = ShiftResolver::new(self.store);
        let cutoff = opts.cutoff();
        let watermark = if opts.since_watermark {
            self.store.high_watermark(&source_id)?
        } else {
            None
        };

        let mut people: HashMap<String, Option<(Person, Tz)>> = HashMap::new();
        let mut aggregator = PunchAggregator::new();
        let mut latest: Option<DateTime<Utc>> = None;

        // ------------------------------------------------
        // 1) ingest: attribute, localize, log, assign
        // ------------------------------------------------
        for dp in batch {
            summary.punches_read += 1;

            if !people.contains_key(&dp.user_id) {
                let found = match self.store.lookup_by_device_id(&dp.user_id)? {
                    Some(p) => {
                        let tz = p.zone(opts.org_zone)?;
                        Some((p, tz))
                    }
                    None => None,
                };
                people.insert(dp.user_id.clone(), found);
            }
            let Some(Some((person, tz))) = people.get(&dp.user_id) else {
                warn!(device_user = %dp.user_id, "punch from unknown device user dropped");
                summary.unresolved += 1;
                continue;
            };

            let local = localize(dp.timestamp, *tz);
            let utc = local.with_timezone(&Utc);

            if cutoff.is_some_and(|c| utc < c) {
                summary.too_old += 1;
                continue;
            }
            if watermark.is_some_and(|w| utc <= w) {
                summary.before_watermark += 1;
                continue;
            }

            let raw = RawPunch {
                person_id: person.id.clone(),
                device_id: dp.user_id.clone(),
                utc,
                local: dp.timestamp,
                status_code: dp.status,
                direction_hint: dp.punch,
            };
            if self.store.exists_by_key(&raw.person_id, raw.utc)? {
                summary.duplicates += 1;
            } else {
                self.store.insert(&raw)?;
            }

            let assigned = assign_workday(&resolver, person, local, &self.policy)?;
            if assigned.basis == WorkdayBasis::Fallback {
                summary.fallback_workdays += 1;
            }
            aggregator.add(WorkdayKey::new(&person.id, assigned.workday), utc);
            latest = latest.max(Some(utc));
        }

        // ------------------------------------------------
        // 2) open records: give the abandonment timeout a chance
        // ------------------------------------------------
        let today = opts.now.date_naive();
        let window_start = cutoff.map_or(today - Duration::days(30), |c| c.date_naive());
        for rec in self.store.records_between(None, window_start, today)? {
            if rec.check_out.is_none() && rec.has(StatusFlag::MissingCheckout) && !rec.is_locked() {
                aggregator.extend(&WorkdayKey::new(&rec.person_id, rec.workday), []);
            }
        }

        // ------------------------------------------------
        // 3) compute and reconcile, one (person, workday) at a time
        // ------------------------------------------------
        let reconciler =
            ReconcileLogic::new(self.store, self.store, self.sink, &opts.recipients);

        for (key, mut punches) in aggregator.into_partitions() {
            summary.partitions += 1;

            let Some(person) = self.store.get(&key.person_id)? else {
                continue;
            };
            let tz = person.zone(opts.org_zone)?;

            punches.extend(stored_punches_for(
                self.store,
                &resolver,
                &person,
                tz,
                key.workday,
                &self.policy,
            )?);

            let shift = resolver.resolve(&person, tz, key.workday)?;
            let computed = process_attendance(&punches, &shift, &self.policy, opts.now);
            let done = reconciler.reconcile(&key.person_id, key.workday, &computed)?;

            debug!(person = %key.person_id, workday = %key.workday, outcome = ?done.outcome, "partition done");
            match done.outcome {
                ReconcileOutcome::NoRecord => summary.no_record += 1,
                ReconcileOutcome::LockedSkipped => summary.locked_skipped += 1,
                ReconcileOutcome::Created => summary.created += 1,
                ReconcileOutcome::Updated => summary.updated += 1,
                ReconcileOutcome::Unchanged => summary.unchanged += 1,
            }
            summary.notifications_sent += done.notifications_sent;
            summary.notifications_failed += done.notifications_failed;
        }

        // ------------------------------------------------
        // 4) watermark only moves forward
        // ------------------------------------------------
        if let Some(latest) = latest {
            let current = self.store.high_watermark(&source_id)?;
            if current.is_none_or(|c| latest > c) {
                self.store.set_high_watermark(&source_id, latest)?;
            }
        }

        self.store.audit("sync_end", &source_id, &summary.to_string())?;
        info!(source = %source_id, %summary, "sync pass finished");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::MemoryStore;
    use crate::core::ports::{AttendanceStore, WatermarkStore};
    use crate::models::attendance::AttendanceRecord;
    use crate::models::schedule::{ScheduleOwner, ShiftHours};
    use crate::sources::vec::VecPunchSource;
    use chrono::{NaiveDate, NaiveDateTime, Weekday};

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        ts(s).and_utc()
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.add_person(Person::new("p1", "101"));
        store.add_person(Person::new("p2", "202"));
        store.set_workweek(
            ScheduleOwner::Person("p1".into()),
            ShiftHours::new(9.0, 17.5).with_break(12.0, 13.0),
        );
        store.set_weekly(
            ScheduleOwner::Person("p2".into()),
            Weekday::Fri,
            ShiftHours::new(22.0, 6.0),
        );
        store
    }

    fn opts(now: &str) -> SyncOptions {
        let mut o = SyncOptions::new(utc(now));
        o.recipients = vec!["hr".into()];
        o
    }

    #[test]
    fn full_pass_builds_records_and_counts() {
        let store = store();
        let mut source = VecPunchSource::new("dev-1")
            .punch("101", ts("2025-08-12 08:58"))
            .punch("101", ts("2025-08-12 12:01"))
            .punch("101", ts("2025-08-12 12:59"))
            .punch("101", ts("2025-08-12 17:02"))
            .punch("999", ts("2025-08-12 09:00"))
            .punch("202", ts("2025-08-15 21:50"))
            .punch("202", ts("2025-08-16 00:40"))
            .punch("202", ts("2025-08-16 06:05"));

        let logic = SyncLogic::new(&store, &store, Policy::default());
        let s = logic.run(&mut source, &opts("2025-08-16 12:00")).unwrap();

        assert_eq!(s.punches_read, 8);
        assert_eq!(s.unresolved, 1);
        assert_eq!(s.created, 2);
        assert_eq!(store.raw_punch_count(), 7);

        let day = store.find("p1", d("2025-08-12")).unwrap().unwrap();
        assert!((day.worked_hours - 7.10).abs() < 1e-9);

        // the whole night lands on Friday
        let night = store.find("p2", d("2025-08-15")).unwrap().unwrap();
        assert_eq!(night.check_out, Some(utc("2025-08-16 06:05")));
        assert!(night.has(StatusFlag::NightShift));
        assert!(store.find("p2", d("2025-08-16")).unwrap().is_none());

        assert_eq!(
            store.high_watermark("dev-1").unwrap(),
            Some(utc("2025-08-16 06:05"))
        );
    }

    #[test]
    fn rerunning_the_same_batch_changes_nothing() {
        let store = store();
        let batch = VecPunchSource::new("dev-1").punch("101", ts("2025-08-12 08:10"));
        let logic = SyncLogic::new(&store, &store, Policy::default());

        let first = logic
            .run(&mut batch.clone(), &opts("2025-08-12 12:00"))
            .unwrap();
        assert_eq!(first.created, 1);
        assert_eq!(first.notifications_sent, 1);
        let snapshot = store.records();

        let second = logic
            .run(&mut batch.clone(), &opts("2025-08-12 12:00"))
            .unwrap();
        assert_eq!(second.duplicates, 1);
        assert_eq!(second.unchanged, 1);
        assert_eq!(second.notifications_sent, 0);
        assert_eq!(store.records(), snapshot);
        assert_eq!(store.sent().len(), 1);
    }

    #[test]
    fn later_punch_completes_an_open_record() {
        let store = store();
        let logic = SyncLogic::new(&store, &store, Policy::default());

        logic
            .run(
                &mut VecPunchSource::new("dev-1").punch("101", ts("2025-08-12 09:00")),
                &opts("2025-08-12 12:00"),
            )
            .unwrap();
        let s = logic
            .run(
                &mut VecPunchSource::new("dev-1").punch("101", ts("2025-08-12 17:30")),
                &opts("2025-08-12 18:00"),
            )
            .unwrap();
        assert_eq!(s.updated, 1);

        let rec = store.find("p1", d("2025-08-12")).unwrap().unwrap();
        assert_eq!(rec.check_in, Some(utc("2025-08-12 09:00")));
        assert_eq!(rec.check_out, Some(utc("2025-08-12 17:30")));
        assert!(!rec.has(StatusFlag::MissingCheckout));
        // marker stays sticky
        assert!(rec.notified.missing_checkout);
    }

    #[test]
    fn open_record_is_auto_closed_by_a_later_empty_pass() {
        let store = store();
        let logic = SyncLogic::new(&store, &store, Policy::default());
        logic
            .run(
                &mut VecPunchSource::new("dev-1").punch("101", ts("2025-08-12 09:00")),
                &opts("2025-08-12 12:00"),
            )
            .unwrap();

        logic
            .run(&mut VecPunchSource::new("dev-1"), &opts("2025-08-13 04:00"))
            .unwrap();
        let rec = store.find("p1", d("2025-08-12")).unwrap().unwrap();
        assert_eq!(rec.check_out, Some(utc("2025-08-13 03:00")));
        assert!(rec.has(StatusFlag::MissingCheckout));
    }

    #[test]
    fn locked_records_are_counted_not_touched() {
        let store = store();
        let mut rec = AttendanceRecord::new("p1", d("2025-08-12"));
        rec.check_in = Some(utc("2025-08-12 09:00"));
        rec.check_out = Some(utc("2025-08-12 17:30"));
        rec.check_out_locked = true;
        store.put_record(rec.clone());

        let logic = SyncLogic::new(&store, &store, Policy::default());
        let s = logic
            .run(
                &mut VecPunchSource::new("dev-1").punch("101", ts("2025-08-12 08:00")),
                &opts("2025-08-12 20:00"),
            )
            .unwrap();
        assert_eq!(s.locked_skipped, 1);
        assert_eq!(store.find("p1", d("2025-08-12")).unwrap(), Some(rec));
    }

    #[test]
    fn age_limit_and_watermark_filter_punches() {
        let store = store();
        store
            .set_high_watermark("dev-1", utc("2025-08-12 10:00"))
            .unwrap();
        let mut o = opts("2025-08-12 20:00");
        o.days_to_sync = 30;
        o.since_watermark = true;

        let logic = SyncLogic::new(&store, &store, Policy::default());
        let s = logic
            .run(
                &mut VecPunchSource::new("dev-1")
                    .punch("101", ts("2025-06-01 09:00"))
                    .punch("101", ts("2025-08-12 09:00"))
                    .punch("101", ts("2025-08-12 17:30")),
                &o,
            )
            .unwrap();
        assert_eq!(s.too_old, 1);
        assert_eq!(s.before_watermark, 1);
        assert_eq!(store.raw_punch_count(), 1);
    }

    #[test]
    fn failed_notifications_fail_the_batch_after_writing() {
        let store = store();
        store.fail_notifications(true);
        let logic = SyncLogic::new(&store, &store, Policy::default());
        let s = logic
            .run(
                &mut VecPunchSource::new("dev-1").punch("101", ts("2025-08-12 09:00")),
                &opts("2025-08-12 12:00"),
            )
            .unwrap();
        assert_eq!(s.created, 1);
        let err = s.into_result().unwrap_err();
        assert!(matches!(err, AppError::NotificationFailure { count: 1 }));
        assert!(err.is_retryable());
    }
}
