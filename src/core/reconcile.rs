//! Merge of a fresh computation into the stored record, plus the
//! at-most-once missing-punch notifications.

use crate::core::calculator::attendance::AttendanceComputation;
use crate::core::ports::{AttendanceStore, AuditLog, NotificationSink};
use crate::errors::AppResult;
use crate::models::attendance::AttendanceRecord;
use crate::models::status_flag::StatusFlag;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Nothing to store (absent, or holiday without punches).
    NoRecord,
    /// A human correction froze the record.
    LockedSkipped,
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciled {
    pub outcome: ReconcileOutcome,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
}

impl Reconciled {
    fn only(outcome: ReconcileOutcome) -> Self {
        Self {
            outcome,
            notifications_sent: 0,
            notifications_failed: 0,
        }
    }
}

pub struct ReconcileLogic<'a> {
    store: &'a dyn AttendanceStore,
    audit: &'a dyn AuditLog,
    sink: &'a dyn NotificationSink,
    recipients: &'a [String],
}

impl<'a> ReconcileLogic<'a> {
    pub fn new(
        store: &'a dyn AttendanceStore,
        audit: &'a dyn AuditLog,
        sink: &'a dyn NotificationSink,
        recipients: &'a [String],
    ) -> Self {
        Self {
            store,
            audit,
            sink,
            recipients,
        }
    }

    pub fn reconcile(
        &self,
        person_id: &str,
        workday: NaiveDate,
        computed: &AttendanceComputation,
    ) -> AppResult<Reconciled> {
        if computed.is_empty() {
            return Ok(Reconciled::only(ReconcileOutcome::NoRecord));
        }

        let mut outcome = ReconcileOutcome::Unchanged;
        let mut stored: Option<AttendanceRecord> = None;

        self.store.in_transaction(&mut || {
            let existing = self.store.find(person_id, workday)?;

            if existing.as_ref().is_some_and(AttendanceRecord::is_locked) {
                outcome = ReconcileOutcome::LockedSkipped;
                return Ok(());
            }

            let mut next = AttendanceRecord::new(person_id, workday);
            next.check_in = computed.check_in;
            next.check_out = computed.check_out;
            next.worked_hours = computed.worked_hours;
            next.overtime_hours = computed.overtime_hours;
            next.status_flags = computed.status_flags.clone();
            if let Some(ex) = &existing {
                next.notified = ex.notified;
            }

            outcome = match &existing {
                None => ReconcileOutcome::Created,
                Some(ex) if *ex == next => ReconcileOutcome::Unchanged,
                Some(_) => ReconcileOutcome::Updated,
            };
            if outcome != ReconcileOutcome::Unchanged {
                self.store.upsert(&next)?;
            }
            stored = Some(next);
            Ok(())
        })?;

        let Some(mut record) = stored else {
            debug!(person = person_id, %workday, "locked record left untouched");
            self.audit.audit(
                "skip_locked",
                &format!("{person_id}@{workday}"),
                "manual correction present, automatic update skipped",
            )?;
            return Ok(Reconciled::only(outcome));
        };

        let (sent, failed) = self.notify_pending(&mut record)?;
        if sent > 0 {
            // markers only; the record itself is already durable
            self.store.upsert(&record)?;
        }

        Ok(Reconciled {
            outcome,
            notifications_sent: sent,
            notifications_failed: failed,
        })
    }

    fn notify_pending(&self, record: &mut AttendanceRecord) -> AppResult<(usize, usize)> {
        let pending: Vec<StatusFlag> = record
            .status_flags
            .iter()
            .copied()
            .filter(|f| f.is_notifiable() && !record.notified.is_sent(*f))
            .collect();

        let mut sent = 0;
        let mut failed = 0;
        for flag in pending {
            match self.sink.notify(record, self.recipients, flag) {
                Ok(()) => {
                    record.notified.mark(flag);
                    sent += 1;
                    info!(record = %record.key(), reason = %flag, "notification emitted");
                    self.audit.audit("notify", &record.key(), flag.to_db_str())?;
                }
                Err(e) => {
                    failed += 1;
                    warn!(record = %record.key(), reason = %flag, error = %e, "notification failed");
                    self.audit
                        .audit("notify_failed", &record.key(), &e.to_string())?;
                }
            }
        }
        Ok((sent, failed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::MemoryStore;
    use crate::models::status_flag::StatusFlags;
    use chrono::{DateTime, Utc};

    fn day() -> NaiveDate {
        "2025-08-12".parse().unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn open_check_in() -> AttendanceComputation {
        AttendanceComputation {
            check_in: Some(utc("2025-08-12T08:10:00Z")),
            check_out: None,
            status_flags: StatusFlags::from([StatusFlag::MissingCheckout, StatusFlag::EarlyCheckin]),
            worked_hours: 0.0,
            overtime_hours: 0.0,
        }
    }

    fn full_day() -> AttendanceComputation {
        AttendanceComputation {
            check_in: Some(utc("2025-08-12T09:00:00Z")),
            check_out: Some(utc("2025-08-12T17:30:00Z")),
            status_flags: StatusFlags::new(),
            worked_hours: 7.5,
            overtime_hours: 0.0,
        }
    }

    fn recipients() -> Vec<String> {
        vec!["hr@example.com".to_string()]
    }

    #[test]
    fn empty_computation_writes_nothing() {
        let store = MemoryStore::new();
        let rcpt = recipients();
        let logic = ReconcileLogic::new(&store, &store, &store, &rcpt);

        let r = logic
            .reconcile("p1", day(), &AttendanceComputation::default())
            .unwrap();
        assert_eq!(r.outcome, ReconcileOutcome::NoRecord);
        assert!(store.records().is_empty());
    }

    #[test]
    fn repeated_reconcile_is_idempotent_and_notifies_once() {
        let store = MemoryStore::new();
        let rcpt = recipients();
        let logic = ReconcileLogic::new(&store, &store, &store, &rcpt);

        let first = logic.reconcile("p1", day(), &open_check_in()).unwrap();
        assert_eq!(first.outcome, ReconcileOutcome::Created);
        assert_eq!(first.notifications_sent, 1);
        let after_first = store.records();

        let second = logic.reconcile("p1", day(), &open_check_in()).unwrap();
        assert_eq!(second.outcome, ReconcileOutcome::Unchanged);
        assert_eq!(second.notifications_sent, 0);
        assert_eq!(store.records(), after_first);

        let sent = store.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].reason, StatusFlag::MissingCheckout);
        assert_eq!(sent[0].recipients, rcpt);
        assert!(after_first[0].notified.missing_checkout);
    }

    #[test]
    fn update_overwrites_values_but_keeps_markers() {
        let store = MemoryStore::new();
        let rcpt = recipients();
        let logic = ReconcileLogic::new(&store, &store, &store, &rcpt);

        logic.reconcile("p1", day(), &open_check_in()).unwrap();
        let r = logic.reconcile("p1", day(), &full_day()).unwrap();
        assert_eq!(r.outcome, ReconcileOutcome::Updated);

        let rec = store.find("p1", day()).unwrap().unwrap();
        assert_eq!(rec.check_in, full_day().check_in);
        assert!(rec.status_flags.is_empty());
        assert!(rec.notified.missing_checkout);
    }

    #[test]
    fn locked_record_is_never_touched() {
        let store = MemoryStore::new();
        let rcpt = recipients();
        let mut locked = AttendanceRecord::new("p1", day());
        locked.check_in = Some(utc("2025-08-12T09:00:00Z"));
        locked.check_in_locked = true;
        store.put_record(locked.clone());

        let logic = ReconcileLogic::new(&store, &store, &store, &rcpt);
        let r = logic.reconcile("p1", day(), &open_check_in()).unwrap();

        assert_eq!(r.outcome, ReconcileOutcome::LockedSkipped);
        assert_eq!(store.find("p1", day()).unwrap(), Some(locked));
        assert!(store.sent().is_empty());
        assert_eq!(store.upsert_count(), 0);
        assert!(
            store
                .audit_lines()
                .iter()
                .any(|(op, target, _)| op == "skip_locked" && target == "p1@2025-08-12")
        );
    }

    #[test]
    fn failed_notification_is_retried_on_next_pass() {
        let store = MemoryStore::new();
        let rcpt = recipients();
        let logic = ReconcileLogic::new(&store, &store, &store, &rcpt);

        store.fail_notifications(true);
        let r = logic.reconcile("p1", day(), &open_check_in()).unwrap();
        assert_eq!(r.outcome, ReconcileOutcome::Created);
        assert_eq!(r.notifications_failed, 1);
        // the record is durable even though delivery failed
        let rec = store.find("p1", day()).unwrap().unwrap();
        assert!(!rec.notified.missing_checkout);

        store.fail_notifications(false);
        let r = logic.reconcile("p1", day(), &open_check_in()).unwrap();
        assert_eq!(r.notifications_sent, 1);
        assert_eq!(store.sent().len(), 1);
    }
}
