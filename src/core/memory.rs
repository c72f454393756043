//! In-memory implementation of every collaborator contract.
//!
//! Test double for the engine.

use crate::core::ports::{
    AttendanceStore, AuditLog, NotificationSink, PersonDirectory, RawLogStore,
    ScheduleRepository, WatermarkStore,
};
use crate::errors::{AppError, AppResult};
use crate::models::attendance::AttendanceRecord;
use crate::models::person::Person;
use crate::models::punch::RawPunch;
use crate::models::schedule::{ScheduleOwner, ShiftHours, ShiftOverride, WeeklyEntry};
use crate::models::status_flag::StatusFlag;
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

/// A notification captured by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentNotification {
    pub person_id: String,
    pub workday: NaiveDate,
    pub reason: StatusFlag,
    pub recipients: Vec<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    persons: RefCell<Vec<Person>>,
    weekly: RefCell<HashMap<(ScheduleOwner, Weekday), ShiftHours>>,
    overrides: RefCell<Vec<ShiftOverride>>,
    attendance: RefCell<BTreeMap<(String, NaiveDate), AttendanceRecord>>,
    raw: RefCell<BTreeMap<(String, DateTime<Utc>), RawPunch>>,
    watermarks: RefCell<HashMap<String, DateTime<Utc>>>,
    sent: RefCell<Vec<SentNotification>>,
    audit: RefCell<Vec<(String, String, String)>>,
    fail_notifications: Cell<bool>,
    upserts: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_person(&self, person: Person) {
        self.persons.borrow_mut().push(person);
    }

    pub fn set_weekly(&self, owner: ScheduleOwner, weekday: Weekday, hours: ShiftHours) {
        self.weekly.borrow_mut().insert((owner, weekday), hours);
    }

    /// Same hours Monday to Friday.
    pub fn set_workweek(&self, owner: ScheduleOwner, hours: ShiftHours) {
        for wd in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ] {
            self.set_weekly(owner.clone(), wd, hours);
        }
    }

    pub fn add_override(&self, ov: ShiftOverride) {
        self.overrides.borrow_mut().push(ov);
    }

    /// Put a record in place as if an operator had stored it.
    pub fn put_record(&self, record: AttendanceRecord) {
        self.attendance
            .borrow_mut()
            .insert((record.person_id.clone(), record.workday), record);
    }

    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.attendance.borrow().values().cloned().collect()
    }

    pub fn raw_punch_count(&self) -> usize {
        self.raw.borrow().len()
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.borrow().clone()
    }

    /// Audit lines as (operation, target, message).
    pub fn audit_lines(&self) -> Vec<(String, String, String)> {
        self.audit.borrow().clone()
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.get()
    }

    pub fn fail_notifications(&self, fail: bool) {
        self.fail_notifications.set(fail);
    }
}

impl PersonDirectory for MemoryStore {
    fn lookup_by_device_id(&self, device_id: &str) -> AppResult<Option<Person>> {
        Ok(self
            .persons
            .borrow()
            .iter()
            .find(|p| p.device_id == device_id)
            .cloned())
    }

    fn get(&self, person_id: &str) -> AppResult<Option<Person>> {
        Ok(self
            .persons
            .borrow()
            .iter()
            .find(|p| p.id == person_id)
            .cloned())
    }

    fn list(&self) -> AppResult<Vec<Person>> {
        Ok(self.persons.borrow().clone())
    }
}

impl ScheduleRepository for MemoryStore {
    fn overrides_for(&self, person_id: &str, date: NaiveDate) -> AppResult<Vec<ShiftOverride>> {
        Ok(self
            .overrides
            .borrow()
            .iter()
            .filter(|o| o.covers(person_id, date))
            .cloned()
            .collect())
    }

    fn weekly_entry(
        &self,
        owner: &ScheduleOwner,
        weekday: Weekday,
    ) -> AppResult<Option<WeeklyEntry>> {
        Ok(self
            .weekly
            .borrow()
            .get(&(owner.clone(), weekday))
            .map(|hours| WeeklyEntry {
                owner: owner.clone(),
                weekday,
                hours: *hours,
            }))
    }
}

impl AttendanceStore for MemoryStore {
    fn find(&self, person_id: &str, workday: NaiveDate) -> AppResult<Option<AttendanceRecord>> {
        Ok(self
            .attendance
            .borrow()
            .get(&(person_id.to_string(), workday))
            .cloned())
    }

    fn upsert(&self, record: &AttendanceRecord) -> AppResult<()> {
        self.upserts.set(self.upserts.get() + 1);
        self.put_record(record.clone());
        Ok(())
    }

    fn records_between(
        &self,
        person_id: Option<&str>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<AttendanceRecord>> {
        Ok(self
            .attendance
            .borrow()
            .values()
            .filter(|r| r.workday >= from && r.workday <= to)
            .filter(|r| person_id.is_none_or(|p| p == r.person_id))
            .cloned()
            .collect())
    }
}

impl RawLogStore for MemoryStore {
    fn exists_by_key(&self, person_id: &str, utc: DateTime<Utc>) -> AppResult<bool> {
        Ok(self
            .raw
            .borrow()
            .contains_key(&(person_id.to_string(), utc)))
    }

    fn insert(&self, punch: &RawPunch) -> AppResult<()> {
        self.raw
            .borrow_mut()
            .entry((punch.person_id.clone(), punch.utc))
            .or_insert_with(|| punch.clone());
        Ok(())
    }

    fn punches_between(
        &self,
        person_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<RawPunch>> {
        Ok(self
            .raw
            .borrow()
            .values()
            .filter(|p| p.person_id == person_id && p.utc >= from && p.utc <= to)
            .cloned()
            .collect())
    }
}

impl NotificationSink for MemoryStore {
    fn notify(
        &self,
        record: &AttendanceRecord,
        recipients: &[String],
        reason: StatusFlag,
    ) -> AppResult<()> {
        if self.fail_notifications.get() {
            return Err(AppError::Notify("sink offline".into()));
        }
        self.sent.borrow_mut().push(SentNotification {
            person_id: record.person_id.clone(),
            workday: record.workday,
            reason,
            recipients: recipients.to_vec(),
        });
        Ok(())
    }
}

impl WatermarkStore for MemoryStore {
    fn high_watermark(&self, source: &str) -> AppResult<Option<DateTime<Utc>>> {
        Ok(self.watermarks.borrow().get(source).copied())
    }

    fn set_high_watermark(&self, source: &str, instant: DateTime<Utc>) -> AppResult<()> {
        self.watermarks
            .borrow_mut()
            .insert(source.to_string(), instant);
        Ok(())
    }
}

impl AuditLog for MemoryStore {
    fn audit(&self, operation: &str, target: &str, message: &str) -> AppResult<()> {
        self.audit.borrow_mut().push((
            operation.to_string(),
            target.to_string(),
            message.to_string(),
        ));
        Ok(())
    }
}
