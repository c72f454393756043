//! Contracts of the collaborators the engine reads from and writes to.
//!
//! All methods take `&self`: the SQLite store shares one connection and the
//! in-memory double uses interior mutability, so one value can stand behind
//! several of these traits at once.

use crate::errors::AppResult;
use crate::models::attendance::AttendanceRecord;
use crate::models::person::Person;
use crate::models::punch::{DevicePunch, RawPunch};
use crate::models::schedule::{ScheduleOwner, ShiftOverride, WeeklyEntry};
use crate::models::status_flag::StatusFlag;
use chrono::{DateTime, NaiveDate, Utc, Weekday};

pub trait PersonDirectory {
    fn lookup_by_device_id(&self, device_id: &str) -> AppResult<Option<Person>>;
    fn get(&self, person_id: &str) -> AppResult<Option<Person>>;
    fn list(&self) -> AppResult<Vec<Person>>;
}

pub trait ScheduleRepository {
    /// Overrides naming `person_id` whose date range contains `date`.
    fn overrides_for(&self, person_id: &str, date: NaiveDate) -> AppResult<Vec<ShiftOverride>>;
    fn weekly_entry(&self, owner: &ScheduleOwner, weekday: Weekday)
    -> AppResult<Option<WeeklyEntry>>;
}

/// Exactly one row per (person, workday).
pub trait AttendanceStore {
    fn find(&self, person_id: &str, workday: NaiveDate) -> AppResult<Option<AttendanceRecord>>;
    fn upsert(&self, record: &AttendanceRecord) -> AppResult<()>;

    /// Run a read-modify-write of one record atomically.
    fn in_transaction(&self, work: &mut dyn FnMut() -> AppResult<()>) -> AppResult<()> {
        work()
    }

    fn records_between(
        &self,
        person_id: Option<&str>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<AttendanceRecord>>;
}

/// Append-only raw punch log keyed by (person, UTC instant).
pub trait RawLogStore {
    fn exists_by_key(&self, person_id: &str, utc: DateTime<Utc>) -> AppResult<bool>;
    fn insert(&self, punch: &RawPunch) -> AppResult<()>;
    fn punches_between(
        &self,
        person_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<RawPunch>>;
}

/// Fire-and-log delivery of operator notifications.
pub trait NotificationSink {
    fn notify(
        &self,
        record: &AttendanceRecord,
        recipients: &[String],
        reason: StatusFlag,
    ) -> AppResult<()>;
}

pub trait WatermarkStore {
    fn high_watermark(&self, source: &str) -> AppResult<Option<DateTime<Utc>>>;
    fn set_high_watermark(&self, source: &str, instant: DateTime<Utc>) -> AppResult<()>;
}

/// Durable trail of auditable events (sync runs, skips, corrections).
pub trait AuditLog {
    fn audit(&self, operation: &str, target: &str, message: &str) -> AppResult<()>;
}

/// Everything a sync pass reads from and writes to, behind one handle.
pub trait AttendanceBackend:
    PersonDirectory + ScheduleRepository + AttendanceStore + RawLogStore + WatermarkStore + AuditLog
{
}

impl<T> AttendanceBackend for T where
    T: PersonDirectory
        + ScheduleRepository
        + AttendanceStore
        + RawLogStore
        + WatermarkStore
        + AuditLog
{
}

/// A finite, already fetched batch of device punches.
pub trait PunchSource {
    fn source_id(&self) -> &str;
    fn fetch(&mut self) -> AppResult<Vec<DevicePunch>>;
}
