//! SQLite implementation of the collaborator contracts.
//!
//! Instants are stored as RFC 3339 UTC strings with a `Z` suffix and whole
//! seconds, so lexical order is chronological order.

use crate::core::ports::{
    AttendanceStore, AuditLog, NotificationSink, PersonDirectory, RawLogStore,
    ScheduleRepository, WatermarkStore,
};
use crate::db::log::ttlog;
use crate::errors::{AppError, AppResult};
use crate::models::attendance::{AttendanceRecord, NotificationMarkers};
use crate::models::person::Person;
use crate::models::punch::RawPunch;
use crate::models::schedule::{
    ScheduleOwner, ShiftHours, ShiftOverride, WeeklyEntry, weekday_from_index,
};
use crate::models::status_flag::{StatusFlag, flags_from_db, flags_to_db};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc, Weekday};
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn fmt_instant(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_instant(s: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| AppError::InvalidDate(s.to_string()))
}

fn fmt_day(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn parse_day(s: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| AppError::InvalidDate(s.to_string()))
}

fn map_person(row: &Row) -> rusqlite::Result<Person> {
    Ok(Person {
        id: row.get(0)?,
        device_id: row.get(1)?,
        name: row.get(2)?,
        timezone: row.get(3)?,
        calendar_id: row.get(4)?,
    })
}

/// Attendance row as stored, before text columns are parsed.
struct AttendanceRow {
    person_id: String,
    workday: String,
    check_in: Option<String>,
    check_out: Option<String>,
    worked_hours: f64,
    overtime_hours: f64,
    status_flags: String,
    check_in_locked: bool,
    check_out_locked: bool,
    notified_missing_checkin: bool,
    notified_missing_checkout: bool,
}

const ATTENDANCE_COLUMNS: &str = "person_id, workday, check_in, check_out, worked_hours, \
     overtime_hours, status_flags, check_in_locked, check_out_locked, \
     notified_missing_checkin, notified_missing_checkout";

fn map_attendance(row: &Row) -> rusqlite::Result<AttendanceRow> {
    Ok(AttendanceRow {
        person_id: row.get(0)?,
        workday: row.get(1)?,
        check_in: row.get(2)?,
        check_out: row.get(3)?,
        worked_hours: row.get(4)?,
        overtime_hours: row.get(5)?,
        status_flags: row.get(6)?,
        check_in_locked: row.get(7)?,
        check_out_locked: row.get(8)?,
        notified_missing_checkin: row.get(9)?,
        notified_missing_checkout: row.get(10)?,
    })
}

impl AttendanceRow {
    fn into_record(self) -> AppResult<AttendanceRecord> {
        Ok(AttendanceRecord {
            person_id: self.person_id,
            workday: parse_day(&self.workday)?,
            check_in: self.check_in.as_deref().map(parse_instant).transpose()?,
            check_out: self.check_out.as_deref().map(parse_instant).transpose()?,
            worked_hours: self.worked_hours,
            overtime_hours: self.overtime_hours,
            status_flags: flags_from_db(&self.status_flags)?,
            check_in_locked: self.check_in_locked,
            check_out_locked: self.check_out_locked,
            notified: NotificationMarkers {
                missing_checkin: self.notified_missing_checkin,
                missing_checkout: self.notified_missing_checkout,
            },
        })
    }
}

pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn conn(&self) -> &Connection {
        self.conn
    }

    // ---------------------------
    // Directory administration
    // ---------------------------

    pub fn upsert_person(&self, p: &Person) -> AppResult<()> {
        self.conn.execute(
            "INSERT INTO persons (id, device_id, name, timezone, calendar_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                device_id = excluded.device_id,
                name = excluded.name,
                timezone = excluded.timezone,
                calendar_id = excluded.calendar_id",
            params![p.id, p.device_id, p.name, p.timezone, p.calendar_id],
        )?;
        Ok(())
    }

    pub fn set_weekly(&self, owner: &ScheduleOwner, weekday: Weekday, hours: &ShiftHours) -> AppResult<()> {
        self.conn.execute(
            "INSERT INTO weekly_schedule
                (owner_kind, owner_id, weekday, start_hour, end_hour, break_start, break_end)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(owner_kind, owner_id, weekday) DO UPDATE SET
                start_hour = excluded.start_hour,
                end_hour = excluded.end_hour,
                break_start = excluded.break_start,
                break_end = excluded.break_end",
            params![
                owner.kind(),
                owner.id(),
                weekday.num_days_from_monday(),
                hours.start_hour,
                hours.end_hour,
                hours.break_start,
                hours.break_end
            ],
        )?;
        Ok(())
    }

    /// Remove every weekly line of `owner` (before re-importing them).
    pub fn clear_weekly(&self, owner: &ScheduleOwner) -> AppResult<()> {
        self.conn.execute(
            "DELETE FROM weekly_schedule WHERE owner_kind = ?1 AND owner_id = ?2",
            params![owner.kind(), owner.id()],
        )?;
        Ok(())
    }

    pub fn upsert_override(&self, ov: &ShiftOverride) -> AppResult<()> {
        self.conn.execute(
            "INSERT INTO shift_overrides
                (id, name, date_from, date_to, start_hour, end_hour, break_start, break_end, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                date_from = excluded.date_from,
                date_to = excluded.date_to,
                start_hour = excluded.start_hour,
                end_hour = excluded.end_hour,
                break_start = excluded.break_start,
                break_end = excluded.break_end,
                created_at = excluded.created_at",
            params![
                ov.id,
                ov.name,
                fmt_day(ov.date_from),
                fmt_day(ov.date_to),
                ov.hours.start_hour,
                ov.hours.end_hour,
                ov.hours.break_start,
                ov.hours.break_end,
                fmt_instant(ov.created_at)
            ],
        )?;

        self.conn.execute(
            "DELETE FROM shift_override_persons WHERE override_id = ?1",
            [ov.id],
        )?;
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR IGNORE INTO shift_override_persons (override_id, person_id) VALUES (?1, ?2)",
        )?;
        for p in &ov.person_ids {
            stmt.execute(params![ov.id, p])?;
        }
        Ok(())
    }

    pub fn all_overrides(&self) -> AppResult<Vec<ShiftOverride>> {
        self.load_overrides(
            "SELECT id, name, date_from, date_to, start_hour, end_hour, break_start, break_end, created_at
             FROM shift_overrides ORDER BY id",
            &[],
        )
    }

    fn load_overrides(
        &self,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> AppResult<Vec<ShiftOverride>> {
        type Raw = (i64, String, String, String, f64, f64, f64, f64, String);

        let mut stmt = self.conn.prepare_cached(sql)?;
        let raws: Vec<Raw> = stmt
            .query_map(args, |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                    r.get(6)?,
                    r.get(7)?,
                    r.get(8)?,
                ))
            })?
            .collect::<Result<_, _>>()?;

        let mut members = self.conn.prepare_cached(
            "SELECT person_id FROM shift_override_persons WHERE override_id = ?1 ORDER BY person_id",
        )?;

        let mut out = Vec::with_capacity(raws.len());
        for (id, name, from, to, sh, eh, bs, be, created) in raws {
            let person_ids = members
                .query_map([id], |r| r.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            out.push(ShiftOverride {
                id,
                name,
                date_from: parse_day(&from)?,
                date_to: parse_day(&to)?,
                person_ids,
                hours: ShiftHours::new(sh, eh).with_break(bs, be),
                created_at: parse_instant(&created)?,
            });
        }
        Ok(out)
    }

    pub fn weekly_lines(&self, owner: &ScheduleOwner) -> AppResult<Vec<WeeklyEntry>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT weekday, start_hour, end_hour, break_start, break_end
             FROM weekly_schedule WHERE owner_kind = ?1 AND owner_id = ?2 ORDER BY weekday",
        )?;
        let rows = stmt
            .query_map(params![owner.kind(), owner.id()], |r| {
                Ok((
                    r.get::<_, u32>(0)?,
                    ShiftHours::new(r.get(1)?, r.get(2)?).with_break(r.get(3)?, r.get(4)?),
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(wd, hours)| {
                let weekday = weekday_from_index(wd)
                    .ok_or_else(|| AppError::InvalidSchedule(format!("weekday index {wd}")))?;
                Ok(WeeklyEntry {
                    owner: owner.clone(),
                    weekday,
                    hours,
                })
            })
            .collect()
    }

    pub fn notification_count(&self) -> AppResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM notifications", [], |r| r.get(0))?)
    }
}

impl PersonDirectory for SqliteStore<'_> {
    fn lookup_by_device_id(&self, device_id: &str) -> AppResult<Option<Person>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, device_id, name, timezone, calendar_id FROM persons WHERE device_id = ?1",
        )?;
        Ok(stmt.query_row([device_id], map_person).optional()?)
    }

    fn get(&self, person_id: &str) -> AppResult<Option<Person>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, device_id, name, timezone, calendar_id FROM persons WHERE id = ?1",
        )?;
        Ok(stmt.query_row([person_id], map_person).optional()?)
    }

    fn list(&self) -> AppResult<Vec<Person>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, device_id, name, timezone, calendar_id FROM persons ORDER BY id",
        )?;
        Ok(stmt
            .query_map([], map_person)?
            .collect::<Result<Vec<_>, _>>()?)
    }
}

impl ScheduleRepository for SqliteStore<'_> {
    fn overrides_for(&self, person_id: &str, date: NaiveDate) -> AppResult<Vec<ShiftOverride>> {
        let day = fmt_day(date);
        self.load_overrides(
            "SELECT o.id, o.name, o.date_from, o.date_to, o.start_hour, o.end_hour,
                    o.break_start, o.break_end, o.created_at
             FROM shift_overrides o
             JOIN shift_override_persons p ON p.override_id = o.id
             WHERE p.person_id = ?1 AND o.date_from <= ?2 AND o.date_to >= ?2
             ORDER BY o.id",
            &[&person_id, &day],
        )
    }

    fn weekly_entry(
        &self,
        owner: &ScheduleOwner,
        weekday: Weekday,
    ) -> AppResult<Option<WeeklyEntry>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT start_hour, end_hour, break_start, break_end
             FROM weekly_schedule
             WHERE owner_kind = ?1 AND owner_id = ?2 AND weekday = ?3",
        )?;
        let hours = stmt
            .query_row(
                params![owner.kind(), owner.id(), weekday.num_days_from_monday()],
                |r| Ok(ShiftHours::new(r.get(0)?, r.get(1)?).with_break(r.get(2)?, r.get(3)?)),
            )
            .optional()?;

        Ok(hours.map(|hours| WeeklyEntry {
            owner: owner.clone(),
            weekday,
            hours,
        }))
    }
}

impl AttendanceStore for SqliteStore<'_> {
    fn find(&self, person_id: &str, workday: NaiveDate) -> AppResult<Option<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE person_id = ?1 AND workday = ?2"
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        stmt.query_row(params![person_id, fmt_day(workday)], map_attendance)
            .optional()?
            .map(AttendanceRow::into_record)
            .transpose()
    }

    fn upsert(&self, r: &AttendanceRecord) -> AppResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO attendance
                (person_id, workday, check_in, check_out, worked_hours, overtime_hours,
                 status_flags, check_in_locked, check_out_locked,
                 notified_missing_checkin, notified_missing_checkout, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(person_id, workday) DO UPDATE SET
                check_in = excluded.check_in,
                check_out = excluded.check_out,
                worked_hours = excluded.worked_hours,
                overtime_hours = excluded.overtime_hours,
                status_flags = excluded.status_flags,
                check_in_locked = excluded.check_in_locked,
                check_out_locked = excluded.check_out_locked,
                notified_missing_checkin = excluded.notified_missing_checkin,
                notified_missing_checkout = excluded.notified_missing_checkout,
                updated_at = excluded.updated_at",
        )?;
        stmt.execute(params![
            r.person_id,
            fmt_day(r.workday),
            r.check_in.map(fmt_instant),
            r.check_out.map(fmt_instant),
            r.worked_hours,
            r.overtime_hours,
            flags_to_db(&r.status_flags),
            r.check_in_locked,
            r.check_out_locked,
            r.notified.missing_checkin,
            r.notified.missing_checkout,
            fmt_instant(Utc::now()),
        ])?;
        Ok(())
    }

    fn in_transaction(&self, work: &mut dyn FnMut() -> AppResult<()>) -> AppResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        work()?;
        tx.commit()?;
        Ok(())
    }

    fn records_between(
        &self,
        person_id: Option<&str>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance
             WHERE workday >= ?1 AND workday <= ?2 AND (?3 IS NULL OR person_id = ?3)
             ORDER BY person_id, workday"
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt
            .query_map(params![fmt_day(from), fmt_day(to), person_id], map_attendance)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(AttendanceRow::into_record).collect()
    }
}

impl RawLogStore for SqliteStore<'_> {
    fn exists_by_key(&self, person_id: &str, utc: DateTime<Utc>) -> AppResult<bool> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT 1 FROM raw_punches WHERE person_id = ?1 AND punch_utc = ?2 LIMIT 1",
        )?;
        Ok(stmt
            .query_row(params![person_id, fmt_instant(utc)], |_| Ok(()))
            .optional()?
            .is_some())
    }

    fn insert(&self, p: &RawPunch) -> AppResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR IGNORE INTO raw_punches
                (person_id, device_id, punch_utc, local_timestamp, status_code, direction_hint)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        stmt.execute(params![
            p.person_id,
            p.device_id,
            fmt_instant(p.utc),
            p.local.format("%Y-%m-%d %H:%M:%S").to_string(),
            p.status_code,
            p.direction_hint
        ])?;
        Ok(())
    }

    fn punches_between(
        &self,
        person_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<RawPunch>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT person_id, device_id, punch_utc, local_timestamp, status_code, direction_hint
             FROM raw_punches
             WHERE person_id = ?1 AND punch_utc >= ?2 AND punch_utc <= ?3
             ORDER BY punch_utc",
        )?;
        let rows = stmt
            .query_map(
                params![person_id, fmt_instant(from), fmt_instant(to)],
                |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, String>(3)?,
                        r.get::<_, i32>(4)?,
                        r.get::<_, i32>(5)?,
                    ))
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(person_id, device_id, utc, local, status_code, direction_hint)| {
                Ok(RawPunch {
                    person_id,
                    device_id,
                    utc: parse_instant(&utc)?,
                    local: NaiveDateTime::parse_from_str(&local, "%Y-%m-%d %H:%M:%S")
                        .map_err(|_| AppError::InvalidDate(local.clone()))?,
                    status_code,
                    direction_hint,
                })
            })
            .collect()
    }
}

/// Outbox delivery: notifications are queued in the `notifications` table
/// and picked up from there by the mailer.
impl NotificationSink for SqliteStore<'_> {
    fn notify(
        &self,
        record: &AttendanceRecord,
        recipients: &[String],
        reason: StatusFlag,
    ) -> AppResult<()> {
        self.conn
            .execute(
                "INSERT INTO notifications (person_id, workday, reason, recipients, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.person_id,
                    fmt_day(record.workday),
                    reason.to_db_str(),
                    recipients.join(","),
                    fmt_instant(Utc::now())
                ],
            )
            .map_err(|e| AppError::Notify(e.to_string()))?;
        Ok(())
    }
}

impl WatermarkStore for SqliteStore<'_> {
    fn high_watermark(&self, source: &str) -> AppResult<Option<DateTime<Utc>>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT high_watermark FROM sync_state WHERE source = ?1")?;
        stmt.query_row([source], |r| r.get::<_, String>(0))
            .optional()?
            .as_deref()
            .map(parse_instant)
            .transpose()
    }

    fn set_high_watermark(&self, source: &str, instant: DateTime<Utc>) -> AppResult<()> {
        self.conn.execute(
            "INSERT INTO sync_state (source, high_watermark) VALUES (?1, ?2)
             ON CONFLICT(source) DO UPDATE SET high_watermark = excluded.high_watermark",
            params![source, fmt_instant(instant)],
        )?;
        Ok(())
    }
}

impl AuditLog for SqliteStore<'_> {
    fn audit(&self, operation: &str, target: &str, message: &str) -> AppResult<()> {
        ttlog(self.conn, operation, target, message)
    }
}
