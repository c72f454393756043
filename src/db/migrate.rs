use rusqlite::{Connection, OptionalExtension, Result};
use tracing::info;

/// A schema step, applied once and remembered in the `log` table.
struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20251017_0001_create_directory",
        description: "persons and weekly schedules",
        sql: r#"
        CREATE TABLE IF NOT EXISTS persons (
            id          TEXT PRIMARY KEY,
            device_id   TEXT NOT NULL UNIQUE,
            name        TEXT NOT NULL DEFAULT '',
            timezone    TEXT,
            calendar_id TEXT
        );

        CREATE TABLE IF NOT EXISTS weekly_schedule (
            owner_kind  TEXT NOT NULL CHECK(owner_kind IN ('person','calendar')),
            owner_id    TEXT NOT NULL,
            weekday     INTEGER NOT NULL CHECK(weekday BETWEEN 0 AND 6),
            start_hour  REAL NOT NULL,
            end_hour    REAL NOT NULL,
            break_start REAL NOT NULL DEFAULT 0,
            break_end   REAL NOT NULL DEFAULT 0,
            PRIMARY KEY (owner_kind, owner_id, weekday)
        );
        "#,
    },
    Migration {
        version: "20251017_0002_create_shift_overrides",
        description: "date-ranged shift overrides",
        sql: r#"
        CREATE TABLE IF NOT EXISTS shift_overrides (
            id          INTEGER PRIMARY KEY,
            name        TEXT NOT NULL DEFAULT '',
            date_from   TEXT NOT NULL,
            date_to     TEXT NOT NULL,
            start_hour  REAL NOT NULL,
            end_hour    REAL NOT NULL,
            break_start REAL NOT NULL DEFAULT 0,
            break_end   REAL NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS shift_override_persons (
            override_id INTEGER NOT NULL REFERENCES shift_overrides(id) ON DELETE CASCADE,
            person_id   TEXT NOT NULL,
            PRIMARY KEY (override_id, person_id)
        );

        CREATE INDEX IF NOT EXISTS idx_override_dates ON shift_overrides(date_from, date_to);
        "#,
    },
    Migration {
        version: "20251017_0003_create_raw_punches",
        description: "append-only raw punch log",
        sql: r#"
        CREATE TABLE IF NOT EXISTS raw_punches (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            person_id       TEXT NOT NULL,
            device_id       TEXT NOT NULL,
            punch_utc       TEXT NOT NULL,
            local_timestamp TEXT NOT NULL,
            status_code     INTEGER NOT NULL DEFAULT 0,
            direction_hint  INTEGER NOT NULL DEFAULT 0,
            UNIQUE (person_id, punch_utc)
        );
        "#,
    },
    Migration {
        version: "20251017_0004_create_attendance",
        description: "one attendance row per person and workday",
        sql: r#"
        CREATE TABLE IF NOT EXISTS attendance (
            person_id                 TEXT NOT NULL,
            workday                   TEXT NOT NULL,
            check_in                  TEXT,
            check_out                 TEXT,
            worked_hours              REAL NOT NULL DEFAULT 0,
            overtime_hours            REAL NOT NULL DEFAULT 0,
            status_flags              TEXT NOT NULL DEFAULT '',
            check_in_locked           INTEGER NOT NULL DEFAULT 0,
            check_out_locked          INTEGER NOT NULL DEFAULT 0,
            notified_missing_checkin  INTEGER NOT NULL DEFAULT 0,
            notified_missing_checkout INTEGER NOT NULL DEFAULT 0,
            updated_at                TEXT NOT NULL,
            PRIMARY KEY (person_id, workday)
        );

        CREATE INDEX IF NOT EXISTS idx_attendance_workday ON attendance(workday);
        "#,
    },
    Migration {
        version: "20251017_0005_create_outbox_and_sync_state",
        description: "notification outbox and per-source watermarks",
        sql: r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            person_id  TEXT NOT NULL,
            workday    TEXT NOT NULL,
            reason     TEXT NOT NULL,
            recipients TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sync_state (
            source         TEXT PRIMARY KEY,
            high_watermark TEXT NOT NULL
        );
        "#,
    },
];

/// Ensure that the `log` table exists; it also carries the migration markers.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare_cached(
        "SELECT 1 FROM log WHERE operation = 'migration_applied' AND target = ?1 LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

/// Versions not yet applied to this database.
pub fn pending_migrations(conn: &Connection) -> Result<Vec<&'static str>> {
    ensure_log_table(conn)?;
    let mut out = Vec::new();
    for m in MIGRATIONS {
        if !is_applied(conn, m.version)? {
            out.push(m.version);
        }
    }
    Ok(out)
}

/// Public entry point: run all pending migrations, each in its own
/// transaction together with its marker. Returns the versions applied.
///
/// Invoked by db::init_db().
pub fn run_pending_migrations(conn: &Connection) -> Result<Vec<&'static str>> {
    ensure_log_table(conn)?;

    let mut applied = Vec::new();
    for m in MIGRATIONS {
        if is_applied(conn, m.version)? {
            continue;
        }

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(m.sql)?;
        tx.execute(
            "INSERT INTO log (date, operation, target, message)
             VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
            [m.version, m.description],
        )?;
        tx.commit()?;

        info!(version = m.version, "migration applied");
        applied.push(m.version);
    }

    Ok(applied)
}
