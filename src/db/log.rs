//! The internal audit trail (`log` table).

use crate::errors::AppResult;
use chrono::Utc;
use rusqlite::{Connection, params};

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub id: i64,
    pub date: String,
    pub operation: String,
    pub target: String,
    pub message: String,
}

/// Write an internal log line into the `log` table.
pub fn ttlog(conn: &Connection, operation: &str, target: &str, message: &str) -> AppResult<()> {
    let now = Utc::now().to_rfc3339();

    let mut stmt = conn.prepare_cached(
        "INSERT INTO log (date, operation, target, message)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    stmt.execute(params![now, operation, target, message])?;

    Ok(())
}

/// Log lines in insertion order, optionally only those of one operation
/// and only the most recent `limit`.
pub fn read_log(
    conn: &Connection,
    operation: Option<&str>,
    limit: Option<usize>,
) -> AppResult<Vec<LogEntry>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, date, operation, COALESCE(target, ''), message
         FROM log
         WHERE ?1 IS NULL OR operation = ?1
         ORDER BY id DESC
         LIMIT ?2",
    )?;

    let limit = limit.map_or(-1, |l| l as i64);
    let rows = stmt.query_map(params![operation, limit], |row| {
        Ok(LogEntry {
            id: row.get(0)?,
            date: row.get(1)?,
            operation: row.get(2)?,
            target: row.get(3)?,
            message: row.get(4)?,
        })
    })?;

    let mut out = rows.collect::<Result<Vec<_>, _>>()?;
    out.reverse();
    Ok(out)
}
