use crate::db::migrate::pending_migrations;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use rusqlite::{Connection, OptionalExtension};
use std::fs;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DbStats {
    pub persons: i64,
    pub raw_punches: i64,
    pub attendance: i64,
    pub locked: i64,
    pub open: i64,
    pub notifications: i64,
    pub first_workday: Option<String>,
    pub last_workday: Option<String>,
    pub pending_migrations: usize,
}

fn count(conn: &Connection, sql: &str) -> rusqlite::Result<i64> {
    conn.query_row(sql, [], |row| row.get(0))
}

pub fn collect_stats(conn: &Connection) -> AppResult<DbStats> {
    let first_workday: Option<String> = conn
        .query_row(
            "SELECT workday FROM attendance ORDER BY workday ASC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    let last_workday: Option<String> = conn
        .query_row(
            "SELECT workday FROM attendance ORDER BY workday DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(DbStats {
        persons: count(conn, "SELECT COUNT(*) FROM persons")?,
        raw_punches: count(conn, "SELECT COUNT(*) FROM raw_punches")?,
        attendance: count(conn, "SELECT COUNT(*) FROM attendance")?,
        locked: count(
            conn,
            "SELECT COUNT(*) FROM attendance WHERE check_in_locked = 1 OR check_out_locked = 1",
        )?,
        open: count(
            conn,
            "SELECT COUNT(*) FROM attendance WHERE check_in IS NOT NULL AND check_out IS NULL",
        )?,
        notifications: count(conn, "SELECT COUNT(*) FROM notifications")?,
        first_workday,
        last_workday,
        pending_migrations: pending_migrations(conn)?.len(),
    })
}

pub fn print_db_info(pool: &DbPool, db_path: &str) -> AppResult<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    //
    // 2) COUNTS
    //
    let s = collect_stats(&pool.conn)?;
    for (label, value) in [
        ("Persons", s.persons),
        ("Raw punches", s.raw_punches),
        ("Attendance records", s.attendance),
        ("Locked (manual)", s.locked),
        ("Open (no check-out)", s.open),
        ("Queued notifications", s.notifications),
    ] {
        println!("{}• {}:{} {}{}{}", CYAN, label, RESET, GREEN, value, RESET);
    }

    //
    // 3) WORKDAY RANGE
    //
    let dash = format!("{GREY}--{RESET}");
    println!("{}• Workday range:{}", CYAN, RESET);
    println!("    from: {}", s.first_workday.unwrap_or_else(|| dash.clone()));
    println!("    to:   {}", s.last_workday.unwrap_or(dash));

    if s.pending_migrations > 0 {
        println!(
            "{}• Pending migrations:{} {}{}{}",
            CYAN, RESET, YELLOW, s.pending_migrations, RESET
        );
    }

    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_database_has_zero_counts() {
        let pool = DbPool::in_memory().unwrap();
        let s = collect_stats(&pool.conn).unwrap();
        assert_eq!(s.attendance, 0);
        assert_eq!(s.first_workday, None);
        assert_eq!(s.pending_migrations, 0);
    }
}
