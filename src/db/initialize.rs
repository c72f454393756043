use crate::db::migrate::run_pending_migrations;
use crate::errors::AppResult;
use rusqlite::Connection;

/// Initialize the database.
/// Delegates all schema creation / upgrades to the migration engine.
pub fn init_db(conn: &Connection) -> AppResult<Vec<&'static str>> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    let applied = run_pending_migrations(conn)?;
    Ok(applied)
}
