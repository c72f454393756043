#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Weekday calendar 09:00-17:30 with a 12-13 lunch, one day worker and one
/// Friday night worker.
pub const ROSTER: &str = r#"
persons:
  - { id: p1, device_id: "101", name: Alice, calendar_id: std }
  - { id: p2, device_id: "202", name: Bruno }
calendars:
  std:
    mon: { start_hour: 9, end_hour: 17.5, break_start: 12, break_end: 13 }
    tue: { start_hour: 9, end_hour: 17.5, break_start: 12, break_end: 13 }
    wed: { start_hour: 9, end_hour: 17.5, break_start: 12, break_end: 13 }
    thu: { start_hour: 9, end_hour: 17.5, break_start: 12, break_end: 13 }
    fri: { start_hour: 9, end_hour: 17.5, break_start: 12, break_end: 13 }
schedules:
  p2:
    fri: { start_hour: 22, end_hour: 6 }
"#;

/// Tue 12 Aug: lunch 12:01-12:59 (7h06m worked). Wed 13 Aug: check-in only.
/// Fri 15 -> Sat 16: night shift. Device 999 is unknown.
pub const PUNCHES: &str = "user_id,timestamp,status,punch
101,2025-08-12 08:58:00,1,0
101,2025-08-12 12:01:00,1,1
101,2025-08-12 12:59:00,1,0
101,2025-08-12 17:02:00,1,1
101,2025-08-13 09:05:00,1,0
999,2025-08-13 09:00:00,1,0
202,2025-08-15 21:50:00,1,0
202,2025-08-16 06:05:00,1,1
";

pub const NOW: &str = "2025-08-20 00:00";

pub fn rat() -> Command {
    cargo_bin_cmd!("rattendance")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rattendance.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Write `content` to a fresh temp file and return its path
pub fn temp_file(name: &str, ext: &str, content: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rattendance.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::write(&p, content).expect("write temp file");
    p
}

/// Temp output path, removed if present
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

/// init + roster import
pub fn init_with_roster(name: &str) -> String {
    let db_path = setup_test_db(name);

    rat()
        .args(["--db", &db_path, "--test", "init"])
        .assert()
        .success();

    let roster = temp_file(name, "yaml", ROSTER);
    rat()
        .args(["--db", &db_path, "import", "--file", &roster])
        .assert()
        .success();

    db_path
}

/// init + roster import + one sync pass over [`PUNCHES`]
pub fn init_db_with_data(name: &str) -> String {
    let db_path = init_with_roster(name);
    let punches = temp_file(name, "csv", PUNCHES);

    rat()
        .args([
            "--db", &db_path, "sync", "--file", &punches, "--now", NOW, "--source-id", "dev-1",
        ])
        .assert()
        .success();

    db_path
}
