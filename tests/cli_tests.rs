use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::fs;

mod common;
use common::{NOW, PUNCHES, init_db_with_data, init_with_roster, rat, setup_test_db, temp_file, temp_out};

#[test]
fn test_init_creates_schema() {
    let db_path = setup_test_db("cli_init");

    rat()
        .args(["--db", &db_path, "--test", "init"])
        .assert()
        .success()
        .stdout(contains("Database initialized"));

    rat()
        .args(["--db", &db_path, "db", "--info", "--check"])
        .assert()
        .success()
        .stdout(contains("Attendance records:"))
        .stdout(contains("Integrity check passed"));
}

#[test]
fn test_import_reports_counts() {
    let db_path = setup_test_db("cli_import");
    rat()
        .args(["--db", &db_path, "--test", "init"])
        .assert()
        .success();

    let roster = temp_file("cli_import", "yaml", common::ROSTER);
    rat()
        .args(["--db", &db_path, "import", "--file", &roster])
        .assert()
        .success()
        .stdout(contains("2 person(s), 6 weekly line(s), 0 override(s)"));
}

#[test]
fn test_import_rejects_overlapping_overrides() {
    let db_path = init_with_roster("cli_import_overlap");
    let bad = temp_file(
        "cli_import_overlap_bad",
        "yaml",
        "overrides:\n  - { id: 1, date_from: 2025-08-10, date_to: 2025-08-20, person_ids: [p1], start_hour: 22, end_hour: 6 }\n  - { id: 2, date_from: 2025-08-15, date_to: 2025-08-25, person_ids: [p1], start_hour: 6, end_hour: 14 }\n",
    );

    rat()
        .args(["--db", &db_path, "import", "--file", &bad])
        .assert()
        .failure()
        .stderr(contains("Invalid schedule"));
}

#[test]
fn test_sync_summary_and_listing() {
    let db_path = init_with_roster("cli_sync");
    let punches = temp_file("cli_sync", "csv", PUNCHES);

    rat()
        .args(["--db", &db_path, "sync", "--file", &punches, "--now", NOW])
        .assert()
        .success()
        .stdout(contains("read 8, unresolved 1"))
        .stdout(contains("created 3"));

    rat()
        .args(["--db", &db_path, "list", "--period", "2025-08"])
        .assert()
        .success()
        .stdout(contains("Alice (p1)"))
        .stdout(contains("07h 06m"))
        .stdout(contains("missing_checkout"))
        .stdout(contains("night_shift"))
        .stdout(contains("3 record(s)"));
}

#[test]
fn test_resync_is_idempotent() {
    let db_path = init_db_with_data("cli_resync");
    let punches = temp_file("cli_resync_again", "csv", PUNCHES);

    rat()
        .args([
            "--db", &db_path, "sync", "--file", &punches, "--now", NOW, "--source-id", "dev-1",
        ])
        .assert()
        .success()
        .stdout(contains("duplicates 7"))
        .stdout(contains("created 0, updated 0, unchanged 3"))
        .stdout(contains("sent 0"));
}

#[test]
fn test_since_watermark_skips_processed_punches() {
    let db_path = init_db_with_data("cli_watermark");
    let punches = temp_file("cli_watermark_again", "csv", PUNCHES);

    rat()
        .args([
            "--db",
            &db_path,
            "sync",
            "--file",
            &punches,
            "--now",
            NOW,
            "--source-id",
            "dev-1",
            "--since-watermark",
        ])
        .assert()
        .success()
        .stdout(contains("before watermark 7"))
        .stdout(contains("created 0"));
}

#[test]
fn test_edit_locks_and_survives_sync() {
    let db_path = init_db_with_data("cli_edit");

    rat()
        .args([
            "--db", &db_path, "edit", "p1", "2025-08-13", "--in", "09:00", "--out", "17:30",
        ])
        .assert()
        .success()
        .stdout(contains("worked 07h 30m"));

    let punches = temp_file("cli_edit_again", "csv", PUNCHES);
    rat()
        .args([
            "--db", &db_path, "sync", "--file", &punches, "--now", NOW, "--source-id", "dev-1",
        ])
        .assert()
        .success()
        .stdout(contains("locked 1"));

    rat()
        .args(["--db", &db_path, "list", "--period", "2025-08-13", "--person", "p1"])
        .assert()
        .success()
        .stdout(contains("17:30"))
        .stdout(contains("missing_checkout").not());

    rat()
        .args(["--db", &db_path, "edit", "p1", "2025-08-13", "--unlock"])
        .assert()
        .success()
        .stdout(contains("unlocked"));

    rat()
        .args(["--db", &db_path, "log", "--print", "--operation", "skip_locked"])
        .assert()
        .success()
        .stdout(contains("p1@2025-08-13"));
}

#[test]
fn test_edit_unknown_person_fails() {
    let db_path = init_with_roster("cli_edit_ghost");

    rat()
        .args(["--db", &db_path, "edit", "ghost", "2025-08-13", "--in", "09:00"])
        .assert()
        .failure()
        .stderr(contains("Unknown person: ghost"));

    rat()
        .args(["--db", &db_path, "edit", "p1", "2025-08-13", "--in", "9h"])
        .assert()
        .failure()
        .stderr(contains("Invalid time format"));
}

#[test]
fn test_report_json() {
    let db_path = init_db_with_data("cli_report");

    rat()
        .args([
            "--db", &db_path, "report", "--period", "2025-08", "--person", "p1", "--json",
        ])
        .assert()
        .success()
        .stdout(contains("\"working_days\": 21"))
        .stdout(contains("\"present_days\": 2"))
        .stdout(contains("\"absent_days\": 19"));
}

#[test]
fn test_export_csv_and_json() {
    let db_path = init_db_with_data("cli_export");

    let csv_out = temp_out("cli_export", "csv");
    rat()
        .args([
            "--db", &db_path, "export", "--format", "csv", "--file", &csv_out, "--range", "2025-08",
        ])
        .assert()
        .success()
        .stdout(contains("CSV export completed: 3 row(s)"));

    let content = fs::read_to_string(&csv_out).expect("read csv");
    assert!(content.starts_with("person_id,name,workday,check_in,check_out"));
    assert!(content.contains("p2,Bruno,2025-08-15,21:50,06:05+1"));

    let json_out = temp_out("cli_export", "json");
    rat()
        .args([
            "--db", &db_path, "export", "--format", "json", "--file", &json_out, "--range",
            "2025-08-12", "--force",
        ])
        .assert()
        .success();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_out).expect("read json")).expect("json");
    assert_eq!(value.as_array().map(Vec::len), Some(1));
    assert_eq!(value[0]["worked_hours"], 7.1);
}

#[test]
fn test_log_and_db_info_after_sync() {
    let db_path = init_db_with_data("cli_log");

    rat()
        .args(["--db", &db_path, "log", "--print"])
        .assert()
        .success()
        .stdout(contains("sync_start"))
        .stdout(contains("sync_end"))
        .stdout(contains("import"))
        .stdout(contains("notify"));

    rat()
        .args(["--db", &db_path, "db", "--info"])
        .assert()
        .success()
        .stdout(contains("Queued notifications:"))
        .stdout(contains("2025-08-12"));
}

#[test]
fn test_bad_period_is_rejected() {
    let db_path = init_with_roster("cli_bad_period");

    rat()
        .args(["--db", &db_path, "list", "--period", "2025-08:2025-09-01"])
        .assert()
        .failure()
        .stderr(contains("Invalid date format"));
}
