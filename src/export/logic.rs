// src/export/logic.rs

use crate::core::list::{AttendanceLine, ListLogic};
use crate::core::ports::{AttendanceStore, PersonDirectory};
use crate::errors::{AppError, AppResult};
use crate::export::ExportFormat;
use crate::export::fs_utils::ensure_writable;
use crate::export::json_csv::{export_csv, export_json};
use crate::ui::messages::warning;
use crate::utils::date::parse_range;
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::path::Path;

pub struct ExportLogic;

impl ExportLogic {
    /// Export attendance rows to `path`.
    ///
    /// `range`: `None`, `"all"`, or a period expression (`YYYY`, `YYYY-MM`,
    /// `YYYY-MM-DD`, `A:B`). Returns the number of rows written.
    pub fn export<S: AttendanceStore + PersonDirectory>(
        store: &S,
        org_zone: Option<Tz>,
        format: ExportFormat,
        path: &Path,
        range: Option<&str>,
        force: bool,
    ) -> AppResult<usize> {
        let (from, to) = bounds(range)?;
        let lines: Vec<AttendanceLine> = ListLogic::lines(store, org_zone, None, from, to)?;

        if lines.is_empty() {
            warning("No attendance records found for the selected range.");
            return Ok(0);
        }

        ensure_writable(path, force)?;

        match format {
            ExportFormat::Csv => export_csv(&lines, path)?,
            ExportFormat::Json => export_json(&lines, path)?,
        }

        tracing::info!(format = format.as_str(), rows = lines.len(), path = %path.display(), "export written");
        Ok(lines.len())
    }
}

fn bounds(range: Option<&str>) -> AppResult<(NaiveDate, NaiveDate)> {
    match range {
        Some(r) if !r.eq_ignore_ascii_case("all") => parse_range(r),
        _ => {
            let first = NaiveDate::from_ymd_opt(1, 1, 1);
            let last = NaiveDate::from_ymd_opt(9999, 12, 31);
            first
                .zip(last)
                .ok_or_else(|| AppError::Other("date bounds out of range".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::MemoryStore;
    use crate::models::attendance::AttendanceRecord;
    use crate::models::person::Person;
    use std::fs;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.add_person(Person::new("p1", "101"));
        for day in ["2025-07-31", "2025-08-12", "2025-08-13"] {
            let mut rec = AttendanceRecord::new("p1", day.parse().unwrap());
            rec.worked_hours = 7.5;
            store.put_record(rec);
        }
        store
    }

    #[test]
    fn csv_export_honours_range() {
        let path = std::env::temp_dir().join("rattendance_export_unit.csv");
        fs::remove_file(&path).ok();

        let n = ExportLogic::export(&store(), None, ExportFormat::Csv, &path, Some("2025-08"), true)
            .unwrap();
        assert_eq!(n, 2);

        let content = fs::read_to_string(&path).unwrap();
        let mut rows = content.lines();
        assert!(rows.next().unwrap().starts_with("person_id,name,workday,"));
        assert_eq!(rows.count(), 2);
        assert!(!content.contains("2025-07-31"));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn json_export_all() {
        let path = std::env::temp_dir().join("rattendance_export_unit.json");
        fs::remove_file(&path).ok();

        let n = ExportLogic::export(&store(), None, ExportFormat::Json, &path, Some("all"), true)
            .unwrap();
        assert_eq!(n, 3);

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 3);
        assert_eq!(value[0]["workday"], "2025-07-31");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn empty_range_writes_nothing() {
        let path = std::env::temp_dir().join("rattendance_export_empty.csv");
        fs::remove_file(&path).ok();
        let n = ExportLogic::export(&store(), None, ExportFormat::Csv, &path, Some("2024"), true)
            .unwrap();
        assert_eq!(n, 0);
        assert!(!path.exists());
    }
}
