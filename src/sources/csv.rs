//! Device export files: one punch per row.
//!
//! ```text
//! user_id,timestamp,status,punch
//! 101,2025-08-12 08:58:00,1,0
//! ```
//!
//! `status` and `punch` may be omitted. Timestamps are device-local.

use crate::core::ports::PunchSource;
use crate::errors::{AppError, AppResult};
use crate::models::punch::DevicePunch;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Deserialize)]
struct PunchRow {
    user_id: String,
    timestamp: String,
    #[serde(default)]
    status: Option<i32>,
    #[serde(default)]
    punch: Option<i32>,
}

pub struct CsvPunchSource {
    id: String,
    path: PathBuf,
}

impl CsvPunchSource {
    /// The source id defaults to the file name, so the watermark follows
    /// the device export rather than its directory.
    pub fn new(path: &Path) -> Self {
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id,
            path: path.to_path_buf(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }
}

pub fn parse_device_timestamp(s: &str) -> AppResult<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .ok_or_else(|| AppError::InvalidTime(s.to_string()))
}

impl PunchSource for CsvPunchSource {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn fetch(&mut self) -> AppResult<Vec<DevicePunch>> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)?;

        let mut out = Vec::new();
        for row in rdr.deserialize::<PunchRow>() {
            let row = row?;
            out.push(DevicePunch {
                user_id: row.user_id,
                timestamp: parse_device_timestamp(&row.timestamp)?,
                status: row.status.unwrap_or(0),
                punch: row.punch.unwrap_or(0),
            });
        }

        debug!(path = %self.path.display(), rows = out.len(), "punch file read");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_device_timestamp_shapes() {
        let expected = NaiveDateTime::parse_from_str("2025-08-12 08:58:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        for s in [
            "2025-08-12 08:58:00",
            "2025-08-12 08:58",
            "2025-08-12T08:58:00",
            " 2025-08-12T08:58 ",
        ] {
            assert_eq!(parse_device_timestamp(s).unwrap(), expected, "{s}");
        }
        assert!(parse_device_timestamp("12/08/2025 08:58").is_err());
    }

    #[test]
    fn reads_rows_with_optional_columns() {
        let dir = std::env::temp_dir().join(format!("rattendance_csv_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("device-a.csv");
        std::fs::write(
            &path,
            "user_id,timestamp,status,punch\n101,2025-08-12 08:58:00,1,0\n202,2025-08-12 09:01,,\n",
        )
        .unwrap();

        let mut src = CsvPunchSource::new(&path);
        assert_eq!(src.source_id(), "device-a.csv");
        let punches = src.fetch().unwrap();
        assert_eq!(punches.len(), 2);
        assert_eq!(punches[0].status, 1);
        assert_eq!(punches[1].user_id, "202");
        assert_eq!(punches[1].punch, 0);

        std::fs::remove_dir_all(&dir).ok();
    }
}
