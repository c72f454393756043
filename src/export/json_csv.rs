// src/export/json_csv.rs

use crate::core::list::AttendanceLine;
use crate::errors::{AppError, AppResult};
use crate::export::notify_export_success;
use crate::ui::messages::info;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Pretty-printed JSON array of attendance rows.
pub(crate) fn export_json(lines: &[AttendanceLine], path: &Path) -> AppResult<()> {
    info(format!("Exporting to JSON: {}", path.display()));

    let json_data = serde_json::to_string_pretty(lines)?;

    let mut file = File::create(path)?;
    file.write_all(json_data.as_bytes())?;

    notify_export_success("JSON", lines.len(), path);
    Ok(())
}

/// CSV with a header row derived from the serde field names.
pub(crate) fn export_csv(lines: &[AttendanceLine], path: &Path) -> AppResult<()> {
    info(format!("Exporting to CSV: {}", path.display()));

    let mut wtr = csv::Writer::from_path(path)?;

    for line in lines {
        wtr.serialize(line)?;
    }

    wtr.flush()
        .map_err(|e| AppError::Export(format!("CSV flush error: {e}")))?;

    notify_export_success("CSV", lines.len(), path);
    Ok(())
}
