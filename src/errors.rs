//! Unified application error type.
//! All modules (db, core, cli, sources) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    /// The attendance/raw-log store could not be reached. Retryable.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid hour of day: {0}")]
    InvalidHour(String),

    #[error("Unknown time zone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid status flag: {0}")]
    InvalidStatusFlag(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ---------------------------
    // Domain errors
    // ---------------------------
    #[error("Unknown person: {0}")]
    UnknownPerson(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("No attendance record for {0}")]
    NoRecord(String),

    /// One or more notifications could not be delivered. Retryable:
    /// the markers stay unset so the next pass tries again.
    #[error("{count} notification(s) could not be delivered")]
    NotificationFailure { count: usize },

    #[error("Notification sink error: {0}")]
    Notify(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    #[error("Failed to save configuration")]
    ConfigSave,

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("Export error: {0}")]
    Export(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// Failures the caller may retry the whole batch on.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::StoreUnavailable(_) | AppError::NotificationFailure { .. } | AppError::Db(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
