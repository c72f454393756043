use crate::errors::{AppError, AppResult};
use crate::models::person::parse_tz;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub mod migrate; // use submodule at src/config/migrate.rs

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    /// Organisation zone for persons without their own.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    #[serde(default = "default_late_grace")]
    pub late_grace_minutes: i64,
    #[serde(default = "default_early_arrival")]
    pub early_arrival_window_hours: i64,
    #[serde(default = "default_night_departure")]
    pub night_departure_window_hours: i64,
    #[serde(default = "default_abandonment")]
    pub abandonment_hours: i64,
    #[serde(default = "default_overtime_tolerance")]
    pub overtime_tolerance_seconds: i64,
    /// Punches older than this many days are ignored by sync (0 = no limit).
    #[serde(default = "default_days_to_sync")]
    pub days_to_sync: i64,
    #[serde(default)]
    pub notify_recipients: Vec<String>,
}

fn default_database() -> String {
    Config::database_file().to_string_lossy().to_string()
}
fn default_timezone() -> String {
    "UTC".to_string()
}
fn default_late_grace() -> i64 {
    5
}
fn default_early_arrival() -> i64 {
    3
}
fn default_night_departure() -> i64 {
    4
}
fn default_abandonment() -> i64 {
    18
}
fn default_overtime_tolerance() -> i64 {
    60
}
fn default_days_to_sync() -> i64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            default_timezone: default_timezone(),
            late_grace_minutes: default_late_grace(),
            early_arrival_window_hours: default_early_arrival(),
            night_departure_window_hours: default_night_departure(),
            abandonment_hours: default_abandonment(),
            overtime_tolerance_seconds: default_overtime_tolerance(),
            days_to_sync: default_days_to_sync(),
            notify_recipients: Vec::new(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("rattendance")
        } else {
            let home = dirs::home_dir()
                .or_else(|| env::var("HOME").ok().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("."));
            home.join(".rattendance")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rattendance.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rattendance.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
        let cfg: Config = serde_yaml::from_str(&content)?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        let mut file = fs::File::create(path).map_err(|_| AppError::ConfigSave)?;
        file.write_all(yaml.as_bytes())
            .map_err(|_| AppError::ConfigSave)?;
        Ok(())
    }

    /// Organisation zone, validated.
    pub fn org_zone(&self) -> AppResult<Tz> {
        parse_tz(&self.default_timezone)
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_name: Option<String>, is_test: bool) -> AppResult<PathBuf> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        // DB name: user provided or default
        let db_path = match custom_name {
            Some(name) => {
                let p = Path::new(&name);
                if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    dir.join(p)
                }
            }
            None => dir.join("rattendance.sqlite"),
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Config::default()
        };

        // Write config file
        if !is_test {
            config.save_to(&Self::config_file())?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        Ok(db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_is_completed_with_defaults() {
        let cfg: Config =
            serde_yaml::from_str("database: /tmp/a.sqlite\ndefault_timezone: Europe/Rome\n")
                .unwrap();
        assert_eq!(cfg.database, "/tmp/a.sqlite");
        assert_eq!(cfg.late_grace_minutes, 5);
        assert_eq!(cfg.abandonment_hours, 18);
        assert_eq!(cfg.days_to_sync, 30);
        assert!(cfg.notify_recipients.is_empty());
        assert_eq!(cfg.org_zone().unwrap(), chrono_tz::Europe::Rome);
    }

    #[test]
    fn bad_zone_is_reported() {
        let cfg = Config {
            default_timezone: "Mars/Olympus".into(),
            ..Config::default()
        };
        assert!(matches!(cfg.org_zone(), Err(AppError::InvalidTimezone(_))));
    }
}
