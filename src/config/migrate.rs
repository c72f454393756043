use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

/// Keys every configuration file is expected to carry.
pub const EXPECTED_FIELDS: [&str; 9] = [
    "database",
    "default_timezone",
    "late_grace_minutes",
    "early_arrival_window_hours",
    "night_departure_window_hours",
    "abandonment_hours",
    "overtime_tolerance_seconds",
    "days_to_sync",
    "notify_recipients",
];

fn read_mapping(path: &Path) -> AppResult<Mapping> {
    let content = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
    match serde_yaml::from_str::<Value>(&content)? {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        _ => Err(AppError::Config(format!(
            "{} is not a YAML mapping",
            path.display()
        ))),
    }
}

/// Fields absent from the file at `path` (they currently fall back to defaults).
pub fn missing_fields(path: &Path) -> AppResult<Vec<&'static str>> {
    let map = read_mapping(path)?;
    Ok(EXPECTED_FIELDS
        .iter()
        .copied()
        .filter(|k| !map.contains_key(Value::String(k.to_string())))
        .collect())
}

/// Write every missing field with its default value; existing values are kept.
/// Returns the keys that were added.
pub fn migrate_missing_fields(path: &Path) -> AppResult<Vec<&'static str>> {
    let mut map = read_mapping(path)?;

    let defaults = match serde_yaml::to_value(Config::default())? {
        Value::Mapping(m) => m,
        _ => return Err(AppError::Config("default config is not a mapping".into())),
    };

    let mut added = Vec::new();
    for key in EXPECTED_FIELDS {
        let k = Value::String(key.to_string());
        if map.contains_key(&k) {
            continue;
        }
        if let Some(v) = defaults.get(&k) {
            map.insert(k, v.clone());
            added.push(key);
        }
    }

    if added.is_empty() {
        info("Configuration already up to date.");
        return Ok(added);
    }

    let serialized = serde_yaml::to_string(&Value::Mapping(map))?;
    fs::write(path, serialized).map_err(|_| AppError::ConfigSave)?;

    success(format!(
        "Configuration migrated: added {}",
        added.join(", ")
    ));
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_conf(name: &str, body: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("rattendance_cfg_{}_{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let p = dir.join("rattendance.conf");
        fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn adds_only_what_is_missing() {
        let p = temp_conf("add", "database: /tmp/x.sqlite\nlate_grace_minutes: 10\n");
        let missing = missing_fields(&p).unwrap();
        assert!(missing.contains(&"default_timezone"));
        assert!(!missing.contains(&"late_grace_minutes"));

        let added = migrate_missing_fields(&p).unwrap();
        assert_eq!(added.len(), EXPECTED_FIELDS.len() - 2);
        assert!(missing_fields(&p).unwrap().is_empty());

        let cfg = Config::load_from(&p).unwrap();
        assert_eq!(cfg.late_grace_minutes, 10);
        assert_eq!(cfg.database, "/tmp/x.sqlite");

        // second run is a no-op
        assert!(migrate_missing_fields(&p).unwrap().is_empty());
        fs::remove_dir_all(p.parent().unwrap()).ok();
    }
}
