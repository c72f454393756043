use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A punch as delivered by a device or export file: naive device-local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePunch {
    /// Identifier of the person on the device (not the directory id).
    pub user_id: String,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub punch: i32,
}

/// One physical scan, localized and attributed to a person.
///
/// Append-only: the engine inserts these but never mutates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPunch {
    pub person_id: String,
    pub device_id: String,
    pub utc: DateTime<Utc>,
    pub local: NaiveDateTime,
    pub status_code: i32,
    pub direction_hint: i32,
}

impl RawPunch {
    pub fn local_in(&self, tz: Tz) -> DateTime<Tz> {
        self.utc.with_timezone(&tz)
    }

    /// Raw-log identity: exact (person, UTC instant) match.
    pub fn key(&self) -> (&str, DateTime<Utc>) {
        (&self.person_id, self.utc)
    }
}
