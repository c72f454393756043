use crate::models::status_flag::{StatusFlag, StatusFlags};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Sticky per-record "already notified" markers. Never cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NotificationMarkers {
    pub missing_checkin: bool,
    pub missing_checkout: bool,
}

impl NotificationMarkers {
    pub fn is_sent(&self, flag: StatusFlag) -> bool {
        match flag {
            StatusFlag::MissingCheckin => self.missing_checkin,
            StatusFlag::MissingCheckout => self.missing_checkout,
            _ => true,
        }
    }

    pub fn mark(&mut self, flag: StatusFlag) {
        match flag {
            StatusFlag::MissingCheckin => self.missing_checkin = true,
            StatusFlag::MissingCheckout => self.missing_checkout = true,
            _ => {}
        }
    }
}

/// The canonical attendance of one person on one workday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub person_id: String,
    pub workday: NaiveDate,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub worked_hours: f64,
    pub overtime_hours: f64,
    pub status_flags: StatusFlags,
    pub check_in_locked: bool,
    pub check_out_locked: bool,
    pub notified: NotificationMarkers,
}

impl AttendanceRecord {
    pub fn new(person_id: &str, workday: NaiveDate) -> Self {
        Self {
            person_id: person_id.to_string(),
            workday,
            check_in: None,
            check_out: None,
            worked_hours: 0.0,
            overtime_hours: 0.0,
            status_flags: StatusFlags::new(),
            check_in_locked: false,
            check_out_locked: false,
            notified: NotificationMarkers::default(),
        }
    }

    /// A human correction on either side freezes the record.
    pub fn is_locked(&self) -> bool {
        self.check_in_locked || self.check_out_locked
    }

    pub fn has(&self, flag: StatusFlag) -> bool {
        self.status_flags.contains(&flag)
    }

    pub fn key(&self) -> String {
        format!("{}@{}", self.person_id, self.workday)
    }
}
