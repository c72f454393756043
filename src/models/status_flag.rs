use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Quality flags attached to an attendance record.
///
/// The set is closed: flags are never created at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFlag {
    EarlyCheckin,
    LateCheckin,
    EarlyCheckout,
    LateCheckout,
    MissingCheckin,
    MissingCheckout,
    InvalidOrderFixed,
    ExtraHours,
    LessHours,
    NightShift,
    HolidayWork,
    Unscheduled,
    Absent,
}

impl StatusFlag {
    pub const ALL: [StatusFlag; 13] = [
        StatusFlag::EarlyCheckin,
        StatusFlag::LateCheckin,
        StatusFlag::EarlyCheckout,
        StatusFlag::LateCheckout,
        StatusFlag::MissingCheckin,
        StatusFlag::MissingCheckout,
        StatusFlag::InvalidOrderFixed,
        StatusFlag::ExtraHours,
        StatusFlag::LessHours,
        StatusFlag::NightShift,
        StatusFlag::HolidayWork,
        StatusFlag::Unscheduled,
        StatusFlag::Absent,
    ];

    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            StatusFlag::EarlyCheckin => "early_checkin",
            StatusFlag::LateCheckin => "late_checkin",
            StatusFlag::EarlyCheckout => "early_checkout",
            StatusFlag::LateCheckout => "late_checkout",
            StatusFlag::MissingCheckin => "missing_checkin",
            StatusFlag::MissingCheckout => "missing_checkout",
            StatusFlag::InvalidOrderFixed => "invalid_order_fixed",
            StatusFlag::ExtraHours => "extra_hours",
            StatusFlag::LessHours => "less_hours",
            StatusFlag::NightShift => "night_shift",
            StatusFlag::HolidayWork => "holiday_work",
            StatusFlag::Unscheduled => "unscheduled",
            StatusFlag::Absent => "absent",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.to_db_str() == s)
    }

    /// Flags that trigger an operator notification.
    pub fn is_notifiable(&self) -> bool {
        matches!(self, StatusFlag::MissingCheckin | StatusFlag::MissingCheckout)
    }
}

impl fmt::Display for StatusFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

pub type StatusFlags = BTreeSet<StatusFlag>;

/// Serialize a flag set as a comma separated list (stable order).
pub fn flags_to_db(flags: &StatusFlags) -> String {
    flags
        .iter()
        .map(StatusFlag::to_db_str)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn flags_from_db(s: &str) -> AppResult<StatusFlags> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| StatusFlag::from_db_str(p).ok_or_else(|| AppError::InvalidStatusFlag(p.into())))
        .collect()
}
