use crate::config::Config;
use chrono::Duration;

/// Tunable reconciliation constants.
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    /// Check-ins up to this long after shift start are not late.
    pub late_grace: Duration,
    /// How early before shift start a punch still belongs to that shift.
    pub early_arrival_window: Duration,
    /// How long after a night shift ends a punch still belongs to it.
    pub night_departure_window: Duration,
    /// An open check-in older than this is auto-closed.
    pub abandonment: Duration,
    /// Worked-vs-planned difference below this is neither extra nor less.
    pub overtime_tolerance: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            late_grace: Duration::minutes(5),
            early_arrival_window: Duration::hours(3),
            night_departure_window: Duration::hours(4),
            abandonment: Duration::hours(18),
            overtime_tolerance: Duration::seconds(60),
        }
    }
}

impl Policy {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            late_grace: Duration::minutes(cfg.late_grace_minutes),
            early_arrival_window: Duration::hours(cfg.early_arrival_window_hours),
            night_departure_window: Duration::hours(cfg.night_departure_window_hours),
            abandonment: Duration::hours(cfg.abandonment_hours),
            overtime_tolerance: Duration::seconds(cfg.overtime_tolerance_seconds),
        }
    }
}
