//! Time utilities: parsing HH:MM, formatting instants and hour totals.

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;

pub fn parse_time(t: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(t.trim(), "%H:%M").map_err(|_| AppError::InvalidTime(t.to_string()))
}

pub fn parse_optional_time(input: Option<&str>) -> AppResult<Option<NaiveTime>> {
    input.map(parse_time).transpose()
}

/// Local "HH:MM", with a `+1` suffix when the instant falls after `workday`.
pub fn local_hm(dt: DateTime<Utc>, tz: Tz, workday: chrono::NaiveDate) -> String {
    let local = dt.with_timezone(&tz);
    let days = (local.date_naive() - workday).num_days();
    let hm = local.format("%H:%M").to_string();
    match days {
        0 => hm,
        n if n > 0 => format!("{hm}+{n}"),
        n => format!("{hm}{n}"),
    }
}

/// Decimal hours as `HHh MMm` (sign kept when asked).
pub fn hours2readable(hours: f64, want_sign: bool) -> String {
    let mins = (hours * 60.0).round() as i64;
    let sign = match (want_sign, mins.signum()) {
        (true, 1) => "+",
        (_, -1) => "-",
        _ => "",
    };
    let m = mins.abs();
    format!("{}{:02}h {:02}m", sign, m / 60, m % 60)
}
