//! Date helpers and the period syntax shared by `list`, `report` and `export`.
//!
//! - YYYY, YYYY-MM, YYYY-MM-DD
//! - A:B where A and B use the same one of the above

use crate::errors::{AppError, AppResult};
use chrono::{Datelike, Duration, NaiveDate};

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn parse_date(s: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| AppError::InvalidDate(s.to_string()))
}

/// First and last day of the month containing `d`.
pub fn month_bounds(d: NaiveDate) -> AppResult<(NaiveDate, NaiveDate)> {
    let first = d.with_day(1).ok_or_else(|| AppError::InvalidDate(d.to_string()))?;
    let (ny, nm) = if d.month() == 12 {
        (d.year() + 1, 1)
    } else {
        (d.year(), d.month() + 1)
    };
    let next = NaiveDate::from_ymd_opt(ny, nm, 1).ok_or_else(|| AppError::InvalidDate(d.to_string()))?;
    Ok((first, next - Duration::days(1)))
}

fn single(p: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let bad = || AppError::InvalidDate(p.to_string());
    match p.len() {
        // YYYY
        4 => {
            let y: i32 = p.parse().map_err(|_| bad())?;
            let d1 = NaiveDate::from_ymd_opt(y, 1, 1).ok_or_else(bad)?;
            let d2 = NaiveDate::from_ymd_opt(y, 12, 31).ok_or_else(bad)?;
            Ok((d1, d2))
        }
        // YYYY-MM
        7 => {
            let d = NaiveDate::parse_from_str(&format!("{p}-01"), "%Y-%m-%d").map_err(|_| bad())?;
            month_bounds(d)
        }
        // YYYY-MM-DD
        10 => {
            let d = parse_date(p)?;
            Ok((d, d))
        }
        _ => Err(bad()),
    }
}

/// Resolve a period expression to an inclusive date range.
pub fn parse_range(r: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let r = r.trim();
    let Some((start_raw, end_raw)) = r.split_once(':') else {
        return single(r);
    };
    let (start, end) = (start_raw.trim(), end_raw.trim());
    if start.len() != end.len() {
        return Err(AppError::InvalidDate(format!(
            "{r}: start and end must have the same format"
        )));
    }
    let (from, _) = single(start)?;
    let (_, to) = single(end)?;
    if from > to {
        return Err(AppError::InvalidDate(format!("{r}: start is after end")));
    }
    Ok((from, to))
}

/// `period` or, when absent, the current month.
pub fn range_or_current_month(period: Option<&str>) -> AppResult<(NaiveDate, NaiveDate)> {
    match period {
        Some(p) => parse_range(p),
        None => month_bounds(today()),
    }
}

/// Every date of an inclusive range.
pub fn days_in(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |d| *d <= to)
}
