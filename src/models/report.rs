use serde::Serialize;

/// Per-person attendance statistics over a period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttendanceReport {
    pub person_id: String,
    pub working_days: u32,
    pub week_offs: u32,
    pub present_days: u32,
    pub absent_days: u32,
    pub early_in: u32,
    pub late_in: u32,
    pub on_time_check_in: u32,
    pub early_out: u32,
    pub late_out: u32,
    pub on_time_check_out: u32,
    pub worked_hours: f64,
    pub overtime_hours: f64,
}
