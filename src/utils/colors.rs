/// ANSI color helper utilities for terminal output.
pub const RESET: &str = "\x1b[0m";

pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const MAGENTA: &str = "\x1b[35m";
pub const CYAN: &str = "\x1b[36m";

/// Overtime color:
/// \>0 → green
/// \<0 → red
/// 0 → reset
pub fn color_for_overtime(hours: f64) -> &'static str {
    if hours > 0.0 {
        GREEN
    } else if hours < 0.0 {
        RED
    } else {
        RESET
    }
}

/// Color of a single status flag name.
pub fn color_for_flag(flag: &str) -> &'static str {
    match flag {
        "absent" | "missing_checkin" | "missing_checkout" => RED,
        f if f.starts_with("late_") || f.starts_with("early_") => YELLOW,
        "less_hours" => YELLOW,
        "extra_hours" => GREEN,
        "holiday_work" | "unscheduled" => MAGENTA,
        "invalid_order_fixed" | "night_shift" => CYAN,
        _ => RESET,
    }
}

/// Comma-separated flag list with each flag coloured; empty → grey dash.
pub fn colorize_flags(flags: &str) -> String {
    if flags.trim().is_empty() {
        return format!("{GREY}-{RESET}");
    }
    flags
        .split(',')
        .map(|f| format!("{}{f}{RESET}", color_for_flag(f.trim())))
        .collect::<Vec<_>>()
        .join(",")
}

/// Grey placeholder for an empty time cell.
pub fn colorize_optional(value: &str) -> String {
    if value.trim().is_empty() || value.trim() == "--:--" {
        format!("{GREY}--:--{RESET}")
    } else {
        value.to_string()
    }
}

/// Time cell with a lock marker when the side was corrected by hand.
pub fn colorize_locked(value: &str, locked: bool) -> String {
    let base = colorize_optional(value);
    if locked {
        format!("{base}{BLUE}*{RESET}")
    } else {
        base
    }
}
