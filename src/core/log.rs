use crate::db::log::{LogEntry, read_log};
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use ansi_term::Colour;
use regex::Regex;
use std::sync::LazyLock;
use unicode_width::UnicodeWidthStr;

static ANSI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1B\[[0-9;]*[mK]").unwrap());

const OP_MAX: usize = 60;

fn strip_ansi(s: &str) -> String {
    ANSI.replace_all(s, "").into_owned()
}

/// ANSI colour of an audit operation.
fn color_for_operation(op: &str) -> Colour {
    match op {
        "sync_start" | "sync_end" => Colour::Cyan,
        "notify" => Colour::Green,
        "notify_failed" => Colour::Red,
        "edit" => Colour::Yellow,
        "unlock" => Colour::RGB(255, 153, 51),
        "skip_locked" => Colour::Fixed(244),
        "import" => Colour::Blue,
        "migration_applied" => Colour::Purple,
        "init" => Colour::RGB(255, 153, 51),
        _ => Colour::White,
    }
}

/// `operation (target)` cut to `OP_MAX` visible columns, operation coloured.
fn render_op_target(entry: &LogEntry) -> String {
    let plain = if entry.target.is_empty() {
        entry.operation.clone()
    } else {
        format!("{} ({})", entry.operation, entry.target)
    };

    let visible = if plain.width() > OP_MAX {
        let mut s: String = plain.chars().take(OP_MAX - 3).collect();
        s.push_str("...");
        s
    } else {
        plain
    };

    let color = color_for_operation(&entry.operation);
    match visible.split_once(' ') {
        Some((op, rest)) => format!("{} {}", color.paint(op), rest),
        None => color.paint(visible.as_str()).to_string(),
    }
}

/// Local-offset timestamp without sub-seconds; unparsable dates pass through.
fn render_date(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%FT%T%:z").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

pub struct LogLogic;

impl LogLogic {
    pub fn print_log(pool: &DbPool, operation: Option<&str>, limit: Option<usize>) -> AppResult<()> {
        let entries = read_log(&pool.conn, operation, limit)?;

        if entries.is_empty() {
            println!("📜 Internal log is empty.");
            return Ok(());
        }

        let rows: Vec<(i64, String, String, &str)> = entries
            .iter()
            .map(|e| (e.id, render_date(&e.date), render_op_target(e), e.message.as_str()))
            .collect();

        let id_w = rows.iter().map(|r| r.0.to_string().len()).max().unwrap_or(1);
        let date_w = rows.iter().map(|r| r.1.len()).max().unwrap_or(0);
        let op_w = rows
            .iter()
            .map(|r| strip_ansi(&r.2).width())
            .max()
            .unwrap_or(10)
            .min(OP_MAX);

        println!("📜 Internal log:\n");

        for (id, date, op_target, message) in rows {
            let padding = " ".repeat(op_w.saturating_sub(strip_ansi(&op_target).width()));
            println!("{id:>id_w$}: {date:<date_w$} | {op_target}{padding} => {message}");
        }

        Ok(())
    }
}
