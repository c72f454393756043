use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::list::ListLogic;
use crate::db::pool::DbPool;
use crate::db::store::SqliteStore;
use crate::errors::AppResult;
use crate::ui::messages::warning;
use crate::utils::colors::{colorize_flags, colorize_locked, color_for_overtime, RESET};
use crate::utils::date::range_or_current_month;
use crate::utils::table::{Column, Table};
use crate::utils::time::hours2readable;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::List { period, person } = cmd {
        let (from, to) = range_or_current_month(period.as_deref())?;

        let pool = DbPool::open_migrated(&cfg.database)?;
        let store = SqliteStore::new(&pool.conn);
        let lines = ListLogic::lines(&store, Some(cfg.org_zone()?), person.as_deref(), from, to)?;

        if lines.is_empty() {
            warning(format!("No attendance records between {from} and {to}."));
            return Ok(());
        }

        println!("📅 Attendance from {from} to {to}:\n");

        let mut table = Table::new(vec![
            Column::left("Person"),
            Column::left("Workday"),
            Column::left("In"),
            Column::left("Out"),
            Column::right("Worked"),
            Column::right("Overtime"),
            Column::left("Flags"),
        ]);

        for l in &lines {
            table.add_row(vec![
                if l.name == l.person_id {
                    l.person_id.clone()
                } else {
                    format!("{} ({})", l.name, l.person_id)
                },
                l.workday.clone(),
                colorize_locked(&l.check_in, l.check_in_locked),
                colorize_locked(&l.check_out, l.check_out_locked),
                hours2readable(l.worked_hours, false),
                format!(
                    "{}{}{}",
                    color_for_overtime(l.overtime_hours),
                    hours2readable(l.overtime_hours, true),
                    RESET
                ),
                colorize_flags(&l.status_flags),
            ]);
        }

        print!("{}", table.render());
        println!("\n{} record(s); * = corrected by hand", lines.len());
    }
    Ok(())
}
