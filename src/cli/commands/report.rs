use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::report::ReportLogic;
use crate::db::pool::DbPool;
use crate::db::store::SqliteStore;
use crate::errors::AppResult;
use crate::ui::messages::{header, warning};
use crate::utils::date::range_or_current_month;
use crate::utils::time::hours2readable;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Report {
        period,
        person,
        json,
    } = cmd
    {
        let (from, to) = range_or_current_month(period.as_deref())?;

        let pool = DbPool::open_migrated(&cfg.database)?;
        let store = SqliteStore::new(&pool.conn);
        let reports = ReportLogic::build(&store, Some(cfg.org_zone()?), person.as_deref(), from, to)?;

        if *json {
            println!("{}", serde_json::to_string_pretty(&reports)?);
            return Ok(());
        }

        if reports.is_empty() {
            warning("No persons to report on.");
            return Ok(());
        }

        for r in &reports {
            header(format!("{}: {from} → {to}", r.person_id));
            println!("  working days : {}", r.working_days);
            println!("  week-offs    : {}", r.week_offs);
            println!("  present      : {}", r.present_days);
            println!("  absent       : {}", r.absent_days);
            println!(
                "  check-in     : early {} | late {} | on time {}",
                r.early_in, r.late_in, r.on_time_check_in
            );
            println!(
                "  check-out    : early {} | late {} | on time {}",
                r.early_out, r.late_out, r.on_time_check_out
            );
            println!("  worked       : {}", hours2readable(r.worked_hours, false));
            println!("  overtime     : {}", hours2readable(r.overtime_hours, true));
            println!();
        }
    }
    Ok(())
}
