use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::correct::CorrectLogic;
use crate::core::policy::Policy;
use crate::db::pool::DbPool;
use crate::db::store::SqliteStore;
use crate::errors::AppResult;
use crate::ui::messages::success;
use crate::utils::date::parse_date;
use crate::utils::time::{hours2readable, parse_optional_time};
use chrono::Utc;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Edit {
        person,
        date,
        check_in,
        check_out,
        unlock,
    } = cmd
    {
        let workday = parse_date(date)?;
        let pool = DbPool::open_migrated(&cfg.database)?;
        let store = SqliteStore::new(&pool.conn);

        if *unlock {
            CorrectLogic::unlock(&store, person, workday)?;
            success(format!("Record {person}@{workday} unlocked"));
            return Ok(());
        }

        let rec = CorrectLogic::apply(
            &store,
            &Policy::from_config(cfg),
            Some(cfg.org_zone()?),
            person,
            workday,
            parse_optional_time(check_in.as_deref())?,
            parse_optional_time(check_out.as_deref())?,
            Utc::now(),
        )?;

        success(format!(
            "Record {person}@{workday} corrected: worked {}, overtime {}",
            hours2readable(rec.worked_hours, false),
            hours2readable(rec.overtime_hours, true)
        ));
    }
    Ok(())
}
