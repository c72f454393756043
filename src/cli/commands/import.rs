use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::import::ImportLogic;
use crate::db::pool::DbPool;
use crate::db::store::SqliteStore;
use crate::errors::AppResult;
use crate::ui::messages::success;
use crate::utils::path::expand_tilde;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Import { file } = cmd {
        let roster = ImportLogic::load(&expand_tilde(file))?;

        let pool = DbPool::open_migrated(&cfg.database)?;
        let store = SqliteStore::new(&pool.conn);
        let summary = ImportLogic::apply(&store, &roster)?;

        success(format!(
            "Roster imported: {} person(s), {} weekly line(s), {} override(s)",
            summary.persons, summary.weekly_lines, summary.overrides
        ));
    }
    Ok(())
}
