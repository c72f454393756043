use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::pool::DbPool;
use crate::db::store::SqliteStore;
use crate::errors::AppResult;
use crate::export::ExportLogic;
use crate::utils::path::expand_tilde;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Export {
        format,
        file,
        range,
        force,
    } = cmd
    {
        let pool = DbPool::open_migrated(&cfg.database)?;
        let store = SqliteStore::new(&pool.conn);
        ExportLogic::export(
            &store,
            Some(cfg.org_zone()?),
            *format,
            &expand_tilde(file),
            range.as_deref(),
            *force,
        )?;
    }
    Ok(())
}
