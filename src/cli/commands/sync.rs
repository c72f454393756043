use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::policy::Policy;
use crate::core::sync::{SyncLogic, SyncOptions};
use crate::db::pool::DbPool;
use crate::db::store::SqliteStore;
use crate::errors::{AppError, AppResult};
use crate::sources::CsvPunchSource;
use crate::sources::csv::parse_device_timestamp;
use crate::ui::messages::{info, success, warning};
use crate::utils::path::expand_tilde;
use chrono::{DateTime, Utc};

/// `--now`: RFC 3339, or a naive device-style timestamp taken as UTC.
fn parse_now(raw: &str) -> AppResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Ok(dt.with_timezone(&Utc));
    }
    parse_device_timestamp(raw)
        .map(|naive| naive.and_utc())
        .map_err(|_| AppError::InvalidDate(format!("--now {raw}")))
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Sync {
        file,
        since_watermark,
        source_id,
        now,
    } = cmd
    {
        let now = match now {
            Some(raw) => parse_now(raw)?,
            None => Utc::now(),
        };

        let path = expand_tilde(file);
        let mut source = CsvPunchSource::new(&path);
        if let Some(id) = source_id {
            source = source.with_id(id);
        }

        let opts = SyncOptions {
            since_watermark: *since_watermark,
            days_to_sync: cfg.days_to_sync,
            org_zone: Some(cfg.org_zone()?),
            recipients: cfg.notify_recipients.clone(),
            ..SyncOptions::new(now)
        };

        let pool = DbPool::open_migrated(&cfg.database)?;
        let store = SqliteStore::new(&pool.conn);
        let logic = SyncLogic::new(&store, &store, Policy::from_config(cfg));

        info(format!("Syncing punches from {}", path.display()));
        let summary = logic.run(&mut source, &opts)?;

        if summary.unresolved > 0 {
            warning(format!(
                "{} punch(es) from unknown devices were dropped",
                summary.unresolved
            ));
        }
        success(format!("Sync completed: {summary}"));

        summary.into_result()?;
    }
    Ok(())
}
