use crate::cli::parser::Commands;
use crate::config::Config;
use crate::config::migrate::{migrate_missing_fields, missing_fields};
use crate::errors::AppResult;
use crate::ui::messages::{info, success, warning};

/// Handle the `config` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Config {
        print_config,
        check,
        migrate,
    } = cmd
    {
        let path = Config::config_file();

        // ---- PRINT CONFIG ----
        if *print_config {
            println!("📄 Current configuration:\n");
            println!("{}", serde_yaml::to_string(cfg)?);
        }

        if (*check || *migrate) && !path.exists() {
            warning(format!(
                "No configuration file at {} (defaults in use); run `rattendance init`.",
                path.display()
            ));
            return Ok(());
        }

        // ---- CHECK ----
        if *check {
            let missing = missing_fields(&path)?;
            if missing.is_empty() {
                success("Configuration file is complete.");
            } else {
                info(format!("Missing fields: {}", missing.join(", ")));
            }
        }

        // ---- MIGRATE ----
        if *migrate {
            migrate_missing_fields(&path)?;
        }
    }

    Ok(())
}
