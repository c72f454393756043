use crate::export::ExportFormat;
use clap::{Parser, Subcommand};

/// Command-line interface definition for rAttendance
/// CLI application reconciling biometric punch logs into daily attendance
#[derive(Parser)]
#[command(
    name = "rattendance",
    version = env!("CARGO_PKG_VERSION"),
    about = "Reconcile biometric punch logs into daily attendance records using SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Inspect or migrate the configuration file
    Config {
        #[arg(long = "print", help = "Print the effective configuration")]
        print_config: bool,

        #[arg(long = "check", help = "List configuration fields missing from the file")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing configuration fields with default values")]
        migrate: bool,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal audit log
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,

        #[arg(long = "operation", help = "Only rows of this operation (e.g. notify, edit)")]
        operation: Option<String>,

        #[arg(long = "limit", help = "Only the most recent N rows")]
        limit: Option<usize>,
    },

    /// Import persons, weekly schedules and shift overrides from a YAML roster
    Import {
        #[arg(long, value_name = "FILE")]
        file: String,
    },

    /// Read device punches and reconcile them into attendance records
    Sync {
        /// CSV punch file (columns: user_id,timestamp[,status][,punch])
        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(
            long = "since-watermark",
            help = "Skip punches at or before the last processed punch of this source"
        )]
        since_watermark: bool,

        #[arg(
            long = "source-id",
            help = "Source identifier for the watermark (default: file name)"
        )]
        source_id: Option<String>,

        #[arg(
            long = "now",
            value_name = "INSTANT",
            help = "Evaluate as if the current UTC time were INSTANT (RFC 3339 or 'YYYY-MM-DD HH:MM')"
        )]
        now: Option<String>,
    },

    /// Correct a record by hand (locks the corrected side) or unlock it
    Edit {
        /// Person id
        person: String,

        /// Workday (YYYY-MM-DD)
        date: String,

        #[arg(long = "in", help = "Check-in time (HH:MM, person's zone)")]
        check_in: Option<String>,

        #[arg(long = "out", help = "Check-out time (HH:MM, person's zone)")]
        check_out: Option<String>,

        #[arg(
            long = "unlock",
            conflicts_with_all = ["check_in", "check_out"],
            help = "Clear both locks so the next sync may recompute the record"
        )]
        unlock: bool,
    },

    /// List attendance records
    List {
        #[arg(long, short, help = "Filter by year/month/day or a custom range")]
        period: Option<String>,

        #[arg(long, help = "Only this person")]
        person: Option<String>,
    },

    /// Per-person attendance statistics over a period
    Report {
        #[arg(long, short, help = "Filter by year/month/day or a custom range")]
        period: Option<String>,

        #[arg(long, help = "Only this person")]
        person: Option<String>,

        #[arg(long, help = "Print the report as JSON")]
        json: bool,
    },

    /// Export attendance records
    Export {
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(
            long,
            value_name = "RANGE",
            help = "Filter export by year/month/day or a custom range"
        )]
        range: Option<String>,

        #[arg(long, short = 'f')]
        force: bool,
    },
}
