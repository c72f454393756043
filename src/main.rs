//! rAttendance main entrypoint.

use rattendance::errors::AppError;
use rattendance::run;
use rattendance::ui::messages::error;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_env("RATTENDANCE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run() {
        error(format!("Error: {e}"));
        if e.is_retryable() {
            eprintln!("The batch can be retried safely.");
        }
        std::process::exit(exit_code(&e));
    }
}

fn exit_code(e: &AppError) -> i32 {
    if e.is_retryable() { 2 } else { 1 }
}
