//! CLI smoke and diagnostic entry point.
//!
//! # Responsibility
//! - Verify `medremind_core` linkage without the Flutter runtime.
//! - Run one due scan or list reminders against a database file.
//!
//! Usage: `medremind [due|list] [db_path]`. The database path falls back to
//! `MEDREMIND_DB_PATH`, then to the default engine path.

use medremind_core::{EngineConfig, LogDelivery, ReminderEngine, SharedPermission};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let result = match args.first().map(String::as_str) {
        None => {
            println!("medremind_core ping={}", medremind_core::ping());
            println!("medremind_core version={}", medremind_core::core_version());
            Ok(())
        }
        Some("due") => open_engine(args.get(1)).and_then(|engine| run_due(&engine)),
        Some("list") => open_engine(args.get(1)).and_then(|engine| run_list(&engine)),
        Some(other) => Err(format!("unknown command `{other}`; expected `due` or `list`")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("medremind: {message}");
            ExitCode::FAILURE
        }
    }
}

fn open_engine(db_path: Option<&String>) -> Result<ReminderEngine, String> {
    let mut config = EngineConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(path) = db_path {
        config.db_path = PathBuf::from(path);
    }
    ReminderEngine::open(
        &config,
        Arc::new(LogDelivery),
        Arc::new(SharedPermission::new()),
    )
    .map_err(|err| format!("cannot open {}: {err}", config.db_path.display()))
}

fn run_due(engine: &ReminderEngine) -> Result<(), String> {
    let report = engine.scanner().scan_now().map_err(|err| err.to_string())?;
    println!(
        "scanned={} fired={} at={}",
        report.scanned,
        report.fired.len(),
        report.scanned_at.format("%Y-%m-%d %H:%M")
    );
    for id in &report.fired {
        println!("fired {id}");
    }
    Ok(())
}

fn run_list(engine: &ReminderEngine) -> Result<(), String> {
    let reminders = engine
        .coordinator()
        .list_upcoming()
        .map_err(|err| err.to_string())?;
    for reminder in &reminders {
        println!(
            "{} {} {} {}{}",
            reminder.date.format("%Y-%m-%d"),
            reminder.time,
            reminder.id,
            reminder.medicine_name,
            reminder
                .dosage_label()
                .map(|dosage| format!(" ({dosage})"))
                .unwrap_or_default()
        );
    }
    println!("total={}", reminders.len());
    Ok(())
}
