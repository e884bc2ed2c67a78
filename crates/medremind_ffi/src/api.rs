//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose reminder use cases to Dart via FRB over one shared engine.
//! - Hand platform notification work back to Dart as drained commands.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - All calls share one lazily-built engine; a failed build is retried on
//!   the next call.
//! - Dates cross the boundary as `YYYY-MM-DD`, times as `H:MM`, instants as
//!   local `YYYY-MM-DDTHH:MM:SS`.

use chrono::{NaiveDate, NaiveDateTime};
use log::error;
use medremind_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    DeleteOutcome, DeliveryCommand, EngineConfig, OutboxDelivery, PermissionStatus, Reminder,
    ReminderDraft, ReminderEngine, ReminderId, ScheduleOutcome, SharedPermission, TimeOfDay,
    UpdateOutcome,
};
use once_cell::sync::OnceCell;
use std::sync::Arc;

const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

static ENGINE: OnceCell<EngineHandle> = OnceCell::new();

struct EngineHandle {
    engine: ReminderEngine,
    outbox: Arc<OutboxDelivery>,
    permission: Arc<SharedPermission>,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Reminder as seen by Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderItem {
    pub id: String,
    pub medicine_name: String,
    /// `H:MM`, 24-hour.
    pub time: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub dosage: Option<String>,
    pub notes: Option<String>,
}

/// Action response envelope for add/update/delete/clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Affected reminder id, when one exists.
    pub reminder_id: Option<String>,
    /// Scheduling outcome label (`scheduled|delivered_now|fell_back|undelivered|skipped`).
    pub schedule: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ReminderActionResponse {
    fn success(
        message: impl Into<String>,
        reminder_id: Option<String>,
        schedule: Option<String>,
    ) -> Self {
        Self {
            ok: true,
            reminder_id,
            schedule,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            reminder_id: None,
            schedule: None,
            message: message.into(),
        }
    }
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderListResponse {
    pub ok: bool,
    /// Reminders ordered by fire instant.
    pub items: Vec<ReminderItem>,
    pub message: String,
}

/// Result of one on-demand due scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResponse {
    pub ok: bool,
    pub scanned: u32,
    pub fired_ids: Vec<String>,
    pub message: String,
}

/// One platform notification call for Dart to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryCommandItem {
    /// `show|schedule_exact|cancel|cancel_all`.
    pub kind: String,
    pub notification_id: Option<i32>,
    pub title: Option<String>,
    pub body: Option<String>,
    /// Local `YYYY-MM-DDTHH:MM:SS`; only for `schedule_exact`.
    pub at_local: Option<String>,
}

/// Display-name response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileResponse {
    pub ok: bool,
    pub name: Option<String>,
    pub message: String,
}

/// Creates a reminder and programs its notification.
///
/// # FFI contract
/// - Sync call, store-backed execution.
/// - Blank `dosage`/`notes` are stored as absent.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_add(
    medicine_name: String,
    time: String,
    date: String,
    dosage: Option<String>,
    notes: Option<String>,
) -> ReminderActionResponse {
    let draft = match parse_draft(medicine_name, &time, &date, dosage, notes) {
        Ok(draft) => draft,
        Err(message) => {
            return ReminderActionResponse::failure(format!("reminder_add failed: {message}"))
        }
    };
    let result = with_engine(|handle| {
        handle
            .engine
            .coordinator()
            .add(draft)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(outcome) => ReminderActionResponse::success(
            "Reminder added.",
            Some(outcome.reminder.id.to_string()),
            Some(schedule_label(outcome.schedule).to_string()),
        ),
        Err(message) => ReminderActionResponse::failure(format!("reminder_add failed: {message}")),
    }
}

/// Replaces an existing reminder and reprograms its notification.
///
/// # FFI contract
/// - Unknown `id` returns `ok=false` without side effects.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_update(
    id: String,
    medicine_name: String,
    time: String,
    date: String,
    dosage: Option<String>,
    notes: Option<String>,
) -> ReminderActionResponse {
    let reminder = match parse_draft(medicine_name, &time, &date, dosage, notes) {
        Ok(mut draft) => {
            draft.id = Some(ReminderId::from(id.trim()));
            draft.into_reminder()
        }
        Err(message) => {
            return ReminderActionResponse::failure(format!("reminder_update failed: {message}"))
        }
    };
    let reminder_id = reminder.id.to_string();
    let result = with_engine(|handle| {
        handle
            .engine
            .coordinator()
            .update(reminder)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(UpdateOutcome::Updated { schedule }) => ReminderActionResponse::success(
            "Reminder updated.",
            Some(reminder_id),
            Some(schedule_label(schedule).to_string()),
        ),
        Ok(UpdateOutcome::NotFound) => ReminderActionResponse::failure(format!(
            "reminder_update failed: unknown id {reminder_id}"
        )),
        Err(message) => {
            ReminderActionResponse::failure(format!("reminder_update failed: {message}"))
        }
    }
}

/// Deletes a reminder and cancels its notification.
///
/// # FFI contract
/// - Deleting an unknown id succeeds (the cancel is still issued).
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_delete(id: String) -> ReminderActionResponse {
    let reminder_id = ReminderId::from(id.trim());
    let result = with_engine(|handle| {
        handle
            .engine
            .coordinator()
            .delete(&reminder_id)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(DeleteOutcome::Deleted(reminder)) => ReminderActionResponse::success(
            "Reminder deleted.",
            Some(reminder.id.to_string()),
            None,
        ),
        Ok(DeleteOutcome::NotFound) => ReminderActionResponse::success(
            "Reminder not found; nothing to delete.",
            Some(reminder_id.to_string()),
            None,
        ),
        Err(message) => {
            ReminderActionResponse::failure(format!("reminder_delete failed: {message}"))
        }
    }
}

/// Lists reminders ordered by fire instant.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_list() -> ReminderListResponse {
    let result = with_engine(|handle| {
        handle
            .engine
            .coordinator()
            .list_upcoming()
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(reminders) => {
            let items = reminders.iter().map(to_reminder_item).collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No reminders.".to_string()
            } else {
                format!("Found {} reminder(s).", items.len())
            };
            ReminderListResponse {
                ok: true,
                items,
                message,
            }
        }
        Err(message) => ReminderListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("reminder_list failed: {message}"),
        },
    }
}

/// Removes every reminder and cancels all pending notifications.
#[flutter_rust_bridge::frb(sync)]
pub fn reminders_clear() -> ReminderActionResponse {
    let result = with_engine(|handle| {
        handle
            .engine
            .coordinator()
            .clear_all()
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(removed) => {
            ReminderActionResponse::success(format!("Removed {removed} reminder(s)."), None, None)
        }
        Err(message) => {
            ReminderActionResponse::failure(format!("reminders_clear failed: {message}"))
        }
    }
}

/// Runs one due scan immediately, outside the periodic clock.
#[flutter_rust_bridge::frb(sync)]
pub fn scan_due_now() -> ScanResponse {
    let result = with_engine(|handle| {
        handle
            .engine
            .scanner()
            .scan_now()
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(report) => ScanResponse {
            ok: true,
            scanned: u32::try_from(report.scanned).unwrap_or(u32::MAX),
            message: format!("Fired {} reminder(s).", report.fired.len()),
            fired_ids: report.fired.iter().map(ToString::to_string).collect(),
        },
        Err(message) => ScanResponse {
            ok: false,
            scanned: 0,
            fired_ids: Vec::new(),
            message: format!("scan_due_now failed: {message}"),
        },
    }
}

/// Re-issues future schedules and starts the periodic due scan.
///
/// # FFI contract
/// - Idempotent while running.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn clock_start() -> String {
    match with_engine(|handle| handle.engine.start().map_err(|err| err.to_string())) {
        Ok(()) => String::new(),
        Err(message) => format!("clock_start failed: {message}"),
    }
}

/// Stops the periodic due scan; idempotent.
#[flutter_rust_bridge::frb(sync)]
pub fn clock_stop() -> String {
    match ENGINE.get() {
        Some(handle) => {
            handle.engine.stop();
            String::new()
        }
        None => String::new(),
    }
}

/// Removes and returns queued platform notification calls, oldest first.
///
/// # FFI contract
/// - Dart performs the returned calls in order with its notification plugin.
/// - Returns an empty list before the engine is built.
#[flutter_rust_bridge::frb(sync)]
pub fn drain_delivery_commands() -> Vec<DeliveryCommandItem> {
    match ENGINE.get() {
        Some(handle) => handle
            .outbox
            .drain()
            .into_iter()
            .map(to_command_item)
            .collect(),
        None => Vec::new(),
    }
}

/// Reads the saved display name.
#[flutter_rust_bridge::frb(sync)]
pub fn profile_get_name() -> ProfileResponse {
    match with_engine(|handle| {
        handle
            .engine
            .profile()
            .display_name()
            .map_err(|err| err.to_string())
    }) {
        Ok(name) => ProfileResponse {
            ok: true,
            name,
            message: String::new(),
        },
        Err(message) => ProfileResponse {
            ok: false,
            name: None,
            message: format!("profile_get_name failed: {message}"),
        },
    }
}

/// Saves the display name; blank input clears it.
#[flutter_rust_bridge::frb(sync)]
pub fn profile_set_name(name: String) -> ProfileResponse {
    match with_engine(|handle| {
        handle
            .engine
            .profile()
            .set_display_name(&name)
            .map_err(|err| err.to_string())
    }) {
        Ok(saved) => ProfileResponse {
            ok: true,
            name: saved,
            message: String::new(),
        },
        Err(message) => ProfileResponse {
            ok: false,
            name: None,
            message: format!("profile_set_name failed: {message}"),
        },
    }
}

/// Records the platform notification permission reported by Dart.
///
/// Input semantics:
/// - `status`: one of `granted|denied|unknown` (case-insensitive).
///
/// Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn set_notification_permission(status: String) -> String {
    let parsed = match status.trim().to_ascii_lowercase().as_str() {
        "granted" => PermissionStatus::Granted,
        "denied" => PermissionStatus::Denied,
        "unknown" => PermissionStatus::Unknown,
        other => return format!("unsupported permission status: {other}"),
    };
    match with_engine(|handle| {
        handle.permission.set(parsed);
        Ok(())
    }) {
        Ok(()) => String::new(),
        Err(message) => format!("set_notification_permission failed: {message}"),
    }
}

fn with_engine<T>(f: impl FnOnce(&EngineHandle) -> Result<T, String>) -> Result<T, String> {
    let handle = ENGINE.get_or_try_init(build_engine)?;
    f(handle)
}

fn build_engine() -> Result<EngineHandle, String> {
    let config =
        EngineConfig::from_env().map_err(|err| format!("engine config invalid: {err}"))?;
    let outbox = Arc::new(OutboxDelivery::new());
    let permission = Arc::new(SharedPermission::new());
    let engine = ReminderEngine::open(&config, outbox.clone(), permission.clone())
        .map_err(|err| {
            error!(
                "event=engine_build module=ffi status=error db_path={} error={}",
                config.db_path.display(),
                err
            );
            format!("engine DB open failed: {err}")
        })?;
    Ok(EngineHandle {
        engine,
        outbox,
        permission,
    })
}

fn parse_draft(
    medicine_name: String,
    time: &str,
    date: &str,
    dosage: Option<String>,
    notes: Option<String>,
) -> Result<ReminderDraft, String> {
    let time = time
        .trim()
        .parse::<TimeOfDay>()
        .map_err(|err| err.to_string())?;
    let date = parse_date_input(date)?;
    let mut draft = ReminderDraft::new(medicine_name.trim(), time, date);
    draft.dosage = non_blank(dosage);
    draft.notes = non_blank(notes);
    Ok(draft)
}

/// Accepts `YYYY-MM-DD` or a date-time whose date part is kept.
fn parse_date_input(raw: &str) -> Result<NaiveDate, String> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date())
        })
        .map_err(|_| format!("invalid date `{trimmed}`, expected YYYY-MM-DD"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn schedule_label(outcome: Option<ScheduleOutcome>) -> &'static str {
    match outcome {
        Some(ScheduleOutcome::Scheduled(_)) => "scheduled",
        Some(ScheduleOutcome::DeliveredNow) => "delivered_now",
        Some(ScheduleOutcome::FellBackToImmediate) => "fell_back",
        Some(ScheduleOutcome::Undelivered) => "undelivered",
        None => "skipped",
    }
}

fn to_reminder_item(reminder: &Reminder) -> ReminderItem {
    ReminderItem {
        id: reminder.id.to_string(),
        medicine_name: reminder.medicine_name.clone(),
        time: reminder.time.to_string(),
        date: reminder.date.format("%Y-%m-%d").to_string(),
        dosage: reminder.dosage.clone(),
        notes: reminder.notes.clone(),
    }
}

fn to_command_item(command: DeliveryCommand) -> DeliveryCommandItem {
    match command {
        DeliveryCommand::Show { id, content } => DeliveryCommandItem {
            kind: "show".to_string(),
            notification_id: Some(id.get()),
            title: Some(content.title),
            body: Some(content.body),
            at_local: None,
        },
        DeliveryCommand::ScheduleExact { id, content, at } => DeliveryCommandItem {
            kind: "schedule_exact".to_string(),
            notification_id: Some(id.get()),
            title: Some(content.title),
            body: Some(content.body),
            at_local: Some(at.format(INSTANT_FORMAT).to_string()),
        },
        DeliveryCommand::Cancel { id } => DeliveryCommandItem {
            kind: "cancel".to_string(),
            notification_id: Some(id.get()),
            title: None,
            body: None,
            at_local: None,
        },
        DeliveryCommand::CancelAll => DeliveryCommandItem {
            kind: "cancel_all".to_string(),
            notification_id: None,
            title: None,
            body: None,
            at_local: None,
        },
    }
}
