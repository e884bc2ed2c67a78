//! Core domain logic for the medicine reminder app.
//! This crate is the single source of truth for reminder scheduling rules.

pub mod clock;
pub mod config;
pub mod engine;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, EngineConfig, PastAddPolicy};
pub use engine::{EngineStore, ReminderEngine};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::reminder::{
    Reminder, ReminderDraft, ReminderId, ReminderValidationError, TimeOfDay,
};
pub use notify::{
    DeliveryCommand, DeliveryError, LogDelivery, NotificationContent, NotificationDelivery,
    NotificationId, NotificationPermission, NotificationScheduler, OutboxDelivery,
    PermissionStatus, ScheduleOutcome, SharedPermission,
};
pub use repo::profile_repo::ProfileStore;
pub use repo::reminder_repo::{
    decode_reminders, encode_reminders, KvReminderStore, PersistenceError, PersistenceResult,
    ReminderStore,
};
pub use service::due_scanner::{DueReminderScanner, ScanReport};
pub use service::reminder_clock::{ClockError, ClockState, ReminderClock};
pub use service::reminder_service::{
    AddOutcome, DeleteOutcome, ReminderCoordinator, ServiceError, ServiceResult, UpdateOutcome,
};
pub use storage::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StorageError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
