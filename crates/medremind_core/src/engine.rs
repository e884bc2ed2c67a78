//! Engine wiring.
//!
//! # Responsibility
//! - Build one store, one scheduler, the coordinator, the scanner and the
//!   clock from `EngineConfig` and injected platform collaborators.
//! - Run startup recovery before the periodic scan begins.
//!
//! # Invariants
//! - Exactly one `NotificationScheduler` instance is shared by the
//!   coordinator and the scanner.
//! - Dropping the engine stops the clock.

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::notify::{NotificationDelivery, NotificationPermission, NotificationScheduler};
use crate::repo::profile_repo::ProfileStore;
use crate::repo::reminder_repo::KvReminderStore;
use crate::service::due_scanner::DueReminderScanner;
use crate::service::reminder_clock::{ClockError, ClockState, ReminderClock};
use crate::service::reminder_service::ReminderCoordinator;
use crate::storage::{KeyValueStore, SqliteKeyValueStore, StorageResult};
use log::{error, warn};
use std::sync::Arc;

/// Store type used by the assembled engine.
pub type EngineStore = KvReminderStore<Arc<dyn KeyValueStore>>;

/// Fully wired reminder engine.
pub struct ReminderEngine {
    coordinator: Arc<ReminderCoordinator<EngineStore>>,
    scanner: Arc<DueReminderScanner<EngineStore>>,
    profile: ProfileStore<Arc<dyn KeyValueStore>>,
    clock: ReminderClock,
}

impl ReminderEngine {
    /// Opens the SQLite store at `config.db_path` and wires the engine on the
    /// system clock.
    pub fn open(
        config: &EngineConfig,
        delivery: Arc<dyn NotificationDelivery>,
        permission: Arc<dyn NotificationPermission>,
    ) -> StorageResult<Self> {
        let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteKeyValueStore::open(&config.db_path)?);
        Ok(Self::assemble(
            config,
            kv,
            delivery,
            permission,
            Arc::new(SystemClock),
        ))
    }

    /// Wires the engine over caller-provided collaborators.
    pub fn assemble(
        config: &EngineConfig,
        kv: Arc<dyn KeyValueStore>,
        delivery: Arc<dyn NotificationDelivery>,
        permission: Arc<dyn NotificationPermission>,
        time: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(KvReminderStore::new(Arc::clone(&kv)));
        let scheduler = Arc::new(NotificationScheduler::new(delivery, time));
        let coordinator = ReminderCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&scheduler),
            permission,
        )
        .with_past_add_policy(config.past_add_policy);
        let scanner = DueReminderScanner::new(store, scheduler);

        Self {
            coordinator: Arc::new(coordinator),
            scanner: Arc::new(scanner),
            profile: ProfileStore::new(kv),
            clock: ReminderClock::new(config.scan_interval),
        }
    }

    pub fn coordinator(&self) -> &ReminderCoordinator<EngineStore> {
        &self.coordinator
    }

    pub fn scanner(&self) -> &DueReminderScanner<EngineStore> {
        &self.scanner
    }

    pub fn profile(&self) -> &ProfileStore<Arc<dyn KeyValueStore>> {
        &self.profile
    }

    pub fn clock_state(&self) -> ClockState {
        self.clock.state()
    }

    /// Re-issues future schedules, then starts the periodic due scan.
    ///
    /// A failed recovery pass is logged and does not prevent the scan from
    /// starting. Calling `start` on a running engine is a no-op.
    pub fn start(&self) -> Result<(), ClockError> {
        if self.clock.state() == ClockState::Running {
            return Ok(());
        }

        if let Err(err) = self.coordinator.reschedule_all() {
            warn!(
                "event=engine_start module=engine status=recovery_failed error={}",
                err
            );
        }

        let scanner = Arc::clone(&self.scanner);
        self.clock.start(move || {
            if let Err(err) = scanner.scan_now() {
                error!(
                    "event=due_scan module=engine status=error error={}",
                    err
                );
            }
        })
    }

    /// Stops the periodic scan; idempotent.
    pub fn stop(&self) {
        self.clock.stop();
    }
}
