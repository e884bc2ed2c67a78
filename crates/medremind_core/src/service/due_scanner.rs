//! Due-reminder scan.
//!
//! # Responsibility
//! - Find reminders whose wall-clock minute is now and deliver them at once.
//! - Act as the safety net for exact schedules the platform never fired.
//!
//! # Invariants
//! - A reminder is due iff `(hour, minute)` matches now and its date is on or
//!   before today.
//! - The scan reads the store only; it never mutates reminders.
//! - No de-duplication: a reminder matched by two scans in the same minute is
//!   delivered twice.

use crate::model::reminder::{Reminder, ReminderId};
use crate::notify::{NotificationContent, NotificationId, NotificationScheduler, ScheduleOutcome};
use crate::repo::reminder_repo::{PersistenceResult, ReminderStore};
use chrono::NaiveDateTime;
use log::{debug, info};
use std::sync::Arc;
use std::time::Instant;

/// Summary of one scan pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub scanned_at: NaiveDateTime,
    /// Number of reminders inspected.
    pub scanned: usize,
    /// Reminders handed to immediate delivery, in store order.
    pub fired: Vec<ReminderId>,
}

/// Scans the store for reminders due at a given instant.
pub struct DueReminderScanner<S: ReminderStore> {
    store: Arc<S>,
    scheduler: Arc<NotificationScheduler>,
}

impl<S: ReminderStore> DueReminderScanner<S> {
    pub fn new(store: Arc<S>, scheduler: Arc<NotificationScheduler>) -> Self {
        Self { store, scheduler }
    }

    /// Scans at the scheduler's current instant.
    pub fn scan_now(&self) -> PersistenceResult<ScanReport> {
        self.scan_at(self.scheduler.now())
    }

    /// Delivers every reminder due at `now`.
    ///
    /// # Errors
    /// - Propagates store read/decode failures; nothing is delivered then.
    pub fn scan_at(&self, now: NaiveDateTime) -> PersistenceResult<ScanReport> {
        let started_at = Instant::now();
        let reminders = self.store.list()?;

        let fired = due_reminders(&reminders, now)
            .map(|reminder| {
                let outcome = self.scheduler.deliver_now(
                    NotificationId::for_reminder(&reminder.id),
                    &NotificationContent::due(reminder),
                );
                if outcome == ScheduleOutcome::Undelivered {
                    debug!(
                        "event=due_scan_deliver module=service status=undelivered reminder_id={}",
                        reminder.id
                    );
                }
                reminder.id.clone()
            })
            .collect::<Vec<_>>();

        if fired.is_empty() {
            debug!(
                "event=due_scan module=service status=ok scanned={} fired=0 duration_ms={}",
                reminders.len(),
                started_at.elapsed().as_millis()
            );
        } else {
            info!(
                "event=due_scan module=service status=ok scanned={} fired={} duration_ms={}",
                reminders.len(),
                fired.len(),
                started_at.elapsed().as_millis()
            );
        }

        Ok(ScanReport {
            scanned_at: now,
            scanned: reminders.len(),
            fired,
        })
    }
}

/// Reminders due at `now`, in input order.
pub fn due_reminders(
    reminders: &[Reminder],
    now: NaiveDateTime,
) -> impl Iterator<Item = &Reminder> + '_ {
    reminders
        .iter()
        .filter(move |reminder| reminder.is_due_at(now))
}
