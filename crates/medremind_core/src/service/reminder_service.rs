//! Reminder lifecycle coordination.
//!
//! # Responsibility
//! - Provide add/update/delete entry points for UI callers.
//! - Keep the persisted collection and pending notifications in step.
//!
//! # Invariants
//! - The store is written before any notification call; a scheduling failure
//!   never undoes or blocks persistence.
//! - Delete always cancels the derived notification id, so no schedule
//!   outlives its reminder.
//! - Update cancels the prior schedule before issuing the new one, leaving
//!   exactly one pending delivery per reminder.
//! - Every mutating operation holds `write_lock` from its store read until
//!   its last notification call, so a concurrent delete can never be
//!   followed by a schedule for the removed id.

use crate::config::PastAddPolicy;
use crate::model::reminder::{Reminder, ReminderDraft, ReminderId, ReminderValidationError};
use crate::notify::{
    NotificationContent, NotificationId, NotificationPermission, NotificationScheduler,
    PermissionStatus, ScheduleOutcome,
};
use crate::repo::reminder_repo::{PersistenceError, ReminderStore};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Coordinator-level failures.
#[derive(Debug)]
pub enum ServiceError {
    Validation(ReminderValidationError),
    /// An add supplied an id that is already stored.
    DuplicateId(ReminderId),
    Persistence(PersistenceError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "reminder already exists: {id}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::DuplicateId(_) => None,
        }
    }
}

impl From<ReminderValidationError> for ServiceError {
    fn from(value: ReminderValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PersistenceError> for ServiceError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::Validation(err) => Self::Validation(err),
            other => Self::Persistence(other),
        }
    }
}

/// Result of a successful add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub reminder: Reminder,
    /// `None` when the past-add policy skipped notification.
    pub schedule: Option<ScheduleOutcome>,
}

/// Result of an update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated { schedule: Option<ScheduleOutcome> },
    /// No stored reminder had that id; nothing changed.
    NotFound,
}

/// Result of a delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(Reminder),
    /// No stored reminder had that id; only the (idempotent) cancel ran.
    NotFound,
}

/// Coordinates reminder CRUD with notification scheduling.
pub struct ReminderCoordinator<S: ReminderStore> {
    store: Arc<S>,
    scheduler: Arc<NotificationScheduler>,
    permission: Arc<dyn NotificationPermission>,
    past_add_policy: PastAddPolicy,
    write_lock: Mutex<()>,
}

impl<S: ReminderStore> ReminderCoordinator<S> {
    pub fn new(
        store: Arc<S>,
        scheduler: Arc<NotificationScheduler>,
        permission: Arc<dyn NotificationPermission>,
    ) -> Self {
        Self {
            store,
            scheduler,
            permission,
            past_add_policy: PastAddPolicy::default(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_past_add_policy(mut self, policy: PastAddPolicy) -> Self {
        self.past_add_policy = policy;
        self
    }

    /// Forwards the platform permission state to the caller.
    pub fn notification_permission(&self) -> PermissionStatus {
        self.permission.status()
    }

    /// Lists reminders in persisted order.
    pub fn list(&self) -> ServiceResult<Vec<Reminder>> {
        Ok(self.store.list()?)
    }

    /// Lists reminders ordered by fire instant, then id.
    pub fn list_upcoming(&self) -> ServiceResult<Vec<Reminder>> {
        let mut reminders = self.store.list()?;
        reminders.sort_by(|left, right| {
            left.fire_at()
                .cmp(&right.fire_at())
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(reminders)
    }

    pub fn get(&self, id: &ReminderId) -> ServiceResult<Option<Reminder>> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .find(|reminder| &reminder.id == id))
    }

    /// Persists a new reminder and programs its notification.
    ///
    /// # Errors
    /// - `Validation` for a blank medicine name.
    /// - `DuplicateId` when the draft carries an id that is already stored.
    /// - `Persistence` when the store cannot be read or written.
    pub fn add(&self, draft: ReminderDraft) -> ServiceResult<AddOutcome> {
        let reminder = draft.into_reminder();
        reminder.validate()?;

        let _guard = self.lock_writes();
        let mut reminders = self.store.list()?;
        if reminders.iter().any(|existing| existing.id == reminder.id) {
            return Err(ServiceError::DuplicateId(reminder.id));
        }
        reminders.push(reminder.clone());
        self.store.save_all(&reminders)?;

        let schedule = self.program(&reminder, "add");
        info!(
            "event=reminder_add module=service status=ok reminder_id={} schedule={:?}",
            reminder.id, schedule
        );
        Ok(AddOutcome { reminder, schedule })
    }

    /// Replaces a stored reminder and reprograms its notification.
    ///
    /// Returns `UpdateOutcome::NotFound` (no store or scheduler change) when
    /// the id is unknown.
    pub fn update(&self, reminder: Reminder) -> ServiceResult<UpdateOutcome> {
        reminder.validate()?;

        let _guard = self.lock_writes();
        let mut reminders = self.store.list()?;
        let Some(slot) = reminders
            .iter_mut()
            .find(|existing| existing.id == reminder.id)
        else {
            warn!(
                "event=reminder_update module=service status=not_found reminder_id={}",
                reminder.id
            );
            return Ok(UpdateOutcome::NotFound);
        };
        *slot = reminder.clone();
        self.store.save_all(&reminders)?;

        self.scheduler
            .cancel(NotificationId::for_reminder(&reminder.id));
        let schedule = self.program(&reminder, "update");
        info!(
            "event=reminder_update module=service status=ok reminder_id={} schedule={:?}",
            reminder.id, schedule
        );
        Ok(UpdateOutcome::Updated { schedule })
    }

    /// Removes a reminder and cancels its notification.
    ///
    /// The cancel is issued even when the id is unknown.
    pub fn delete(&self, id: &ReminderId) -> ServiceResult<DeleteOutcome> {
        let _guard = self.lock_writes();
        let mut reminders = self.store.list()?;
        let removed = match reminders.iter().position(|existing| &existing.id == id) {
            Some(index) => {
                let removed = reminders.remove(index);
                self.store.save_all(&reminders)?;
                Some(removed)
            }
            None => None,
        };

        self.scheduler.cancel(NotificationId::for_reminder(id));
        match removed {
            Some(reminder) => {
                info!(
                    "event=reminder_delete module=service status=ok reminder_id={}",
                    id
                );
                Ok(DeleteOutcome::Deleted(reminder))
            }
            None => {
                warn!(
                    "event=reminder_delete module=service status=not_found reminder_id={}",
                    id
                );
                Ok(DeleteOutcome::NotFound)
            }
        }
    }

    /// Removes every reminder and cancels all pending notifications.
    ///
    /// Returns how many reminders were removed.
    pub fn clear_all(&self) -> ServiceResult<usize> {
        let _guard = self.lock_writes();
        let removed = self.store.list()?.len();
        self.store.save_all(&[])?;

        self.scheduler.cancel_all();
        info!(
            "event=reminder_clear module=service status=ok removed={}",
            removed
        );
        Ok(removed)
    }

    /// Re-issues the schedule of every reminder still in the future.
    ///
    /// Run after process start: platform schedules can be lost across
    /// reboots or reinstalls. Past reminders are left to the due scan.
    /// Returns how many schedules were re-issued.
    pub fn reschedule_all(&self) -> ServiceResult<usize> {
        let _guard = self.lock_writes();
        let reminders = self.store.list()?;
        let now = self.scheduler.now();

        let mut rescheduled = 0;
        for reminder in reminders.iter().filter(|reminder| reminder.fire_at() > now) {
            let id = NotificationId::for_reminder(&reminder.id);
            self.scheduler.cancel(id);
            self.scheduler
                .schedule(id, &NotificationContent::scheduled(reminder), reminder.fire_at());
            rescheduled += 1;
        }

        info!(
            "event=reminder_reschedule_all module=service status=ok total={} rescheduled={}",
            reminders.len(),
            rescheduled
        );
        Ok(rescheduled)
    }

    fn program(&self, reminder: &Reminder, operation: &'static str) -> Option<ScheduleOutcome> {
        let at = reminder.fire_at();
        if self.past_add_policy == PastAddPolicy::Skip && at <= self.scheduler.now() {
            info!(
                "event=reminder_{} module=service status=skip_past reminder_id={} at={}",
                operation, reminder.id, at
            );
            return None;
        }

        Some(self.scheduler.schedule(
            NotificationId::for_reminder(&reminder.id),
            &NotificationContent::scheduled(reminder),
            at,
        ))
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
