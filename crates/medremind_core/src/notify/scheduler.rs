//! Notification scheduling policy over the delivery collaborator.
//!
//! # Responsibility
//! - Decide between exact scheduling and immediate delivery.
//! - Absorb platform failures with an immediate-delivery fallback.
//!
//! # Invariants
//! - A request for an instant not strictly after now is delivered immediately.
//! - No request is dropped silently: every failure path is logged.
//! - The scheduler does not deduplicate ids; callers cancel before rescheduling.

use super::{DeliveryError, NotificationContent, NotificationDelivery, NotificationId};
use crate::clock::Clock;
use chrono::NaiveDateTime;
use log::{debug, error, info, warn};
use std::sync::Arc;

const CANCEL_ATTEMPTS: usize = 2;

/// What happened to one scheduling request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Exact delivery registered for the given instant.
    Scheduled(NaiveDateTime),
    /// Instant was not in the future; shown immediately.
    DeliveredNow,
    /// Exact scheduling failed; shown immediately instead.
    FellBackToImmediate,
    /// Neither exact nor immediate delivery succeeded.
    Undelivered,
}

/// Single scheduling service shared by the coordinator and the scanner.
pub struct NotificationScheduler {
    delivery: Arc<dyn NotificationDelivery>,
    clock: Arc<dyn Clock>,
}

impl NotificationScheduler {
    pub fn new(delivery: Arc<dyn NotificationDelivery>, clock: Arc<dyn Clock>) -> Self {
        Self { delivery, clock }
    }

    /// Current local instant as seen by this scheduler.
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Schedules `content` for `at`, or delivers it now when `at` has passed.
    pub fn schedule(
        &self,
        id: NotificationId,
        content: &NotificationContent,
        at: NaiveDateTime,
    ) -> ScheduleOutcome {
        let now = self.clock.now();
        if at <= now {
            debug!(
                "event=notification_schedule module=notify status=past id={} at={} now={}",
                id, at, now
            );
            return self.deliver_now(id, content);
        }

        match self.delivery.schedule_exact(id, content, at) {
            Ok(()) => {
                info!(
                    "event=notification_schedule module=notify status=ok id={} at={}",
                    id, at
                );
                ScheduleOutcome::Scheduled(at)
            }
            Err(err) => {
                warn!(
                    "event=notification_schedule module=notify status=fallback id={} at={} error_code={} error={}",
                    id,
                    at,
                    error_code(&err),
                    err
                );
                if self.show(id, content) {
                    ScheduleOutcome::FellBackToImmediate
                } else {
                    ScheduleOutcome::Undelivered
                }
            }
        }
    }

    /// Shows `content` immediately.
    pub fn deliver_now(
        &self,
        id: NotificationId,
        content: &NotificationContent,
    ) -> ScheduleOutcome {
        if self.show(id, content) {
            ScheduleOutcome::DeliveredNow
        } else {
            ScheduleOutcome::Undelivered
        }
    }

    /// Cancels any pending delivery for `id`.
    ///
    /// Idempotent. A failing platform cancel is retried once, then logged.
    pub fn cancel(&self, id: NotificationId) {
        for attempt in 1..=CANCEL_ATTEMPTS {
            match self.delivery.cancel(id) {
                Ok(()) => {
                    debug!(
                        "event=notification_cancel module=notify status=ok id={} attempt={}",
                        id, attempt
                    );
                    return;
                }
                Err(err) => {
                    warn!(
                        "event=notification_cancel module=notify status=error id={} attempt={} error={}",
                        id, attempt, err
                    );
                }
            }
        }
        error!(
            "event=notification_cancel module=notify status=abandoned id={} attempts={}",
            id, CANCEL_ATTEMPTS
        );
    }

    /// Cancels every pending delivery.
    pub fn cancel_all(&self) {
        if let Err(err) = self.delivery.cancel_all() {
            error!(
                "event=notification_cancel_all module=notify status=error error={}",
                err
            );
        }
    }

    fn show(&self, id: NotificationId, content: &NotificationContent) -> bool {
        match self.delivery.show(id, content) {
            Ok(()) => {
                info!("event=notification_show module=notify status=ok id={id}");
                true
            }
            Err(err) => {
                error!(
                    "event=notification_show module=notify status=error id={} error_code={} error={}",
                    id,
                    error_code(&err),
                    err
                );
                false
            }
        }
    }
}

fn error_code(err: &DeliveryError) -> &'static str {
    match err {
        DeliveryError::ExactUnsupported => "exact_unsupported",
        DeliveryError::Platform(_) => "platform_failed",
    }
}
