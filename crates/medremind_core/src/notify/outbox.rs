//! Queue-backed delivery for hosts that own the platform notification API.
//!
//! The Flutter host cannot be called back synchronously from the scan worker,
//! so delivery requests are queued here and drained by the host, which then
//! performs them with the platform plugin.

use super::{DeliveryError, NotificationContent, NotificationDelivery, NotificationId};
use chrono::NaiveDateTime;
use log::warn;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Upper bound on queued commands; pushes past it are rejected.
const OUTBOX_CAPACITY: usize = 512;

/// One platform call for the host to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryCommand {
    Show {
        id: NotificationId,
        content: NotificationContent,
    },
    ScheduleExact {
        id: NotificationId,
        content: NotificationContent,
        at: NaiveDateTime,
    },
    Cancel {
        id: NotificationId,
    },
    CancelAll,
}

/// Delivery collaborator that records commands in FIFO order.
#[derive(Debug, Default)]
pub struct OutboxDelivery {
    queue: Mutex<VecDeque<DeliveryCommand>>,
    /// When set, exact scheduling is refused so callers fall back to `Show`.
    exact_unsupported: bool,
}

impl OutboxDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outbox for hosts without exact-alarm capability.
    pub fn without_exact_scheduling() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            exact_unsupported: true,
        }
    }

    /// Removes and returns every queued command, oldest first.
    pub fn drain(&self) -> Vec<DeliveryCommand> {
        match self.queue.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        }
    }

    fn push(&self, command: DeliveryCommand) -> Result<(), DeliveryError> {
        let mut queue = self
            .queue
            .lock()
            .map_err(|_| DeliveryError::Platform("outbox lock poisoned".to_string()))?;
        if queue.len() >= OUTBOX_CAPACITY {
            warn!(
                "event=outbox_push module=notify status=rejected error_code=outbox_full capacity={}",
                OUTBOX_CAPACITY
            );
            return Err(DeliveryError::Platform("outbox full".to_string()));
        }
        queue.push_back(command);
        Ok(())
    }
}

impl NotificationDelivery for OutboxDelivery {
    fn show(
        &self,
        id: NotificationId,
        content: &NotificationContent,
    ) -> Result<(), DeliveryError> {
        self.push(DeliveryCommand::Show {
            id,
            content: content.clone(),
        })
    }

    fn schedule_exact(
        &self,
        id: NotificationId,
        content: &NotificationContent,
        at: NaiveDateTime,
    ) -> Result<(), DeliveryError> {
        if self.exact_unsupported {
            return Err(DeliveryError::ExactUnsupported);
        }
        self.push(DeliveryCommand::ScheduleExact {
            id,
            content: content.clone(),
            at,
        })
    }

    fn cancel(&self, id: NotificationId) -> Result<(), DeliveryError> {
        self.push(DeliveryCommand::Cancel { id })
    }

    fn cancel_all(&self) -> Result<(), DeliveryError> {
        self.push(DeliveryCommand::CancelAll)
    }
}
