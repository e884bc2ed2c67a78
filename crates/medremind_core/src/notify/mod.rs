//! Notification delivery contracts and scheduling policy.
//!
//! # Responsibility
//! - Define the platform delivery collaborator (`NotificationDelivery`).
//! - Derive the numeric notification id addressing a reminder's schedule.
//! - Apply the past-time and exact-scheduling fallback policy.
//!
//! # Invariants
//! - A reminder id always maps to the same `NotificationId`, across restarts.
//! - Scheduling failures never propagate; they degrade to immediate delivery.

use crate::model::reminder::ReminderId;
use chrono::NaiveDateTime;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod content;
mod log_delivery;
mod outbox;
pub mod permission;
pub mod scheduler;

pub use content::NotificationContent;
pub use log_delivery::LogDelivery;
pub use outbox::{DeliveryCommand, OutboxDelivery};
pub use permission::{NotificationPermission, PermissionStatus, SharedPermission};
pub use scheduler::{NotificationScheduler, ScheduleOutcome};

const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// Platform notification id (non-negative 31-bit integer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(i32);

impl NotificationId {
    /// Derives the notification id for a reminder.
    ///
    /// 32-bit FNV-1a over the UTF-8 id, top bit cleared so platforms that
    /// require non-negative ids accept it. With 31 bits of output, two
    /// reminders collide with probability about `n^2 / 2^32` for `n`
    /// reminders (under 0.0003% for 100 reminders); a collision makes one
    /// reminder's cancel also drop the other's pending schedule.
    pub fn for_reminder(id: &ReminderId) -> Self {
        let hash = id.as_str().bytes().fold(FNV32_OFFSET_BASIS, |hash, byte| {
            (hash ^ u32::from(byte)).wrapping_mul(FNV32_PRIME)
        });
        // Masked to 31 bits, always fits.
        Self((hash & 0x7fff_ffff) as i32)
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl Display for NotificationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failures reported by the platform delivery collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Exact-time delivery is not available on this platform/state.
    ExactUnsupported,
    /// Platform call failed.
    Platform(String),
}

impl Display for DeliveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExactUnsupported => write!(f, "exact scheduling unsupported"),
            Self::Platform(message) => write!(f, "platform delivery failed: {message}"),
        }
    }
}

impl Error for DeliveryError {}

/// Platform notification delivery.
///
/// Implementations talk to the OS notification center (or queue commands for
/// a host that does). Times are local wall-clock instants.
pub trait NotificationDelivery: Send + Sync {
    /// Shows a notification right now.
    fn show(&self, id: NotificationId, content: &NotificationContent)
        -> Result<(), DeliveryError>;
    /// Registers a delivery for exactly `at`.
    fn schedule_exact(
        &self,
        id: NotificationId,
        content: &NotificationContent,
        at: NaiveDateTime,
    ) -> Result<(), DeliveryError>;
    /// Cancels a pending delivery; unknown ids are not an error.
    fn cancel(&self, id: NotificationId) -> Result<(), DeliveryError>;
    fn cancel_all(&self) -> Result<(), DeliveryError>;
}
