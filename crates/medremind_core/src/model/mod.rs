//! Domain model for medicine reminders.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every reminder is identified by a stable `ReminderId`.
//! - Reminders are single-fire; there is no recurrence rule.

pub mod reminder;
