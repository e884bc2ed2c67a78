//! Repository layer over the key-value persistence collaborator.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Own the persisted JSON format so services never see raw blobs.
//!
//! # Invariants
//! - Repository writes must enforce `Reminder::validate()` before persistence.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod profile_repo;
pub mod reminder_repo;
