//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store and notification calls into use-case level APIs.
//! - Drive the periodic due scan.
//! - Keep UI/FFI layers decoupled from storage and platform details.

pub mod due_scanner;
pub mod reminder_clock;
pub mod reminder_service;
