//! Reminder domain model.
//!
//! # Responsibility
//! - Define the canonical single-fire medicine reminder record.
//! - Own the `H:MM` time-of-day text form and the local fire instant.
//!
//! # Invariants
//! - `id` is stable for the lifetime of a reminder and never reused.
//! - `medicine_name` is non-empty after trimming.
//! - `time` is always a valid wall-clock minute (`0..=23`, `0..=59`).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

static TIME_OF_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid time-of-day regex"));

/// Opaque, stable reminder identity.
///
/// Persisted ids are treated as opaque text: legacy records may carry any
/// non-empty string, new records get a UUID v4.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(String);

impl ReminderId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for ReminderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ReminderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for ReminderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Date-independent wall-clock minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Builds a time-of-day, rejecting out-of-range components.
    pub fn new(hour: u8, minute: u8) -> Result<Self, ReminderValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ReminderValidationError::TimeOutOfRange { hour, minute });
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    /// Returns whether `instant` falls inside this wall-clock minute.
    pub fn matches(self, instant: NaiveDateTime) -> bool {
        instant.hour() == u32::from(self.hour) && instant.minute() == u32::from(self.minute)
    }

    fn as_naive_time(self) -> NaiveTime {
        // Components are range-checked at construction.
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

/// Text form is `H:MM`: unpadded hour, two-digit minute.
impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ReminderValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ReminderValidationError::InvalidTimeText(value.to_string());
        let caps = TIME_OF_DAY_RE.captures(value).ok_or_else(invalid)?;
        let hour = caps[1].parse::<u8>().map_err(|_| invalid())?;
        let minute = caps[2].parse::<u8>().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

/// Validation failures for reminder records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderValidationError {
    EmptyId,
    EmptyMedicineName,
    TimeOutOfRange { hour: u8, minute: u8 },
    InvalidTimeText(String),
}

impl Display for ReminderValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "reminder id cannot be empty"),
            Self::EmptyMedicineName => write!(f, "medicine name cannot be empty"),
            Self::TimeOutOfRange { hour, minute } => {
                write!(f, "time of day out of range: {hour}:{minute:02}")
            }
            Self::InvalidTimeText(value) => {
                write!(f, "time of day must look like `H:MM`, got `{value}`")
            }
        }
    }
}

impl Error for ReminderValidationError {}

/// Canonical single-fire medicine reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: ReminderId,
    pub medicine_name: String,
    pub time: TimeOfDay,
    pub date: NaiveDate,
    pub dosage: Option<String>,
    pub notes: Option<String>,
}

impl Reminder {
    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), ReminderValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ReminderValidationError::EmptyId);
        }
        if self.medicine_name.trim().is_empty() {
            return Err(ReminderValidationError::EmptyMedicineName);
        }
        Ok(())
    }

    /// Local wall-clock instant at which this reminder is due.
    pub fn fire_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time.as_naive_time())
    }

    /// Returns whether a scan at `now` must deliver this reminder.
    ///
    /// Due means the wall-clock minute matches and the reminder date is today
    /// or earlier.
    pub fn is_due_at(&self, now: NaiveDateTime) -> bool {
        self.time.matches(now) && self.date <= now.date()
    }

    /// Dosage text when it carries something to show.
    pub fn dosage_label(&self) -> Option<&str> {
        self.dosage
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Caller input for creating a reminder.
///
/// `id` is usually `None`; import paths may pass an existing identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderDraft {
    pub id: Option<ReminderId>,
    pub medicine_name: String,
    pub time: TimeOfDay,
    pub date: NaiveDate,
    pub dosage: Option<String>,
    pub notes: Option<String>,
}

impl ReminderDraft {
    pub fn new(medicine_name: impl Into<String>, time: TimeOfDay, date: NaiveDate) -> Self {
        Self {
            id: None,
            medicine_name: medicine_name.into(),
            time,
            date,
            dosage: None,
            notes: None,
        }
    }

    pub fn with_dosage(mut self, dosage: impl Into<String>) -> Self {
        self.dosage = Some(dosage.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Materializes the draft, generating an id when none was supplied.
    pub fn into_reminder(self) -> Reminder {
        Reminder {
            id: self.id.unwrap_or_else(ReminderId::generate),
            medicine_name: self.medicine_name,
            time: self.time,
            date: self.date,
            dosage: self.dosage,
            notes: self.notes,
        }
    }
}
