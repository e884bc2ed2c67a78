//! Reminder store contract and key-value implementation.
//!
//! # Responsibility
//! - Persist the full reminder collection as one JSON blob.
//! - Decode strictly: corrupt payloads surface as errors, never as empty data.
//!
//! # Invariants
//! - `save_all` replaces the collection in a single key-value write.
//! - Reminder ids are unique inside a persisted collection.
//! - `encode(decode(x)) == x` for every payload this module produced.

use crate::model::reminder::{Reminder, ReminderId, ReminderValidationError, TimeOfDay};
use crate::storage::{KeyValueStore, StorageError};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::error;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Key under which the reminder collection is persisted.
pub const REMINDERS_KEY: &str = "reminders";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Reminder persistence failures.
#[derive(Debug)]
pub enum PersistenceError {
    Storage(StorageError),
    /// Stored payload could not be decoded.
    Corrupt(String),
    Encode(serde_json::Error),
    Validation(ReminderValidationError),
    DuplicateId(ReminderId),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Corrupt(message) => write!(f, "corrupt reminder payload: {message}"),
            Self::Encode(err) => write!(f, "failed to encode reminders: {err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "duplicate reminder id: {id}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Corrupt(_) | Self::DuplicateId(_) => None,
        }
    }
}

impl From<StorageError> for PersistenceError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<ReminderValidationError> for PersistenceError {
    fn from(value: ReminderValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Durable reminder collection.
pub trait ReminderStore: Send + Sync {
    /// Returns every persisted reminder; empty when nothing was saved yet.
    fn list(&self) -> PersistenceResult<Vec<Reminder>>;
    /// Replaces the whole persisted collection (last writer wins).
    fn save_all(&self, reminders: &[Reminder]) -> PersistenceResult<()>;
}

impl<T: ReminderStore + ?Sized> ReminderStore for Arc<T> {
    fn list(&self) -> PersistenceResult<Vec<Reminder>> {
        (**self).list()
    }

    fn save_all(&self, reminders: &[Reminder]) -> PersistenceResult<()> {
        (**self).save_all(reminders)
    }
}

/// Reminder store persisting through a key-value collaborator.
pub struct KvReminderStore<K: KeyValueStore> {
    kv: K,
    key: String,
}

impl<K: KeyValueStore> KvReminderStore<K> {
    pub fn new(kv: K) -> Self {
        Self::with_key(kv, REMINDERS_KEY)
    }

    pub fn with_key(kv: K, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }
}

impl<K: KeyValueStore> ReminderStore for KvReminderStore<K> {
    fn list(&self) -> PersistenceResult<Vec<Reminder>> {
        match self.kv.get(&self.key)? {
            Some(payload) => decode_reminders(&payload).inspect_err(|err| {
                error!(
                    "event=reminders_decode module=repo status=error key={} error={}",
                    self.key, err
                );
            }),
            None => Ok(Vec::new()),
        }
    }

    fn save_all(&self, reminders: &[Reminder]) -> PersistenceResult<()> {
        let payload = encode_reminders(reminders)?;
        self.kv.set(&self.key, &payload)?;
        Ok(())
    }
}

/// Wire shape of one persisted reminder.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReminderRecord {
    id: String,
    medicine_name: String,
    time: String,
    date: String,
    #[serde(default)]
    dosage: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

/// Serializes a reminder collection into the persisted JSON array format.
///
/// Rejects invalid records and duplicate ids instead of writing them.
pub fn encode_reminders(reminders: &[Reminder]) -> PersistenceResult<String> {
    let mut seen = HashSet::with_capacity(reminders.len());
    let mut records = Vec::with_capacity(reminders.len());
    for reminder in reminders {
        reminder.validate()?;
        if !seen.insert(&reminder.id) {
            return Err(PersistenceError::DuplicateId(reminder.id.clone()));
        }
        records.push(ReminderRecord {
            id: reminder.id.as_str().to_string(),
            medicine_name: reminder.medicine_name.clone(),
            time: reminder.time.to_string(),
            date: reminder.date.format(DATE_FORMAT).to_string(),
            dosage: reminder.dosage.clone(),
            notes: reminder.notes.clone(),
        });
    }
    serde_json::to_string(&records).map_err(PersistenceError::Encode)
}

/// Parses the persisted JSON array format.
///
/// Any malformed record fails the whole decode.
pub fn decode_reminders(payload: &str) -> PersistenceResult<Vec<Reminder>> {
    let records: Vec<ReminderRecord> =
        serde_json::from_str(payload).map_err(|err| PersistenceError::Corrupt(err.to_string()))?;

    let mut seen = HashSet::with_capacity(records.len());
    let mut reminders = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let reminder = parse_record(record)
            .map_err(|message| PersistenceError::Corrupt(format!("record {index}: {message}")))?;
        if !seen.insert(reminder.id.clone()) {
            return Err(PersistenceError::DuplicateId(reminder.id));
        }
        reminders.push(reminder);
    }
    Ok(reminders)
}

fn parse_record(record: ReminderRecord) -> Result<Reminder, String> {
    let time = record
        .time
        .parse::<TimeOfDay>()
        .map_err(|err| err.to_string())?;
    let date = parse_date(&record.date)
        .ok_or_else(|| format!("invalid date `{}` in reminders.date", record.date))?;

    let reminder = Reminder {
        id: ReminderId::from(record.id),
        medicine_name: record.medicine_name,
        time,
        date,
        dosage: record.dosage,
        notes: record.notes,
    };
    reminder.validate().map_err(|err| err.to_string())?;
    Ok(reminder)
}

/// Accepts a calendar date or an ISO-8601 date-time; keeps the date part.
fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(value, DATE_FORMAT) {
        return Some(date);
    }
    if let Ok(date_time) = value.parse::<NaiveDateTime>() {
        return Some(date_time.date());
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|date_time| date_time.date_naive())
}

#[cfg(test)]
mod tests {
    use super::{decode_reminders, encode_reminders, parse_date, PersistenceError};
    use chrono::NaiveDate;

    #[test]
    fn parse_date_accepts_date_time_forms() {
        let expected = NaiveDate::from_ymd_opt(2026, 5, 1);
        assert_eq!(parse_date("2026-05-01"), expected);
        assert_eq!(parse_date("2026-05-01T00:00:00.000"), expected);
        assert_eq!(parse_date("2026-05-01T21:15:00+02:00"), expected);
        assert_eq!(parse_date("05/01/2026"), None);
    }

    #[test]
    fn encode_decode_is_exact_for_well_formed_payload() {
        let payload = r#"[{"id":"a","medicineName":"Aspirin","time":"8:30","date":"2026-05-01","dosage":"1 pill","notes":null},{"id":"b","medicineName":"Zinc","time":"21:05","date":"2026-05-02","dosage":null,"notes":"after dinner"}]"#;
        let decoded = decode_reminders(payload).unwrap();
        assert_eq!(encode_reminders(&decoded).unwrap(), payload);
    }

    #[test]
    fn decode_treats_missing_optional_fields_as_absent() {
        let payload = r#"[{"id":"a","medicineName":"Aspirin","time":"8:30","date":"2026-05-01"}]"#;
        let decoded = decode_reminders(payload).unwrap();
        assert_eq!(decoded[0].dosage, None);
        assert_eq!(decoded[0].notes, None);
    }

    #[test]
    fn decode_rejects_record_missing_required_field() {
        let payload = r#"[{"id":"a","time":"8:30","date":"2026-05-01"}]"#;
        let err = decode_reminders(payload).unwrap_err();
        assert!(matches!(err, PersistenceError::Corrupt(_)));
    }

    #[test]
    fn decode_rejects_malformed_time_with_record_index() {
        let payload = r#"[{"id":"a","medicineName":"A","time":"8:30","date":"2026-05-01"},{"id":"b","medicineName":"B","time":"25:00","date":"2026-05-01"}]"#;
        match decode_reminders(payload).unwrap_err() {
            PersistenceError::Corrupt(message) => assert!(message.contains("record 1")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn decode_rejects_duplicate_ids() {
        let payload = r#"[{"id":"a","medicineName":"A","time":"8:30","date":"2026-05-01"},{"id":"a","medicineName":"B","time":"9:30","date":"2026-05-01"}]"#;
        let err = decode_reminders(payload).unwrap_err();
        assert!(matches!(err, PersistenceError::DuplicateId(id) if id.as_str() == "a"));
    }
}
