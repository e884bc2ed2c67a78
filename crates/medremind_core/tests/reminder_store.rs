use chrono::NaiveDate;
use medremind_core::{
    decode_reminders, encode_reminders, KeyValueStore, KvReminderStore, MemoryKeyValueStore,
    PersistenceError, Reminder, ReminderDraft, ReminderStore, SqliteKeyValueStore, TimeOfDay,
};
use std::sync::Arc;

fn sample(name: &str, hour: u8, minute: u8) -> Reminder {
    ReminderDraft::new(
        name,
        TimeOfDay::new(hour, minute).unwrap(),
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
    )
    .with_dosage("1 pill")
    .with_notes("with water")
    .into_reminder()
}

#[test]
fn list_is_empty_before_first_save() {
    let store = KvReminderStore::new(MemoryKeyValueStore::new());
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn save_all_replaces_whole_collection() {
    let store = KvReminderStore::new(MemoryKeyValueStore::new());
    let first = sample("Aspirin", 8, 30);
    let second = sample("Zinc", 21, 5);

    store.save_all(&[first.clone(), second.clone()]).unwrap();
    assert_eq!(store.list().unwrap(), vec![first, second.clone()]);

    store.save_all(&[second.clone()]).unwrap();
    assert_eq!(store.list().unwrap(), vec![second]);
}

#[test]
fn persisted_blob_uses_camel_case_fields_and_h_mm_time() {
    let kv = Arc::new(MemoryKeyValueStore::new());
    let store = KvReminderStore::new(Arc::clone(&kv));
    let mut reminder = sample("Aspirin", 8, 5);
    reminder.notes = None;
    store.save_all(&[reminder.clone()]).unwrap();

    let raw = kv.get("reminders").unwrap().expect("blob should be written");
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let record = &value[0];
    assert_eq!(record["id"], reminder.id.as_str());
    assert_eq!(record["medicineName"], "Aspirin");
    assert_eq!(record["time"], "8:05");
    assert_eq!(record["date"], "2026-10-19");
    assert_eq!(record["dosage"], "1 pill");
    assert!(record["notes"].is_null());
}

#[test]
fn corrupt_blob_surfaces_error_instead_of_empty_list() {
    let kv = Arc::new(MemoryKeyValueStore::new());
    kv.set("reminders", r#"[{"id":"a","medicineName":"A"}]"#)
        .unwrap();
    let store = KvReminderStore::new(Arc::clone(&kv));

    let err = store.list().unwrap_err();
    assert!(matches!(err, PersistenceError::Corrupt(_)));
    assert!(kv.get("reminders").unwrap().is_some());
}

#[test]
fn save_all_rejects_duplicate_ids_without_writing() {
    let kv = Arc::new(MemoryKeyValueStore::new());
    let store = KvReminderStore::new(Arc::clone(&kv));
    let reminder = sample("Aspirin", 8, 30);

    let err = store
        .save_all(&[reminder.clone(), reminder.clone()])
        .unwrap_err();
    assert!(matches!(err, PersistenceError::DuplicateId(_)));
    assert_eq!(kv.get("reminders").unwrap(), None);
}

#[test]
fn encode_of_decode_reproduces_legacy_payload() {
    let payload = r#"[{"id":"1700000000000","medicineName":"Metformin","time":"0:00","date":"2025-01-31","dosage":"500 mg","notes":"with food"}]"#;
    let decoded = decode_reminders(payload).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].id.as_str(), "1700000000000");
    assert_eq!(encode_reminders(&decoded).unwrap(), payload);
}

#[test]
fn sqlite_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reminders.db");
    let reminder = sample("Aspirin", 8, 30);

    {
        let store = KvReminderStore::new(SqliteKeyValueStore::open(&path).unwrap());
        store.save_all(&[reminder.clone()]).unwrap();
    }

    let reopened = KvReminderStore::new(SqliteKeyValueStore::open(&path).unwrap());
    assert_eq!(reopened.list().unwrap(), vec![reminder]);
}
