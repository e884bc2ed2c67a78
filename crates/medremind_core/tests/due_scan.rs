mod common;

use common::{at, date, Call, Harness};
use medremind_core::{
    DueReminderScanner, KvReminderStore, MemoryKeyValueStore, NotificationId, Reminder,
    ReminderDraft, ReminderId, ReminderStore, TimeOfDay,
};
use std::sync::Arc;

fn reminder(id: &str, name: &str, hour: u8, minute: u8, day: u32) -> Reminder {
    let time = TimeOfDay::new(hour, minute).unwrap();
    let mut draft = ReminderDraft::new(name, time, date(2026, 10, day));
    draft.id = Some(ReminderId::from(id));
    draft.into_reminder()
}

fn scanner(harness: &Harness) -> DueReminderScanner<common::MemoryStore> {
    DueReminderScanner::new(Arc::clone(&harness.store), Arc::clone(&harness.scheduler))
}

#[test]
fn scan_fires_exactly_matching_minute_on_or_before_today() {
    let harness = Harness::at(at(2026, 10, 19, 8, 30));
    harness
        .store
        .save_all(&[
            reminder("today", "Aspirin", 8, 30, 19),
            reminder("yesterday", "Zinc", 8, 30, 18),
            reminder("tomorrow", "Iron", 8, 30, 20),
            reminder("other-minute", "Vitamin C", 8, 31, 19),
            reminder("other-hour", "Vitamin D", 9, 30, 19),
        ])
        .unwrap();

    let report = scanner(&harness).scan_now().unwrap();

    assert_eq!(report.scanned, 5);
    assert_eq!(report.scanned_at, at(2026, 10, 19, 8, 30));
    assert_eq!(
        report.fired,
        vec![ReminderId::from("today"), ReminderId::from("yesterday")]
    );
    let shown_ids = harness
        .delivery
        .shows()
        .into_iter()
        .map(|call| match call {
            Call::Show { id, .. } => id,
            other => panic!("unexpected call {other:?}"),
        })
        .collect::<Vec<_>>();
    assert_eq!(
        shown_ids,
        vec![
            NotificationId::for_reminder(&ReminderId::from("today")),
            NotificationId::for_reminder(&ReminderId::from("yesterday")),
        ]
    );
}

#[test]
fn scan_delivery_is_titled_with_medicine_name_and_dosage() {
    let harness = Harness::at(at(2026, 10, 19, 8, 30));
    let mut dosed = reminder("a", "Aspirin", 8, 30, 19);
    dosed.dosage = Some("1 pill".to_string());
    harness.store.save_all(&[dosed]).unwrap();

    scanner(&harness).scan_now().unwrap();

    match harness.delivery.shows().as_slice() {
        [Call::Show { title, body, .. }] => {
            assert_eq!(title, "Aspirin");
            assert!(body.starts_with("Time to take"));
            assert!(body.contains("1 pill"));
        }
        other => panic!("expected one delivery, got {other:?}"),
    }
}

#[test]
fn scan_ignores_seconds_within_the_minute() {
    let harness = Harness::at(at(2026, 10, 19, 8, 30));
    harness
        .store
        .save_all(&[reminder("a", "Aspirin", 8, 30, 19)])
        .unwrap();
    let late_in_minute = date(2026, 10, 19).and_hms_opt(8, 30, 59).unwrap();

    let report = scanner(&harness).scan_at(late_in_minute).unwrap();
    assert_eq!(report.fired.len(), 1);
}

#[test]
fn repeated_scans_in_same_minute_fire_again() {
    let harness = Harness::at(at(2026, 10, 19, 8, 30));
    harness
        .store
        .save_all(&[reminder("a", "Aspirin", 8, 30, 19)])
        .unwrap();
    let scanner = scanner(&harness);

    scanner.scan_now().unwrap();
    scanner.scan_now().unwrap();

    assert_eq!(harness.delivery.shows().len(), 2);
}

#[test]
fn scan_never_mutates_the_store() {
    let harness = Harness::at(at(2026, 10, 19, 8, 30));
    let stored = vec![reminder("a", "Aspirin", 8, 30, 19)];
    harness.store.save_all(&stored).unwrap();

    scanner(&harness).scan_now().unwrap();

    assert_eq!(harness.store.list().unwrap(), stored);
}

#[test]
fn scan_of_empty_store_fires_nothing() {
    let harness = Harness::at(at(2026, 10, 19, 8, 30));

    let report = scanner(&harness).scan_now().unwrap();

    assert_eq!(report.scanned, 0);
    assert!(report.fired.is_empty());
    assert!(harness.delivery.calls().is_empty());
}

#[test]
fn scan_surfaces_corrupt_store_and_delivers_nothing() {
    use medremind_core::KeyValueStore;

    let kv = Arc::new(MemoryKeyValueStore::new());
    kv.set("reminders", "{not json").unwrap();
    let store = Arc::new(KvReminderStore::new(Arc::clone(&kv)));
    let harness = Harness::at(at(2026, 10, 19, 8, 30));
    let scanner = DueReminderScanner::new(store, Arc::clone(&harness.scheduler));

    assert!(scanner.scan_now().is_err());
    assert!(harness.delivery.calls().is_empty());
}
