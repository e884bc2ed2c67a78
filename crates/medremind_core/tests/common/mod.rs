#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use medremind_core::{
    DeliveryError, FixedClock, KvReminderStore, MemoryKeyValueStore, NotificationContent,
    NotificationDelivery, NotificationId, NotificationScheduler, ReminderCoordinator,
    SharedPermission,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

/// One call observed by `RecordingDelivery`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Show {
        id: NotificationId,
        title: String,
        body: String,
    },
    Schedule {
        id: NotificationId,
        title: String,
        body: String,
        at: NaiveDateTime,
    },
    Cancel(NotificationId),
    CancelAll,
}

/// Delivery double that records calls and models pending platform schedules.
///
/// Pending schedules are kept as a list per id so a missing cancel shows up
/// as two entries.
#[derive(Default)]
pub struct RecordingDelivery {
    calls: Mutex<Vec<Call>>,
    pending: Mutex<HashMap<NotificationId, Vec<NaiveDateTime>>>,
    fail_exact: AtomicBool,
    fail_show: AtomicBool,
    cancel_failures_left: AtomicUsize,
    cancel_gate: Mutex<Option<(Sender<()>, Receiver<()>)>>,
}

impl RecordingDelivery {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_exact(&self, fail: bool) {
        self.fail_exact.store(fail, Ordering::SeqCst);
    }

    pub fn fail_show(&self, fail: bool) {
        self.fail_show.store(fail, Ordering::SeqCst);
    }

    pub fn fail_next_cancels(&self, count: usize) {
        self.cancel_failures_left.store(count, Ordering::SeqCst);
    }

    /// Makes the next `cancel` park until released.
    ///
    /// Returns a receiver signalled once the cancel is parked and a sender
    /// that releases it.
    pub fn hold_next_cancel(&self) -> (Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.cancel_gate.lock().unwrap() = Some((entered_tx, release_rx));
        (entered_rx, release_tx)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn shows(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Show { .. }))
            .collect()
    }

    pub fn schedules(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Schedule { .. }))
            .collect()
    }

    pub fn cancels(&self) -> Vec<NotificationId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Cancel(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Pending schedule instants for `id`.
    pub fn pending_for(&self, id: NotificationId) -> Vec<NaiveDateTime> {
        self.pending
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn pending_total(&self) -> usize {
        self.pending.lock().unwrap().values().map(Vec::len).sum()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl NotificationDelivery for RecordingDelivery {
    fn show(
        &self,
        id: NotificationId,
        content: &NotificationContent,
    ) -> Result<(), DeliveryError> {
        if self.fail_show.load(Ordering::SeqCst) {
            return Err(DeliveryError::Platform("show failed".to_string()));
        }
        self.record(Call::Show {
            id,
            title: content.title.clone(),
            body: content.body.clone(),
        });
        Ok(())
    }

    fn schedule_exact(
        &self,
        id: NotificationId,
        content: &NotificationContent,
        at: NaiveDateTime,
    ) -> Result<(), DeliveryError> {
        if self.fail_exact.load(Ordering::SeqCst) {
            return Err(DeliveryError::ExactUnsupported);
        }
        self.record(Call::Schedule {
            id,
            title: content.title.clone(),
            body: content.body.clone(),
            at,
        });
        self.pending.lock().unwrap().entry(id).or_default().push(at);
        Ok(())
    }

    fn cancel(&self, id: NotificationId) -> Result<(), DeliveryError> {
        let gate = self.cancel_gate.lock().unwrap().take();
        if let Some((entered, release)) = gate {
            entered.send(()).unwrap();
            release.recv().unwrap();
        }
        let left = self.cancel_failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.cancel_failures_left.store(left - 1, Ordering::SeqCst);
            return Err(DeliveryError::Platform("cancel failed".to_string()));
        }
        self.record(Call::Cancel(id));
        self.pending.lock().unwrap().remove(&id);
        Ok(())
    }

    fn cancel_all(&self) -> Result<(), DeliveryError> {
        self.record(Call::CancelAll);
        self.pending.lock().unwrap().clear();
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, hour: u32, minute: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(hour, minute, 0).unwrap()
}

pub type MemoryStore = KvReminderStore<MemoryKeyValueStore>;

/// Coordinator over an in-memory store, a recording delivery and a fixed clock.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub delivery: Arc<RecordingDelivery>,
    pub clock: Arc<FixedClock>,
    pub scheduler: Arc<NotificationScheduler>,
    pub permission: Arc<SharedPermission>,
    pub coordinator: ReminderCoordinator<MemoryStore>,
}

impl Harness {
    pub fn at(now: NaiveDateTime) -> Self {
        let store = Arc::new(KvReminderStore::new(MemoryKeyValueStore::new()));
        let delivery = RecordingDelivery::new();
        let clock = Arc::new(FixedClock::new(now));
        let scheduler = Arc::new(NotificationScheduler::new(
            delivery.clone(),
            clock.clone(),
        ));
        let permission = Arc::new(SharedPermission::new());
        let coordinator = ReminderCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&scheduler),
            permission.clone(),
        );
        Self {
            store,
            delivery,
            clock,
            scheduler,
            permission,
            coordinator,
        }
    }
}
