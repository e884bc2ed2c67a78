//! Periodic wake-up driving the due scan.
//!
//! # Responsibility
//! - Run one tick immediately on start, then once per period.
//! - Stop promptly and idempotently, including from `Drop`.
//!
//! # Invariants
//! - At most one worker thread per clock; ticks never overlap.
//! - Overrunning ticks skip missed periods instead of bursting to catch up.

use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Reminder granularity is one minute, so the scan runs once per minute.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60);

const WORKER_THREAD_NAME: &str = "medremind-clock";

/// Lifecycle state of a `ReminderClock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Idle,
    Running,
}

#[derive(Debug)]
pub enum ClockError {
    ZeroPeriod,
    Spawn(std::io::Error),
}

impl Display for ClockError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroPeriod => write!(f, "clock period must be greater than zero"),
            Self::Spawn(err) => write!(f, "failed to spawn clock worker: {err}"),
        }
    }
}

impl Error for ClockError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            Self::ZeroPeriod => None,
        }
    }
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Fixed-period background ticker.
pub struct ReminderClock {
    period: Duration,
    worker: Mutex<Option<Worker>>,
}

impl ReminderClock {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            worker: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> ClockState {
        if self.lock_worker().is_some() {
            ClockState::Running
        } else {
            ClockState::Idle
        }
    }

    /// Starts ticking: `tick` runs now, then every period until `stop`.
    ///
    /// Calling `start` on a running clock is a no-op.
    ///
    /// # Errors
    /// - `ZeroPeriod` when the clock was built with a zero period.
    /// - `Spawn` when the worker thread cannot be created.
    pub fn start<F>(&self, mut tick: F) -> Result<(), ClockError>
    where
        F: FnMut() + Send + 'static,
    {
        if self.period.is_zero() {
            return Err(ClockError::ZeroPeriod);
        }

        let mut worker = self.lock_worker();
        if worker.is_some() {
            debug!("event=clock_start module=service status=already_running");
            return Ok(());
        }

        let period = self.period;
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let mut next_tick = Instant::now();
                loop {
                    if catch_unwind(AssertUnwindSafe(&mut tick)).is_err() {
                        error!("event=clock_tick module=service status=panicked");
                    }

                    next_tick += period;
                    let now = Instant::now();
                    while next_tick <= now {
                        next_tick += period;
                    }

                    match stop_rx.recv_timeout(next_tick - now) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(ClockError::Spawn)?;

        *worker = Some(Worker { stop_tx, handle });
        info!(
            "event=clock_start module=service status=ok period_ms={}",
            period.as_millis()
        );
        Ok(())
    }

    /// Stops ticking and waits for an in-flight tick to finish.
    ///
    /// Idempotent. When called from inside a tick the worker is detached
    /// instead of joined.
    pub fn stop(&self) {
        let Some(worker) = self.lock_worker().take() else {
            return;
        };

        // A send error only means the worker already exited.
        let _ = worker.stop_tx.send(());
        if worker.handle.thread().id() == thread::current().id() {
            debug!("event=clock_stop module=service status=detached");
            return;
        }
        if worker.handle.join().is_err() {
            error!("event=clock_stop module=service status=error error_code=worker_panicked");
            return;
        }
        info!("event=clock_stop module=service status=ok");
    }

    fn lock_worker(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ReminderClock {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_INTERVAL)
    }
}

impl Drop for ReminderClock {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::{ClockError, ClockState, ReminderClock};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn start_ticks_immediately_and_stop_returns_to_idle() {
        let clock = ReminderClock::new(Duration::from_secs(3600));
        let (tx, rx) = mpsc::channel();
        clock.start(move || tx.send(()).unwrap()).unwrap();
        assert_eq!(clock.state(), ClockState::Running);

        rx.recv_timeout(Duration::from_secs(5))
            .expect("first tick should run right after start");

        clock.stop();
        assert_eq!(clock.state(), ClockState::Idle);
        clock.stop();
        assert_eq!(clock.state(), ClockState::Idle);
    }

    #[test]
    fn ticks_repeat_on_period() {
        let clock = ReminderClock::new(Duration::from_millis(10));
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let (tx, rx) = mpsc::channel();
        clock
            .start(move || {
                if counter.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                    let _ = tx.send(());
                }
            })
            .unwrap();

        rx.recv_timeout(Duration::from_secs(5))
            .expect("clock should tick at least three times");
        clock.stop();
        assert!(ticks.load(Ordering::SeqCst) >= 3);
    }

    #[test]
    fn second_start_while_running_is_noop() {
        let clock = ReminderClock::new(Duration::from_secs(3600));
        let ticks = Arc::new(AtomicUsize::new(0));
        let first = Arc::clone(&ticks);
        let (tx, rx) = mpsc::channel();
        clock
            .start(move || {
                first.fetch_add(1, Ordering::SeqCst);
                let _ = tx.send(());
            })
            .unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let second = Arc::clone(&ticks);
        clock
            .start(move || {
                second.fetch_add(100, Ordering::SeqCst);
            })
            .unwrap();
        clock.stop();
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_period_is_rejected() {
        let clock = ReminderClock::new(Duration::ZERO);
        let err = clock.start(|| {}).unwrap_err();
        assert!(matches!(err, ClockError::ZeroPeriod));
        assert_eq!(clock.state(), ClockState::Idle);
    }

    #[test]
    fn panicking_tick_keeps_clock_running() {
        let clock = ReminderClock::new(Duration::from_millis(10));
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let (tx, rx) = mpsc::channel();
        clock
            .start(move || {
                let seen = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if seen == 1 {
                    panic!("first tick fails");
                }
                let _ = tx.send(());
            })
            .unwrap();

        rx.recv_timeout(Duration::from_secs(5))
            .expect("clock should survive a panicking tick");
        clock.stop();
    }
}
