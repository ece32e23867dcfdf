//! Clock sources: the one-per-second tick primitive.
//!
//! Contract: a clock fires once per second while armed and is silent
//! otherwise. At most one underlying task may exist per clock; arming again
//! replaces the previous task, disarming is idempotent. The controller
//! always disarms before re-arming so two tickers can never run at once.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};

pub trait ClockSource {
    fn arm(&mut self);
    fn disarm(&mut self);
    fn is_armed(&self) -> bool;
}

/// Clock with no machinery behind it: just the armed flag. Used by tests
/// and by one-shot CLI commands, where ticks only happen under `watch`.
#[derive(Debug, Default)]
pub struct ManualClock {
    armed: bool,
}

impl ClockSource for ManualClock {
    fn arm(&mut self) {
        self.armed = true;
    }

    fn disarm(&mut self) {
        self.armed = false;
    }

    fn is_armed(&self) -> bool {
        self.armed
    }
}

/// Tokio-interval clock. While armed, a spawned task sends a unit tick
/// over the channel once per period; the join handle is the single armed
/// handle and is aborted before any re-arm.
pub struct IntervalClock {
    tx: mpsc::Sender<()>,
    handle: Option<JoinHandle<()>>,
    period: Duration,
}

impl IntervalClock {
    /// One-second clock plus the receiving end the driver loops on.
    pub fn new() -> (Self, mpsc::Receiver<()>) {
        Self::with_period(Duration::from_secs(1))
    }

    pub fn with_period(period: Duration) -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(8);
        (
            Self {
                tx,
                handle: None,
                period,
            },
            rx,
        )
    }
}

impl ClockSource for IntervalClock {
    fn arm(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        let tx = self.tx.clone();
        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            let mut interval = time::interval(period);
            // The first interval tick fires immediately; the clock contract
            // starts counting one period from arming.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        }));
    }

    fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for IntervalClock {
    fn drop(&mut self) {
        self.disarm();
    }
}
