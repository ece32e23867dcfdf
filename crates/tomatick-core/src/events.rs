use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Mode, PauseCause, Phase};

/// Every state change in the system produces an Event.
/// The UI layer renders messages and sounds from these; the core never
/// formats user-facing text itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: Mode,
        duration_secs: u64,
        session_count: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        cause: PauseCause,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: Mode,
        at: DateTime<Utc>,
    },
    ModeSwitched {
        mode: Mode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// A countdown reached zero. `session_count` is the session number the
    /// user is now on, after the mode advanced.
    SessionCompleted {
        just_finished_mode: Mode,
        session_count: u32,
        target_session_count: u32,
        at: DateTime<Utc>,
    },
    /// A completed session was written to the time log.
    SessionLogged {
        record_id: String,
        project_id: Option<String>,
        mode: Mode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// A persistence operation failed. Non-fatal: the countdown keeps its
    /// in-memory state and stays resumable.
    StorageWarning {
        message: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        mode: Mode,
        phase: Phase,
        time_left_secs: u64,
        total_secs: u64,
        session_count: u32,
        progress: f64,
        at: DateTime<Utc>,
    },
}

/// Notification collaborator. The CLI prints events as JSON lines; a GUI
/// would forward them to its event bus; tests collect them.
pub trait Notifier {
    fn notify(&self, event: &Event);
}

/// Notifier that drops everything.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: &Event) {}
}
