//! # Tomatick Core Library
//!
//! Core business logic for the Tomatick Pomodoro-style session timer. All
//! operations are available through the standalone CLI binary; any GUI
//! would be a thin layer over this same library.
//!
//! ## Architecture
//!
//! - **Session Timer**: a tick-driven state machine; a clock source fires
//!   once per second while armed and the caller forwards each tick
//! - **Mode Sequencer**: pure next-mode arithmetic (work, short break,
//!   long break cadence)
//! - **Session Log**: append-only records of completed sessions plus
//!   project aggregate rollup
//! - **Storage**: SQLite-based log/project/state storage and TOML-based
//!   configuration
//!
//! ## Key Components
//!
//! - [`SessionTimer`]: core countdown state machine
//! - [`SessionController`]: the timer wired to its collaborators
//! - [`Database`]: time log, projects, and persisted state
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod project;
pub mod session_log;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::{Event, Notifier, NullNotifier};
pub use project::Project;
pub use session_log::TimeLogRecord;
pub use storage::{Config, Database, PersistedState, SessionConfig, Stats, Store};
pub use timer::{
    ClockSource, IntervalClock, ManualClock, Mode, PauseCause, Phase, SessionController,
    SessionTimer,
};
