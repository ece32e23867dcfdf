mod config;
pub mod database;

pub use config::{Config, ConfigFile, ConfigSource, NotificationsConfig, SessionConfig};
pub use database::{Database, Stats};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::project::Project;
use crate::session_log::TimeLogRecord;
use crate::timer::SessionTimer;

/// Returns `~/.config/tomatick[-dev]/` based on TOMATICK_ENV.
///
/// Set TOMATICK_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TOMATICK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("tomatick-dev")
    } else {
        base_dir.join("tomatick")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Everything the timer needs back after a restart. Each field defaults
/// independently so a partial or older record still loads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub timer: Option<SessionTimer>,
    #[serde(default)]
    pub active_project: Option<String>,
}

/// Persistence collaborator for the timer core.
///
/// `load_state` is called once at startup and may return nothing; the
/// controller fills in defaults. `save_state` runs after every completed
/// session. Failures here are reported as warnings, never propagated as
/// fatal -- the countdown keeps going on in-memory state.
pub trait Store {
    fn append_record(&self, record: &TimeLogRecord) -> Result<(), StorageError>;
    fn get_project(&self, id: &str) -> Result<Option<Project>, StorageError>;
    fn update_project(&self, project: &Project) -> Result<(), StorageError>;
    fn save_state(&self, state: &PersistedState) -> Result<(), StorageError>;
    fn load_state(&self) -> Result<Option<PersistedState>, StorageError>;
}
