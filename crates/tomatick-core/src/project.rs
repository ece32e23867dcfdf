use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A project that completed sessions can be attributed to.
///
/// The timer core only ever mutates the two aggregate fields; everything
/// else belongs to project management.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: Option<String>,
    /// Target number of Work sessions for this project.
    pub goal_pomodoros: u32,
    /// Work sessions completed so far. Break sessions never count here.
    #[serde(default)]
    pub completed_pomodoros: u32,
    /// Total logged seconds, breaks included when a break completes with
    /// this project active.
    #[serde(default)]
    pub total_time_secs: u64,
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// 0.0 .. 100.0 progress toward the pomodoro goal.
    pub fn goal_progress_pct(&self) -> f64 {
        if self.goal_pomodoros == 0 {
            return 0.0;
        }
        (f64::from(self.completed_pomodoros) / f64::from(self.goal_pomodoros) * 100.0).min(100.0)
    }
}
