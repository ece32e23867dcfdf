//! Time log: the persisted trace of completed sessions.
//!
//! One record per completed (non-aborted) session, append-only. A manual
//! reset never reaches this module. Project aggregates roll up here too:
//! every completed session with an active project adds its duration to the
//! project total, but only Work completions count as pomodoros.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageError;
use crate::storage::Store;
use crate::timer::{CompletedSession, Mode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeLogRecord {
    pub id: String,
    /// Absent means uncategorized -- a valid state, not an error.
    pub project_id: Option<String>,
    pub mode: Mode,
    pub duration_secs: u64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// YYYY-MM-DD of `ended_at`, the analytics grouping key.
    pub date: String,
}

impl TimeLogRecord {
    fn from_completed(completed: &CompletedSession, project_id: Option<String>) -> Self {
        let started_at = completed.started_at.unwrap_or_else(|| {
            completed.ended_at - Duration::seconds(completed.duration_secs as i64)
        });
        Self {
            id: Uuid::new_v4().to_string(),
            project_id,
            mode: completed.mode,
            duration_secs: completed.duration_secs,
            started_at,
            ended_at: completed.ended_at,
            date: completed.ended_at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Persist the just-completed session and roll it into project aggregates.
///
/// A dangling `active_project_id` (project deleted since selection) demotes
/// the record to uncategorized and skips the aggregate update. Storage
/// failures are returned to the caller, which reports them as non-fatal
/// warnings -- they never stop the timer.
pub fn log_completed(
    store: &dyn Store,
    completed: &CompletedSession,
    active_project_id: Option<&str>,
) -> Result<TimeLogRecord, StorageError> {
    let project = match active_project_id {
        Some(id) => store.get_project(id)?,
        None => None,
    };

    let record =
        TimeLogRecord::from_completed(completed, project.as_ref().map(|p| p.id.clone()));
    store.append_record(&record)?;

    if let Some(mut project) = project {
        project.total_time_secs += completed.duration_secs;
        if completed.mode.is_work() {
            project.completed_pomodoros += 1;
        }
        store.update_project(&project)?;
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Project;
    use crate::storage::Database;

    fn completed(mode: Mode, duration_secs: u64) -> CompletedSession {
        let ended_at = Utc::now();
        CompletedSession {
            mode,
            duration_secs,
            session_count: 1,
            started_at: Some(ended_at - Duration::seconds(duration_secs as i64)),
            ended_at,
        }
    }

    fn project(id: &str) -> Project {
        Project {
            id: id.into(),
            name: "Thesis".into(),
            description: String::new(),
            color: None,
            goal_pomodoros: 10,
            completed_pomodoros: 2,
            total_time_secs: 3000,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn work_completion_updates_project_aggregates() {
        let db = Database::open_memory().unwrap();
        db.create_project(&project("p1")).unwrap();

        let record = log_completed(&db, &completed(Mode::Work, 1500), Some("p1")).unwrap();
        assert_eq!(record.duration_secs, 1500);
        assert_eq!(record.project_id.as_deref(), Some("p1"));

        let updated = db.get_project("p1").unwrap().unwrap();
        assert_eq!(updated.completed_pomodoros, 3);
        assert_eq!(updated.total_time_secs, 4500);
    }

    #[test]
    fn break_completion_adds_time_but_no_pomodoro() {
        let db = Database::open_memory().unwrap();
        db.create_project(&project("p1")).unwrap();

        log_completed(&db, &completed(Mode::ShortBreak, 300), Some("p1")).unwrap();

        let updated = db.get_project("p1").unwrap().unwrap();
        assert_eq!(updated.completed_pomodoros, 2);
        assert_eq!(updated.total_time_secs, 3300);
    }

    #[test]
    fn missing_project_logs_uncategorized() {
        let db = Database::open_memory().unwrap();

        let record = log_completed(&db, &completed(Mode::Work, 1500), Some("gone")).unwrap();
        assert_eq!(record.project_id, None);
        assert_eq!(db.stats_all().unwrap().total_sessions, 1);
    }

    #[test]
    fn no_active_project_is_fine() {
        let db = Database::open_memory().unwrap();

        let record = log_completed(&db, &completed(Mode::Work, 1500), None).unwrap();
        assert_eq!(record.project_id, None);
        assert_eq!(record.mode, Mode::Work);
    }
}
