//! SQLite-based storage for time logs, projects, and app state.
//!
//! Provides persistent storage for:
//! - Completed session records (append-only time log)
//! - Projects and their aggregate totals
//! - Key-value store for serialized timer state
//!
//! The database lives at `~/.config/tomatick/tomatick.db`.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::{PersistedState, Store};
use crate::error::StorageError;
use crate::project::Project;
use crate::session_log::TimeLogRecord;
use crate::timer::Mode;

const STATE_KEY: &str = "session_state";

/// Format mode for database storage; matches the serde kebab-case names.
fn format_mode(mode: Mode) -> &'static str {
    match mode {
        Mode::Work => "work",
        Mode::ShortBreak => "short-break",
        Mode::LongBreak => "long-break",
    }
}

/// Parse mode from a database string.
fn parse_mode(mode_str: &str) -> Mode {
    match mode_str {
        "short-break" => Mode::ShortBreak,
        "long-break" => Mode::LongBreak,
        _ => Mode::Work,
    }
}

/// Parse datetime from RFC3339 string with fallback to current time.
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_project(row: &rusqlite::Row) -> Result<Project, rusqlite::Error> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        color: row.get(3)?,
        goal_pomodoros: row.get(4)?,
        completed_pomodoros: row.get(5)?,
        total_time_secs: row.get(6)?,
        created_at: parse_datetime_fallback(&row.get::<_, String>(7)?),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_work_secs: u64,
    pub total_break_secs: u64,
    pub completed_pomodoros: u64,
    pub today_sessions: u64,
    pub today_work_secs: u64,
    /// Share of sessions that were Work sessions, 0-100.
    pub focus_score_pct: u64,
}

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/tomatick/tomatick.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let dir = super::data_dir()?;
        Self::open_at(dir.join("tomatick.db"))
    }

    /// Open the database at an explicit path.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS time_logs (
                    id            TEXT PRIMARY KEY,
                    project_id    TEXT,
                    mode          TEXT NOT NULL,
                    duration_secs INTEGER NOT NULL,
                    started_at    TEXT NOT NULL,
                    ended_at      TEXT NOT NULL,
                    date          TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS projects (
                    id                  TEXT PRIMARY KEY,
                    name                TEXT NOT NULL,
                    description         TEXT NOT NULL DEFAULT '',
                    color               TEXT,
                    goal_pomodoros      INTEGER NOT NULL,
                    completed_pomodoros INTEGER NOT NULL DEFAULT 0,
                    total_time_secs     INTEGER NOT NULL DEFAULT 0,
                    created_at          TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                -- Indexes for the common analytics query patterns
                CREATE INDEX IF NOT EXISTS idx_time_logs_date ON time_logs(date);
                CREATE INDEX IF NOT EXISTS idx_time_logs_mode ON time_logs(mode);",
            )
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    // ── Time logs ────────────────────────────────────────────────────

    /// Append a completed-session record. Records are never updated or
    /// deleted through this interface.
    pub fn insert_record(&self, record: &TimeLogRecord) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO time_logs (id, project_id, mode, duration_secs, started_at, ended_at, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                record.project_id,
                format_mode(record.mode),
                record.duration_secs,
                record.started_at.to_rfc3339(),
                record.ended_at.to_rfc3339(),
                record.date,
            ],
        )?;
        Ok(())
    }

    pub fn stats_today(&self) -> Result<Stats, rusqlite::Error> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let mut stmt = self.conn.prepare(
            "SELECT mode, COUNT(*), COALESCE(SUM(duration_secs), 0)
             FROM time_logs
             WHERE date = ?1
             GROUP BY mode",
        )?;
        let rows = stmt.query_map(params![today], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;

        let mut stats = Stats::default();
        for row in rows {
            let (mode, count, secs) = row?;
            stats.total_sessions += count;
            match parse_mode(&mode) {
                Mode::Work => {
                    stats.completed_pomodoros += count;
                    stats.today_sessions += count;
                    stats.total_work_secs += secs;
                    stats.today_work_secs += secs;
                }
                Mode::ShortBreak | Mode::LongBreak => {
                    stats.total_break_secs += secs;
                }
            }
        }
        if stats.total_sessions > 0 {
            stats.focus_score_pct = stats.completed_pomodoros * 100 / stats.total_sessions;
        }
        Ok(stats)
    }

    pub fn stats_all(&self) -> Result<Stats, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT mode, COUNT(*), COALESCE(SUM(duration_secs), 0)
             FROM time_logs
             GROUP BY mode",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;

        let mut stats = Stats::default();
        for row in rows {
            let (mode, count, secs) = row?;
            stats.total_sessions += count;
            match parse_mode(&mode) {
                Mode::Work => {
                    stats.completed_pomodoros += count;
                    stats.total_work_secs += secs;
                }
                Mode::ShortBreak | Mode::LongBreak => {
                    stats.total_break_secs += secs;
                }
            }
        }
        if stats.total_sessions > 0 {
            stats.focus_score_pct = stats.completed_pomodoros * 100 / stats.total_sessions;
        }

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let row = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_secs), 0)
             FROM time_logs
             WHERE mode = 'work' AND date = ?1",
            params![today],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;
        stats.today_sessions = row.0;
        stats.today_work_secs = row.1;

        Ok(stats)
    }

    // ── Projects ─────────────────────────────────────────────────────

    pub fn create_project(&self, project: &Project) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO projects (id, name, description, color, goal_pomodoros,
                                   completed_pomodoros, total_time_secs, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                project.id,
                project.name,
                project.description,
                project.color,
                project.goal_pomodoros,
                project.completed_pomodoros,
                project.total_time_secs,
                project.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn find_project(&self, id: &str) -> Result<Option<Project>, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT id, name, description, color, goal_pomodoros,
                        completed_pomodoros, total_time_secs, created_at
                 FROM projects WHERE id = ?1",
                params![id],
                row_to_project,
            )
            .optional()
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, color, goal_pomodoros,
                    completed_pomodoros, total_time_secs, created_at
             FROM projects ORDER BY created_at",
        )?;
        let rows = stmt.query_map([], row_to_project)?;
        rows.collect()
    }

    pub fn upsert_project(&self, project: &Project) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO projects (id, name, description, color, goal_pomodoros,
                                              completed_pomodoros, total_time_secs, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                project.id,
                project.name,
                project.description,
                project.color,
                project.goal_pomodoros,
                project.completed_pomodoros,
                project.total_time_secs,
                project.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Delete a project. Existing log records keep their project id and
    /// read back as uncategorized.
    pub fn delete_project(&self, id: &str) -> Result<(), rusqlite::Error> {
        self.conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ── Key-value store ──────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl Store for Database {
    fn append_record(&self, record: &TimeLogRecord) -> Result<(), StorageError> {
        Ok(self.insert_record(record)?)
    }

    fn get_project(&self, id: &str) -> Result<Option<Project>, StorageError> {
        Ok(self.find_project(id)?)
    }

    fn update_project(&self, project: &Project) -> Result<(), StorageError> {
        Ok(self.upsert_project(project)?)
    }

    fn save_state(&self, state: &PersistedState) -> Result<(), StorageError> {
        let json = serde_json::to_string(state)?;
        Ok(self.kv_set(STATE_KEY, &json)?)
    }

    fn load_state(&self) -> Result<Option<PersistedState>, StorageError> {
        match self.kv_get(STATE_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SessionConfig;
    use crate::timer::SessionTimer;

    fn record(mode: Mode, duration_secs: u64, date: &str) -> TimeLogRecord {
        let now = Utc::now();
        TimeLogRecord {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: None,
            mode,
            duration_secs,
            started_at: now,
            ended_at: now,
            date: date.to_string(),
        }
    }

    #[test]
    fn record_and_query_stats() {
        let db = Database::open_memory().unwrap();
        let today = Utc::now().format("%Y-%m-%d").to_string();
        db.insert_record(&record(Mode::Work, 1500, &today)).unwrap();
        db.insert_record(&record(Mode::ShortBreak, 300, &today))
            .unwrap();

        let stats = db.stats_all().unwrap();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.completed_pomodoros, 1);
        assert_eq!(stats.total_work_secs, 1500);
        assert_eq!(stats.total_break_secs, 300);
        assert_eq!(stats.focus_score_pct, 50);
        assert_eq!(stats.today_sessions, 1); // work sessions today
        assert_eq!(stats.today_work_secs, 1500);
    }

    #[test]
    fn stats_today_ignores_other_days() {
        let db = Database::open_memory().unwrap();
        let today = Utc::now().format("%Y-%m-%d").to_string();
        db.insert_record(&record(Mode::Work, 1500, &today)).unwrap();
        db.insert_record(&record(Mode::Work, 3000, "2001-01-01"))
            .unwrap();

        let stats = db.stats_today().unwrap();
        assert_eq!(stats.today_sessions, 1);
        assert_eq!(stats.today_work_secs, 1500);
    }

    #[test]
    fn project_roundtrip() {
        let db = Database::open_memory().unwrap();
        let project = Project {
            id: "p1".into(),
            name: "Thesis".into(),
            description: "write it".into(),
            color: Some("#667eea".into()),
            goal_pomodoros: 10,
            completed_pomodoros: 0,
            total_time_secs: 0,
            created_at: Utc::now(),
        };
        db.create_project(&project).unwrap();

        let loaded = db.find_project("p1").unwrap().unwrap();
        assert_eq!(loaded.name, "Thesis");
        assert_eq!(loaded.color.as_deref(), Some("#667eea"));

        db.delete_project("p1").unwrap();
        assert!(db.find_project("p1").unwrap().is_none());
        assert_eq!(db.list_projects().unwrap().len(), 0);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "value").unwrap();
        assert_eq!(db.kv_get("test").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn state_roundtrip_via_store_trait() {
        let db = Database::open_memory().unwrap();
        assert!(db.load_state().unwrap().is_none());

        let state = PersistedState {
            timer: Some(SessionTimer::new(&SessionConfig::default())),
            active_project: Some("p1".into()),
        };
        db.save_state(&state).unwrap();

        let loaded = db.load_state().unwrap().unwrap();
        assert_eq!(loaded.active_project.as_deref(), Some("p1"));
        assert_eq!(loaded.timer.unwrap().session_count(), 1);
    }

    #[test]
    fn reopen_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tomatick.db");
        {
            let db = Database::open_at(&path).unwrap();
            let today = Utc::now().format("%Y-%m-%d").to_string();
            db.insert_record(&record(Mode::Work, 1500, &today)).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.stats_all().unwrap().total_sessions, 1);
    }
}
