//! Session controller: the engine plus its collaborators.
//!
//! Owns the one clock source, forwards every state-change event to the
//! notifier, and runs the completion sequence in contract order: disarm,
//! log the finished session (pre-advance state), advance the mode, persist,
//! notify. Collaborators are injected at construction; there are no
//! ambient globals.
//!
//! Everything here is synchronous with respect to ticks: the driver loop
//! delivers ticks and commands from the same thread, so no operation can
//! interleave with a tick.

use chrono::Utc;

use crate::events::{Event, Notifier};
use crate::session_log;
use crate::storage::{ConfigSource, PersistedState, Store};

use super::clock::ClockSource;
use super::engine::{Mode, SessionTimer};
use super::sequencer;

pub struct SessionController {
    engine: SessionTimer,
    config: Box<dyn ConfigSource>,
    store: Box<dyn Store>,
    notifier: Box<dyn Notifier>,
    clock: Box<dyn ClockSource>,
    active_project: Option<String>,
}

impl SessionController {
    /// Build a controller, restoring persisted state if any. A failed or
    /// partial load falls back to defaults field by field and is reported
    /// as a warning, never an error.
    pub fn new(
        config: Box<dyn ConfigSource>,
        store: Box<dyn Store>,
        notifier: Box<dyn Notifier>,
        clock: Box<dyn ClockSource>,
    ) -> Self {
        let session_config = config.current();
        let (engine, active_project) = match store.load_state() {
            Ok(Some(state)) => (
                state
                    .timer
                    .unwrap_or_else(|| SessionTimer::new(&session_config)),
                state.active_project,
            ),
            Ok(None) => (SessionTimer::new(&session_config), None),
            Err(e) => {
                notifier.notify(&Event::StorageWarning {
                    message: format!("failed to load saved state: {e}"),
                    at: Utc::now(),
                });
                (SessionTimer::new(&session_config), None)
            }
        };

        Self {
            engine,
            config,
            store,
            notifier,
            clock,
            active_project,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &SessionTimer {
        &self.engine
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn active_project(&self) -> Option<&str> {
        self.active_project.as_deref()
    }

    pub fn snapshot(&self) -> Event {
        self.engine.snapshot()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        let event = self.engine.start()?;
        self.rearm();
        self.emit(&event);
        Some(event)
    }

    pub fn pause(&mut self) -> Option<Event> {
        let event = self.engine.pause()?;
        self.clock.disarm();
        self.emit(&event);
        Some(event)
    }

    pub fn resume(&mut self) -> Option<Event> {
        let event = self.engine.resume()?;
        self.rearm();
        self.emit(&event);
        Some(event)
    }

    /// Visibility-hidden signal.
    pub fn suspend(&mut self) -> Option<Event> {
        let event = self.engine.suspend()?;
        self.clock.disarm();
        self.emit(&event);
        Some(event)
    }

    /// Visibility-returned signal.
    pub fn restore(&mut self) -> Option<Event> {
        let event = self.engine.restore()?;
        self.rearm();
        self.emit(&event);
        Some(event)
    }

    pub fn reset(&mut self) -> Option<Event> {
        // Reachable from any state; the disarm covers them all.
        self.clock.disarm();
        let event = self.engine.reset()?;
        self.emit(&event);
        Some(event)
    }

    pub fn switch_mode(&mut self, mode: Mode) -> Option<Event> {
        let config = self.config.current();
        let event = self.engine.switch_mode(mode, &config)?;
        // Only reachable when not running, but disarm anyway.
        self.clock.disarm();
        self.emit(&event);
        Some(event)
    }

    pub fn select_project(&mut self, project_id: Option<String>) {
        self.active_project = project_id;
        self.save();
    }

    /// Deliver one clock tick. Returns the completion event when the
    /// countdown reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        let done = self.engine.tick()?;
        self.clock.disarm();

        // Log first, from the pre-advance snapshot: the record's mode is
        // the just-finished one.
        match session_log::log_completed(self.store.as_ref(), &done, self.active_project.as_deref())
        {
            Ok(record) => self.emit(&Event::SessionLogged {
                record_id: record.id,
                project_id: record.project_id,
                mode: record.mode,
                duration_secs: record.duration_secs,
                at: record.ended_at,
            }),
            Err(e) => self.emit(&Event::StorageWarning {
                message: format!("failed to log session: {e}"),
                at: Utc::now(),
            }),
        }

        // Then advance, re-reading the configuration.
        let config = self.config.current();
        let advance = sequencer::next_after(done.mode, done.session_count, config.long_break_interval);
        if let Some(event) = self.engine.apply_advance(advance, &config) {
            self.emit(&event);
        }

        self.save();

        let event = Event::SessionCompleted {
            just_finished_mode: done.mode,
            session_count: self.engine.session_count(),
            target_session_count: config.target_session_count,
            at: done.ended_at,
        };
        self.emit(&event);
        Some(event)
    }

    /// Persist the current state. Failure is a warning; the in-memory
    /// countdown is unaffected.
    pub fn save(&self) {
        let state = PersistedState {
            timer: Some(self.engine.clone()),
            active_project: self.active_project.clone(),
        };
        if let Err(e) = self.store.save_state(&state) {
            self.emit(&Event::StorageWarning {
                message: format!("failed to save state: {e}"),
                at: Utc::now(),
            });
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn rearm(&mut self) {
        // Never two armed sources: drop the old handle before arming.
        self.clock.disarm();
        self.clock.arm();
    }

    fn emit(&self, event: &Event) {
        self.notifier.notify(event);
    }
}
