//! Session timer implementation.
//!
//! The timer is a tick-driven state machine. It does not use internal
//! threads -- a clock source delivers one tick per second while armed, and
//! the caller forwards each tick via `tick()`.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> ... -> Idle (completion or reset)
//! ```
//!
//! Invalid transitions (pause while idle, switch mode while running) are
//! silent no-ops: they arise from ordinary UI races like double-clicks and
//! must never corrupt the countdown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::storage::SessionConfig;

use super::sequencer::Advance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Work,
    ShortBreak,
    LongBreak,
}

impl Mode {
    /// Configured duration for this mode, in seconds.
    pub fn duration_secs(self, config: &SessionConfig) -> u64 {
        let minutes = match self {
            Mode::Work => config.work_minutes,
            Mode::ShortBreak => config.short_break_minutes,
            Mode::LongBreak => config.long_break_minutes,
        };
        u64::from(minutes).saturating_mul(60)
    }

    pub fn is_work(self) -> bool {
        matches!(self, Mode::Work)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Paused,
}

/// Why the timer is paused. Tracked separately from the paused phase so a
/// visibility return only auto-resumes a visibility-caused pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseCause {
    Manual,
    Hidden,
}

/// Snapshot of a session the moment its countdown reached zero, captured
/// before the mode advances. The time log record is built from this, so the
/// logged mode is always the just-finished one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedSession {
    pub mode: Mode,
    pub duration_secs: u64,
    /// Session count before the sequencer bumps it.
    pub session_count: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: DateTime<Utc>,
}

/// Core session timer.
///
/// Serializable so the CLI can persist it between invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTimer {
    mode: Mode,
    time_left_secs: u64,
    total_secs: u64,
    session_count: u32,
    phase: Phase,
    #[serde(default)]
    pause_cause: Option<PauseCause>,
    /// Wall-clock stamp taken at `start()`, consumed by the logger.
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
}

impl SessionTimer {
    /// Create an idle timer in Work mode with the configured full duration.
    pub fn new(config: &SessionConfig) -> Self {
        let total_secs = Mode::Work.duration_secs(config);
        Self {
            mode: Mode::Work,
            time_left_secs: total_secs,
            total_secs,
            session_count: 1,
            phase: Phase::Idle,
            pause_cause: None,
            started_at: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    pub fn pause_cause(&self) -> Option<PauseCause> {
        self.pause_cause
    }

    pub fn time_left_secs(&self) -> u64 {
        self.time_left_secs
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn session_count(&self) -> u32 {
        self.session_count
    }

    /// 0.0 .. 1.0 progress within the current countdown.
    pub fn progress(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        1.0 - (self.time_left_secs as f64 / self.total_secs as f64)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            mode: self.mode,
            phase: self.phase,
            time_left_secs: self.time_left_secs,
            total_secs: self.total_secs,
            session_count: self.session_count,
            progress: self.progress(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        match self.phase {
            // Re-entry from pause continues the countdown; elapsed time is
            // neither reset nor double-counted.
            Phase::Paused => self.resume(),
            Phase::Idle => {
                self.phase = Phase::Running;
                self.started_at = Some(Utc::now());
                Some(Event::TimerStarted {
                    mode: self.mode,
                    duration_secs: self.total_secs,
                    session_count: self.session_count,
                    at: Utc::now(),
                })
            }
            Phase::Running => None, // Already running.
        }
    }

    /// Manual pause. While paused by a visibility signal, converts the
    /// cause to manual so a later visibility return will not auto-resume.
    pub fn pause(&mut self) -> Option<Event> {
        self.pause_with_cause(PauseCause::Manual)
    }

    /// Visibility-hidden signal: pause the countdown if it is running.
    pub fn suspend(&mut self) -> Option<Event> {
        if self.phase != Phase::Running {
            return None;
        }
        self.pause_with_cause(PauseCause::Hidden)
    }

    /// Visibility-returned signal: resume only a visibility-caused pause.
    pub fn restore(&mut self) -> Option<Event> {
        if self.phase == Phase::Paused && self.pause_cause == Some(PauseCause::Hidden) {
            self.resume()
        } else {
            None
        }
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.phase != Phase::Paused {
            return None;
        }
        self.phase = Phase::Running;
        self.pause_cause = None;
        Some(Event::TimerResumed {
            remaining_secs: self.time_left_secs,
            at: Utc::now(),
        })
    }

    /// Back to idle at the full duration of the current mode. A reset
    /// session is aborted, not completed -- nothing is logged.
    pub fn reset(&mut self) -> Option<Event> {
        self.phase = Phase::Idle;
        self.pause_cause = None;
        self.started_at = None;
        self.time_left_secs = self.total_secs;
        Some(Event::TimerReset {
            mode: self.mode,
            at: Utc::now(),
        })
    }

    /// Switch to `mode` and refill the countdown from `config`.
    ///
    /// No-op while running: the mode cannot change mid-countdown without
    /// corrupting elapsed-time accounting. The duration is looked up on
    /// every call, so a settings change takes effect at the next switch
    /// rather than retroactively.
    pub fn switch_mode(&mut self, mode: Mode, config: &SessionConfig) -> Option<Event> {
        if self.phase == Phase::Running {
            return None;
        }
        self.mode = mode;
        self.total_secs = mode.duration_secs(config);
        self.time_left_secs = self.total_secs;
        self.phase = Phase::Idle;
        self.pause_cause = None;
        self.started_at = None;
        Some(Event::ModeSwitched {
            mode,
            duration_secs: self.total_secs,
            at: Utc::now(),
        })
    }

    /// Deliver one clock tick. Honored only while running; decrements one
    /// second and, on reaching zero, leaves the running phase and returns
    /// the completed-session snapshot exactly once.
    pub fn tick(&mut self) -> Option<CompletedSession> {
        if self.phase != Phase::Running {
            return None;
        }
        self.time_left_secs = self.time_left_secs.saturating_sub(1);
        if self.time_left_secs > 0 {
            return None;
        }
        self.phase = Phase::Idle;
        self.pause_cause = None;
        Some(CompletedSession {
            mode: self.mode,
            duration_secs: self.total_secs - self.time_left_secs,
            session_count: self.session_count,
            started_at: self.started_at.take(),
            ended_at: Utc::now(),
        })
    }

    /// Apply the sequencer's decision: new count, then the mode switch
    /// (always legal here -- completion just left the running phase).
    pub fn apply_advance(&mut self, advance: Advance, config: &SessionConfig) -> Option<Event> {
        self.session_count = advance.session_count;
        self.switch_mode(advance.next_mode, config)
    }

    fn pause_with_cause(&mut self, cause: PauseCause) -> Option<Event> {
        match self.phase {
            Phase::Running => {
                self.phase = Phase::Paused;
                self.pause_cause = Some(cause);
                Some(Event::TimerPaused {
                    remaining_secs: self.time_left_secs,
                    cause,
                    at: Utc::now(),
                })
            }
            Phase::Paused if cause == PauseCause::Manual => {
                // Pin a hidden-caused pause to manual; no new event.
                self.pause_cause = Some(PauseCause::Manual);
                None
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::sequencer;
    use proptest::prelude::*;

    fn config() -> SessionConfig {
        SessionConfig::default()
    }

    fn short_config() -> SessionConfig {
        SessionConfig {
            work_minutes: 1,
            short_break_minutes: 1,
            long_break_minutes: 2,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn start_pause_resume() {
        let mut timer = SessionTimer::new(&config());
        assert_eq!(timer.phase(), Phase::Idle);

        assert!(timer.start().is_some());
        assert_eq!(timer.phase(), Phase::Running);

        assert!(timer.pause().is_some());
        assert_eq!(timer.phase(), Phase::Paused);

        assert!(timer.resume().is_some());
        assert_eq!(timer.phase(), Phase::Running);
    }

    #[test]
    fn new_timer_holds_full_work_duration() {
        let timer = SessionTimer::new(&config());
        assert_eq!(timer.mode(), Mode::Work);
        assert_eq!(timer.total_secs(), 25 * 60);
        assert_eq!(timer.time_left_secs(), 25 * 60);
        assert_eq!(timer.session_count(), 1);
    }

    #[test]
    fn ticks_run_to_zero_and_complete_once() {
        let cfg = short_config();
        let mut timer = SessionTimer::new(&cfg);
        timer.start();

        for _ in 0..59 {
            assert!(timer.tick().is_none());
        }
        let done = timer.tick().expect("60th tick completes");
        assert_eq!(done.mode, Mode::Work);
        assert_eq!(done.duration_secs, 60);
        assert_eq!(done.session_count, 1);
        assert!(done.started_at.is_some());

        // Re-entrant ticks after completion must not fire again.
        assert!(timer.tick().is_none());
        assert_eq!(timer.phase(), Phase::Idle);
    }

    #[test]
    fn pause_resume_preserves_remaining_time() {
        let mut timer = SessionTimer::new(&short_config());
        timer.start();
        timer.tick();
        timer.tick();
        let before = timer.time_left_secs();

        timer.pause();
        assert!(timer.tick().is_none()); // ticks ignored while paused
        timer.resume();

        assert_eq!(timer.time_left_secs(), before);
    }

    #[test]
    fn start_while_paused_resumes_without_resetting() {
        let mut timer = SessionTimer::new(&short_config());
        timer.start();
        timer.tick();
        timer.pause();
        let before = timer.time_left_secs();

        let event = timer.start().expect("start from paused resumes");
        assert!(matches!(event, Event::TimerResumed { .. }));
        assert_eq!(timer.time_left_secs(), before);
    }

    #[test]
    fn reset_restores_full_duration() {
        let mut timer = SessionTimer::new(&short_config());
        timer.start();
        timer.tick();
        timer.tick();
        timer.reset();

        assert_eq!(timer.phase(), Phase::Idle);
        assert_eq!(timer.time_left_secs(), timer.total_secs());
        assert!(timer.start().is_some()); // still startable
    }

    #[test]
    fn switch_mode_is_noop_while_running() {
        let cfg = config();
        let mut timer = SessionTimer::new(&cfg);
        timer.start();
        let left = timer.time_left_secs();

        assert!(timer.switch_mode(Mode::ShortBreak, &cfg).is_none());
        assert_eq!(timer.mode(), Mode::Work);
        assert_eq!(timer.time_left_secs(), left);
    }

    #[test]
    fn switch_mode_rereads_config() {
        let mut cfg = config();
        let mut timer = SessionTimer::new(&cfg);

        cfg.short_break_minutes = 7;
        timer.switch_mode(Mode::ShortBreak, &cfg);
        assert_eq!(timer.total_secs(), 7 * 60);
        assert_eq!(timer.time_left_secs(), 7 * 60);
    }

    #[test]
    fn switch_mode_clears_pause() {
        let cfg = config();
        let mut timer = SessionTimer::new(&cfg);
        timer.start();
        timer.pause();

        timer.switch_mode(Mode::LongBreak, &cfg);
        assert_eq!(timer.phase(), Phase::Idle);
        assert_eq!(timer.pause_cause(), None);
    }

    #[test]
    fn pause_while_idle_is_noop() {
        let mut timer = SessionTimer::new(&config());
        assert!(timer.pause().is_none());
        assert_eq!(timer.phase(), Phase::Idle);
    }

    #[test]
    fn resume_while_not_paused_is_noop() {
        let mut timer = SessionTimer::new(&config());
        assert!(timer.resume().is_none());
        timer.start();
        assert!(timer.resume().is_none());
        assert_eq!(timer.phase(), Phase::Running);
    }

    #[test]
    fn suspend_and_restore_auto_resume() {
        let mut timer = SessionTimer::new(&short_config());
        timer.start();
        timer.tick();
        let before = timer.time_left_secs();

        assert!(timer.suspend().is_some());
        assert_eq!(timer.pause_cause(), Some(PauseCause::Hidden));

        assert!(timer.restore().is_some());
        assert_eq!(timer.phase(), Phase::Running);
        assert_eq!(timer.time_left_secs(), before);
    }

    #[test]
    fn manual_pause_while_hidden_is_not_auto_resumed() {
        let mut timer = SessionTimer::new(&short_config());
        timer.start();
        timer.suspend();

        // User pauses manually while the surface is hidden.
        timer.pause();
        assert_eq!(timer.pause_cause(), Some(PauseCause::Manual));

        assert!(timer.restore().is_none());
        assert_eq!(timer.phase(), Phase::Paused);
    }

    #[test]
    fn restore_without_suspend_is_noop() {
        let mut timer = SessionTimer::new(&config());
        timer.start();
        timer.pause();
        assert!(timer.restore().is_none());
        assert_eq!(timer.phase(), Phase::Paused);
    }

    #[test]
    fn apply_advance_bumps_count_and_switches() {
        let cfg = config();
        let mut timer = SessionTimer::new(&cfg);
        timer.start();
        for _ in 0..timer.total_secs() {
            timer.tick();
        }

        let advance = sequencer::next_after(Mode::Work, 1, cfg.long_break_interval);
        timer.apply_advance(advance, &cfg);
        assert_eq!(timer.session_count(), 2);
        assert_eq!(timer.mode(), Mode::ShortBreak);
        assert_eq!(timer.time_left_secs(), 5 * 60);
    }

    proptest! {
        // For any configuration, start() then exactly total_secs ticks
        // drives the countdown to zero and fires completion exactly once.
        #[test]
        fn countdown_completes_exactly_once(minutes in 1u32..=8) {
            let cfg = SessionConfig { work_minutes: minutes, ..SessionConfig::default() };
            let mut timer = SessionTimer::new(&cfg);
            timer.start();

            let total = timer.total_secs();
            let mut completions = 0u32;
            for i in 0..total {
                if let Some(done) = timer.tick() {
                    completions += 1;
                    prop_assert_eq!(i, total - 1);
                    prop_assert_eq!(done.duration_secs, total);
                }
            }
            prop_assert_eq!(completions, 1);
            prop_assert!(timer.tick().is_none());
        }
    }
}
