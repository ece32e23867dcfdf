//! Mode sequencing: which mode follows a completed session.
//!
//! Pure arithmetic over the just-finished mode and the session count; the
//! engine applies the result via `apply_advance`.

use super::engine::Mode;

/// The sequencer's decision for the session that comes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    pub next_mode: Mode,
    pub session_count: u32,
}

/// Compute the mode following `just_finished` and the updated count.
///
/// Counting is 1-based: `session_count` is the number of the session the
/// user is on, so the number of Work sessions completed so far equals the
/// pre-increment count. A long break is due every `long_break_interval`
/// completed Work sessions; `long_break_interval == 1` therefore means a
/// long break after every Work session. Breaks always return to Work and
/// leave the count alone.
pub fn next_after(just_finished: Mode, session_count: u32, long_break_interval: u32) -> Advance {
    match just_finished {
        Mode::Work => {
            let completed_works = session_count;
            let interval = long_break_interval.max(1);
            let next_mode = if completed_works % interval == 0 {
                Mode::LongBreak
            } else {
                Mode::ShortBreak
            };
            Advance {
                next_mode,
                session_count: session_count + 1,
            }
        }
        Mode::ShortBreak | Mode::LongBreak => Advance {
            next_mode: Mode::Work,
            session_count,
        },
    }
}
