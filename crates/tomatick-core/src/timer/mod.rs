mod clock;
mod controller;
mod engine;
mod sequencer;

pub use clock::{ClockSource, IntervalClock, ManualClock};
pub use controller::SessionController;
pub use engine::{CompletedSession, Mode, PauseCause, Phase, SessionTimer};
pub use sequencer::{next_after, Advance};
