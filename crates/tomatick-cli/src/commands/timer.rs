use clap::{Subcommand, ValueEnum};
use tomatick_core::storage::{ConfigFile, Database};
use tomatick_core::{
    ClockSource, Config, Event, IntervalClock, ManualClock, Mode, Notifier, SessionController,
};

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Work,
    ShortBreak,
    LongBreak,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Work => Mode::Work,
            ModeArg::ShortBreak => Mode::ShortBreak,
            ModeArg::LongBreak => Mode::LongBreak,
        }
    }
}

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the countdown (resumes if paused)
    Start,
    /// Pause the countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Reset the current mode to its full duration (does not log)
    Reset,
    /// Switch mode; ignored while the countdown is running
    Mode {
        /// Target mode
        mode: ModeArg,
    },
    /// Surface went hidden: pause if running
    Suspend,
    /// Surface visible again: resume a visibility-caused pause
    Restore,
    /// Print current timer state as JSON
    Status,
    /// Drive the countdown at one tick per second until stopped
    Watch,
}

/// Prints every event as a JSON line; the core never formats text itself.
struct JsonNotifier;

impl Notifier for JsonNotifier {
    fn notify(&self, event: &Event) {
        if let Ok(json) = serde_json::to_string_pretty(event) {
            println!("{json}");
        }
    }
}

fn load_controller(clock: Box<dyn ClockSource>) -> Result<SessionController, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    Ok(SessionController::new(
        Box::new(ConfigFile),
        Box::new(db),
        Box::new(JsonNotifier),
        clock,
    ))
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    if let TimerAction::Watch = action {
        return watch();
    }

    let mut controller = load_controller(Box::new(ManualClock::default()))?;

    let applied = match action {
        TimerAction::Start => controller.start(),
        TimerAction::Pause => controller.pause(),
        TimerAction::Resume => controller.resume(),
        TimerAction::Reset => controller.reset(),
        TimerAction::Mode { mode } => controller.switch_mode(mode.into()),
        TimerAction::Suspend => controller.suspend(),
        TimerAction::Restore => controller.restore(),
        TimerAction::Status => None,
        TimerAction::Watch => unreachable!(),
    };

    // No event means nothing changed; show the state instead.
    if applied.is_none() {
        println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
    }

    controller.save();
    Ok(())
}

/// The live countdown loop: one tick per second on a single-threaded
/// runtime. Completion either auto-starts the next session (per config)
/// or ends the loop; ctrl-c pauses and saves.
fn watch() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let (clock, mut ticks) = IntervalClock::new();
        let mut controller = load_controller(Box::new(clock))?;

        if !controller.is_running() {
            controller.start();
        }

        loop {
            tokio::select! {
                tick = ticks.recv() => {
                    if tick.is_none() {
                        break;
                    }
                    if controller.tick().is_some() {
                        if Config::load_or_default().auto_advance {
                            controller.start();
                        } else {
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    controller.pause();
                    break;
                }
            }
        }

        controller.save();
        Ok(())
    })
}
