mod driver;
mod engine;
mod notify;
mod phase;
mod session;

pub use driver::{TimerDriver, TimerHandle};
pub use engine::{reduce, Command, Effect, TimerState, Transition};
pub use notify::{LogNotifier, Notifier, NotifyError, SilentNotifier};
pub use phase::{Durations, Phase, LONG_BREAK_EVERY};
pub use session::PomodoroSession;
