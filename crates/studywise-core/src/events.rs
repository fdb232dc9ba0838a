use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every state change of the timer produces an Event.
/// The CLI renders them; the driver also reports the outcome of
/// fire-and-forget side effects through the same stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        seconds_remaining: u32,
    },
    TimerPaused {
        phase: Phase,
        seconds_remaining: u32,
    },
    TimerReset {
        seconds_remaining: u32,
    },
    SubjectChanged {
        subject: String,
    },
    PhaseCompleted {
        completed: Phase,
        next: Phase,
        completed_work_sessions: u32,
        at: DateTime<Utc>,
    },
    SessionPersisted {
        id: i64,
        subject: String,
        completed_at: DateTime<Utc>,
    },
    SessionPersistFailed {
        message: String,
    },
    NotificationFailed {
        message: String,
    },
    StateSnapshot {
        phase: Phase,
        seconds_remaining: u32,
        is_running: bool,
        completed_work_sessions: u32,
        subject: String,
        progress: f64,
    },
}
