//! Pomodoro timer state machine.
//!
//! The engine is a pure reducer: it takes the current [`TimerState`] and a
//! [`Command`] and returns the next state together with the side effects
//! the host must carry out. It owns no clock and no thread - the host
//! (see [`super::TimerDriver`]) feeds it one `Tick` per elapsed second.
//!
//! ## Cycle
//!
//! ```text
//! Work -> ShortBreak -> Work -> ShortBreak -> Work -> ShortBreak -> Work -> LongBreak -> Work ...
//! ```
//!
//! Each phase is independently `running` or paused. A completed work phase
//! produces a [`PomodoroSession`] to persist when a subject is set; break
//! completions only move the cycle along.
//!
//! ## Usage
//!
//! ```ignore
//! let durations = Durations::default();
//! let mut state = TimerState::new(&durations);
//! let t = reduce(&state, Command::Start, &durations);
//! state = t.state;
//! // once per second:
//! let t = reduce(&state, Command::Tick { at: Utc::now() }, &durations);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phase::{Durations, Phase, LONG_BREAK_EVERY};
use super::session::PomodoroSession;
use crate::events::Event;

/// Mutable state of the timer. Only [`reduce`] produces new values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    phase: Phase,
    seconds_remaining: u32,
    is_running: bool,
    completed_work_sessions: u32,
    subject: String,
}

impl TimerState {
    /// Paused at the start of a full work phase.
    pub fn new(durations: &Durations) -> Self {
        Self {
            phase: Phase::Work,
            seconds_remaining: durations.seconds(Phase::Work),
            is_running: false,
            completed_work_sessions: 0,
            subject: String::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.completed_work_sessions
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn progress(&self, durations: &Durations) -> f64 {
        let total = durations.seconds(self.phase);
        if total == 0 {
            return 0.0;
        }
        (1.0 - (self.seconds_remaining as f64 / total as f64)).clamp(0.0, 1.0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, durations: &Durations) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            seconds_remaining: self.seconds_remaining,
            is_running: self.is_running,
            completed_work_sessions: self.completed_work_sessions,
            subject: self.subject.clone(),
            progress: self.progress(durations),
        }
    }
}

/// Inputs to the reducer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Reset,
    /// One elapsed second. `at` stamps any completion this tick causes.
    Tick { at: DateTime<Utc> },
    SetSubject(String),
}

/// Work the host must perform after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Publish to observers.
    Emit(Event),
    /// Tell the user a phase just ended. Must not block the next tick.
    Notify { completed: Phase, next: Phase },
    /// Append to the session log. Fire-and-forget.
    Persist(PomodoroSession),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: TimerState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(state: &TimerState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
        }
    }

    /// The session record produced by this transition, if any.
    pub fn persisted(&self) -> Option<&PomodoroSession> {
        self.effects.iter().find_map(|e| match e {
            Effect::Persist(session) => Some(session),
            _ => None,
        })
    }
}

/// Apply one command to `state`.
pub fn reduce(state: &TimerState, command: Command, durations: &Durations) -> Transition {
    match command {
        Command::Start => {
            if state.is_running {
                return Transition::unchanged(state);
            }
            let mut next = state.clone();
            next.is_running = true;
            let event = Event::TimerStarted {
                phase: next.phase,
                seconds_remaining: next.seconds_remaining,
            };
            Transition {
                state: next,
                effects: vec![Effect::Emit(event)],
            }
        }
        Command::Pause => {
            if !state.is_running {
                return Transition::unchanged(state);
            }
            let mut next = state.clone();
            next.is_running = false;
            let event = Event::TimerPaused {
                phase: next.phase,
                seconds_remaining: next.seconds_remaining,
            };
            Transition {
                state: next,
                effects: vec![Effect::Emit(event)],
            }
        }
        Command::Reset => {
            let next = TimerState::new(durations);
            let event = Event::TimerReset {
                seconds_remaining: next.seconds_remaining,
            };
            Transition {
                state: next,
                effects: vec![Effect::Emit(event)],
            }
        }
        Command::SetSubject(subject) => {
            // Editing the label mid-phase is rejected.
            if state.is_running || state.subject == subject {
                return Transition::unchanged(state);
            }
            let mut next = state.clone();
            next.subject = subject.clone();
            Transition {
                state: next,
                effects: vec![Effect::Emit(Event::SubjectChanged { subject })],
            }
        }
        Command::Tick { at } => {
            if !state.is_running {
                return Transition::unchanged(state);
            }
            let mut next = state.clone();
            next.seconds_remaining = next.seconds_remaining.saturating_sub(1);
            let mut effects = Vec::new();
            if next.seconds_remaining == 0 {
                complete_phase(&mut next, at, durations, &mut effects);
            }
            Transition {
                state: next,
                effects,
            }
        }
    }
}

fn complete_phase(
    state: &mut TimerState,
    at: DateTime<Utc>,
    durations: &Durations,
    effects: &mut Vec<Effect>,
) {
    let completed = state.phase;
    state.is_running = false;

    let next_phase = match completed {
        Phase::Work => {
            state.completed_work_sessions = state.completed_work_sessions.saturating_add(1);
            if !state.subject.trim().is_empty() {
                effects.push(Effect::Persist(PomodoroSession {
                    phase: Phase::Work,
                    duration_minutes: durations.minutes(Phase::Work),
                    subject: state.subject.clone(),
                    completed_at: at,
                }));
            }
            if state.completed_work_sessions % LONG_BREAK_EVERY == 0 {
                Phase::LongBreak
            } else {
                Phase::ShortBreak
            }
        }
        Phase::ShortBreak | Phase::LongBreak => Phase::Work,
    };

    state.phase = next_phase;
    state.seconds_remaining = durations.seconds(next_phase);

    effects.insert(
        0,
        Effect::Notify {
            completed,
            next: next_phase,
        },
    );
    effects.push(Effect::Emit(Event::PhaseCompleted {
        completed,
        next: next_phase,
        completed_work_sessions: state.completed_work_sessions,
        at,
    }));
}
