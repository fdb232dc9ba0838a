//! Async host for the timer reducer.
//!
//! A single tokio task owns the [`TimerState`]. Commands from the
//! [`TimerHandle`] and one-second ticks are funnelled through the same
//! `select!` loop, so the reducer never sees two inputs at once.
//! Notifications and session persistence run on the blocking pool and
//! report back through the event channel; they never delay the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::engine::{reduce, Command, Effect, TimerState, Transition};
use super::notify::Notifier;
use super::phase::Durations;
use crate::error::CoreError;
use crate::events::Event;
use crate::storage::SessionLog;

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 128;

enum Request {
    Command(Command),
    Snapshot(oneshot::Sender<TimerState>),
    Shutdown,
}

/// Configures and spawns the timer task.
pub struct TimerDriver {
    durations: Durations,
    user_id: String,
    log: Arc<dyn SessionLog>,
    notifier: Arc<dyn Notifier>,
    tick_every: Duration,
}

impl TimerDriver {
    pub fn new(
        durations: Durations,
        user_id: impl Into<String>,
        log: Arc<dyn SessionLog>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            durations,
            user_id: user_id.into(),
            log,
            notifier,
            tick_every: Duration::from_secs(1),
        }
    }

    /// Override the wall-clock length of one tick.
    pub fn with_tick_interval(mut self, every: Duration) -> Self {
        self.tick_every = every;
        self
    }

    /// Spawn the timer loop on the current tokio runtime.
    pub fn spawn(self) -> TimerHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let task = tokio::spawn(self.run(cmd_rx, events.clone()));
        TimerHandle {
            commands: cmd_tx,
            events,
            task,
        }
    }

    async fn run(
        self,
        mut commands: mpsc::Receiver<Request>,
        events: broadcast::Sender<Event>,
    ) -> TimerState {
        let mut state = TimerState::new(&self.durations);
        let mut ticker = tokio::time::interval(self.tick_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick(), if state.is_running() => {
                    self.apply(&mut state, Command::Tick { at: Utc::now() }, &events);
                }
                request = commands.recv() => match request {
                    Some(Request::Command(command)) => {
                        if matches!(command, Command::SetSubject(_)) && state.is_running() {
                            warn!("Ignoring subject change while the timer is running");
                        }
                        let was_running = state.is_running();
                        self.apply(&mut state, command, &events);
                        if !was_running && state.is_running() {
                            // First tick lands one full interval after start.
                            ticker.reset();
                        }
                    }
                    Some(Request::Snapshot(reply)) => {
                        let _ = reply.send(state.clone());
                    }
                    Some(Request::Shutdown) | None => break,
                },
            }
        }

        debug!("Timer driver stopped");
        state
    }

    fn apply(&self, state: &mut TimerState, command: Command, events: &broadcast::Sender<Event>) {
        let Transition {
            state: next,
            effects,
        } = reduce(state, command, &self.durations);
        *state = next;
        for effect in effects {
            self.dispatch(effect, events);
        }
    }

    fn dispatch(&self, effect: Effect, events: &broadcast::Sender<Event>) {
        match effect {
            Effect::Emit(event) => {
                // No subscribers is fine.
                let _ = events.send(event);
            }
            Effect::Notify { completed, next } => {
                let notifier = Arc::clone(&self.notifier);
                let events = events.clone();
                tokio::task::spawn_blocking(move || {
                    if let Err(e) = notifier.notify(completed, next) {
                        warn!(error = %e, "Completion notification failed");
                        let _ = events.send(Event::NotificationFailed {
                            message: e.to_string(),
                        });
                    }
                });
            }
            Effect::Persist(session) => {
                let log = Arc::clone(&self.log);
                let user_id = self.user_id.clone();
                let events = events.clone();
                tokio::task::spawn_blocking(move || match log.append(&user_id, &session) {
                    Ok(id) => {
                        info!(id, subject = %session.subject, "Work session recorded");
                        let _ = events.send(Event::SessionPersisted {
                            id,
                            subject: session.subject,
                            completed_at: session.completed_at,
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Error adding work session record");
                        let _ = events.send(Event::SessionPersistFailed {
                            message: e.to_string(),
                        });
                    }
                });
            }
        }
    }
}

/// Control surface for a running [`TimerDriver`].
pub struct TimerHandle {
    commands: mpsc::Sender<Request>,
    events: broadcast::Sender<Event>,
    task: JoinHandle<TimerState>,
}

impl TimerHandle {
    pub async fn start(&self) -> Result<(), CoreError> {
        self.send(Command::Start).await
    }

    pub async fn pause(&self) -> Result<(), CoreError> {
        self.send(Command::Pause).await
    }

    pub async fn reset(&self) -> Result<(), CoreError> {
        self.send(Command::Reset).await
    }

    /// Ignored by the engine while the timer is running.
    pub async fn set_subject(&self, subject: impl Into<String>) -> Result<(), CoreError> {
        self.send(Command::SetSubject(subject.into())).await
    }

    pub async fn snapshot(&self) -> Result<TimerState, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Request::Snapshot(tx))
            .await
            .map_err(|_| CoreError::DriverStopped)?;
        rx.await.map_err(|_| CoreError::DriverStopped)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Stop the loop and return the final state.
    pub async fn shutdown(self) -> Result<TimerState, CoreError> {
        let _ = self.commands.send(Request::Shutdown).await;
        self.task
            .await
            .map_err(|e| CoreError::Custom(format!("timer task failed: {e}")))
    }

    async fn send(&self, command: Command) -> Result<(), CoreError> {
        self.commands
            .send(Request::Command(command))
            .await
            .map_err(|_| CoreError::DriverStopped)
    }
}
