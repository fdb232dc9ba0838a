use std::io::{IsTerminal, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use studywise_core::timer::{LogNotifier, Notifier, NotifyError, SilentNotifier};
use studywise_core::{Config, Durations, Event, Phase, TimerDriver, TimerHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use crate::common::{format_clock, runtime, CliResult, LogTarget};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run an interactive Pomodoro timer in this terminal
    Run {
        /// What you are studying; required for sessions to be recorded
        #[arg(long)]
        subject: Option<String>,

        /// Start the first focus phase immediately
        #[arg(long)]
        start: bool,

        #[command(flatten)]
        target: LogTarget,
    },
}

/// Prints the transition, optionally ringing the terminal bell.
struct TerminalNotifier {
    bell: bool,
}

impl Notifier for TerminalNotifier {
    fn notify(&self, completed: Phase, next: Phase) -> Result<(), NotifyError> {
        let mut err = std::io::stderr().lock();
        if self.bell {
            write!(err, "\x07")?;
        }
        writeln!(err, "\n{} finished. Next: {}", completed.label(), next.label())?;
        err.flush()?;
        Ok(())
    }
}

pub fn run(action: TimerAction) -> CliResult {
    match action {
        TimerAction::Run {
            subject,
            start,
            target,
        } => {
            let config = Config::load_or_default();
            let durations = config.durations()?;
            let (user, log) = target.open()?;

            let notifier = pick_notifier(
                config.notifications.enabled,
                config.notifications.bell,
                std::io::stderr().is_terminal(),
            );

            let rt = runtime()?;
            rt.block_on(async move {
                let handle = TimerDriver::new(durations, user, log, notifier).spawn();
                if let Some(subject) = subject {
                    handle.set_subject(subject).await?;
                }
                if start {
                    handle.start().await?;
                }
                interact(handle, durations).await
            })
        }
    }
}

/// Terminal output when someone is watching stderr, the tracing log when
/// it is piped or redirected.
fn pick_notifier(enabled: bool, bell: bool, on_terminal: bool) -> Arc<dyn Notifier> {
    match (enabled, on_terminal) {
        (false, _) => Arc::new(SilentNotifier),
        (true, true) => Arc::new(TerminalNotifier { bell }),
        (true, false) => Arc::new(LogNotifier),
    }
}

const HELP: &str = "commands: s=start  p=pause  r=reset  subject <text>  status  q=quit";

async fn interact(handle: TimerHandle, durations: Durations) -> CliResult {
    let mut events = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut redraw = tokio::time::interval(Duration::from_secs(1));

    eprintln!("{HELP}");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_input(&handle, &durations, line.trim()).await? {
                    break;
                }
            }
            event = events.recv() => match event {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(n)) => tracing::debug!(skipped = n, "Event stream lagged"),
                Err(RecvError::Closed) => break,
            },
            _ = redraw.tick() => {
                let state = handle.snapshot().await?;
                if state.is_running() {
                    eprint!(
                        "\r{:<11} {}  #{}  {}   ",
                        state.phase().label(),
                        format_clock(state.seconds_remaining()),
                        state.completed_work_sessions(),
                        state.subject()
                    );
                }
            }
        }
    }

    let state = handle.shutdown().await?;
    eprintln!(
        "\nStopped after {} completed focus session(s).",
        state.completed_work_sessions()
    );
    Ok(())
}

/// Returns `false` when the user asked to quit.
async fn handle_input(handle: &TimerHandle, durations: &Durations, input: &str) -> CliResult<bool> {
    match input {
        "" => {}
        "s" | "start" => handle.start().await?,
        "p" | "pause" => handle.pause().await?,
        "r" | "reset" => handle.reset().await?,
        "status" => {
            let state = handle.snapshot().await?;
            println!("{}", serde_json::to_string_pretty(&state.snapshot(durations))?);
        }
        "q" | "quit" | "exit" => return Ok(false),
        other => match other
            .strip_prefix("subject")
            .filter(|rest| rest.is_empty() || rest.starts_with(' '))
        {
            Some(rest) => {
                if handle.snapshot().await?.is_running() {
                    eprintln!("pause the timer before changing the subject");
                } else {
                    handle.set_subject(rest.trim()).await?;
                }
            }
            None => eprintln!("{HELP}"),
        },
    }
    Ok(true)
}

fn print_event(event: &Event) {
    match event {
        Event::TimerStarted {
            phase,
            seconds_remaining,
        } => eprintln!("\n> {} started ({})", phase.label(), format_clock(*seconds_remaining)),
        Event::TimerPaused {
            phase,
            seconds_remaining,
        } => eprintln!("\n|| {} paused at {}", phase.label(), format_clock(*seconds_remaining)),
        Event::TimerReset { .. } => eprintln!("\ntimer reset"),
        Event::SubjectChanged { subject } => eprintln!("subject: {subject}"),
        Event::PhaseCompleted {
            completed_work_sessions,
            ..
        } => eprintln!("completed focus sessions: {completed_work_sessions}"),
        Event::SessionPersisted { id, subject, .. } => {
            eprintln!("recorded session #{id} ({subject})")
        }
        Event::SessionPersistFailed { message } => {
            eprintln!("could not record session: {message}")
        }
        Event::NotificationFailed { message } => eprintln!("notification failed: {message}"),
        Event::StateSnapshot { .. } => {}
    }
}
