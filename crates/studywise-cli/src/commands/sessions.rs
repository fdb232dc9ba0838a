use clap::Subcommand;

use crate::common::{runtime, CliResult, LogTarget};

#[derive(Subcommand)]
pub enum SessionsAction {
    /// Recorded work sessions, newest first
    List {
        /// Show at most this many
        #[arg(long)]
        limit: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        target: LogTarget,
    },
    /// Study totals
    Stats {
        #[command(flatten)]
        target: LogTarget,
    },
}

pub fn run(action: SessionsAction) -> CliResult {
    match action {
        SessionsAction::List {
            limit,
            json,
            target,
        } => {
            let remote = target.remote.is_some();
            let (user, log) = target.open()?;
            // The remote log blocks on the tokio handle, so it needs a runtime thread.
            let records = if remote {
                runtime()?.block_on(async move {
                    tokio::task::spawn_blocking(move || log.list(&user, limit)).await
                })??
            } else {
                log.list(&user, limit)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }
            if records.is_empty() {
                println!("no sessions recorded yet");
            }
            for r in &records {
                println!(
                    "{:>5}  {}  {:>3} min  {}",
                    r.id,
                    r.session
                        .completed_at
                        .with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M"),
                    r.session.duration_minutes,
                    r.session.subject
                );
            }
        }
        SessionsAction::Stats { target } => {
            let remote = target.remote.is_some();
            let (user, log) = target.open()?;
            let stats = if remote {
                runtime()?.block_on(async move {
                    tokio::task::spawn_blocking(move || log.stats(&user)).await
                })??
            } else {
                log.stats(&user)?
            };
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
