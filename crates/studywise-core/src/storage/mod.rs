mod config;
pub mod database;
pub mod remote;

pub use config::{Config, GeminiConfig, NotificationsConfig, ScheduleConfig, ServerConfig};
pub use database::{Database, SessionRecord, SessionStats, SubjectTotal};
pub use remote::HttpSessionLog;

use std::path::PathBuf;

use crate::error::DatabaseError;
use crate::timer::PomodoroSession;

/// Append-only, per-user log of completed work sessions.
///
/// Implementations are synchronous; async callers go through
/// `spawn_blocking`.
pub trait SessionLog: Send + Sync {
    /// Store a session for `user_id`, returning its id.
    fn append(&self, user_id: &str, session: &PomodoroSession) -> Result<i64, DatabaseError>;

    /// Newest first. `None` returns every record.
    fn list(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SessionRecord>, DatabaseError>;

    /// Totals for the progress view.
    fn stats(&self, user_id: &str) -> Result<SessionStats, DatabaseError>;
}

/// Returns `~/.config/studywise[-dev]/` based on STUDYWISE_ENV.
///
/// Set STUDYWISE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, crate::error::ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYWISE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("studywise-dev")
    } else {
        base_dir.join("studywise")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| crate::error::ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
