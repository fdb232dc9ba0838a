//! Helpers shared by several commands.

use std::sync::Arc;

use clap::Args;
use studywise_core::{Database, HttpSessionLog, SessionLog};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

const DEFAULT_USER_KEY: &str = "default_user_id";

/// Where sessions are read from and written to.
#[derive(Args, Debug, Clone, Default)]
pub struct LogTarget {
    /// User id (defaults to this machine's generated id)
    #[arg(long)]
    pub user: Option<String>,

    /// Use a StudyWise server instead of the local database, e.g. http://localhost:3001
    #[arg(long)]
    pub remote: Option<String>,
}

impl LogTarget {
    /// Resolve the user id and open the session log.
    pub fn open(&self) -> CliResult<(String, Arc<dyn SessionLog>)> {
        let db = Database::open()?;
        let user = match &self.user {
            Some(user) => user.clone(),
            None => default_user_id(&db)?,
        };
        let log: Arc<dyn SessionLog> = match &self.remote {
            Some(url) => Arc::new(HttpSessionLog::new(url)?),
            None => Arc::new(db),
        };
        Ok((user, log))
    }
}

/// Stable per-machine user id, generated on first use.
pub fn default_user_id(db: &Database) -> CliResult<String> {
    if let Some(id) = db.kv_get(DEFAULT_USER_KEY)? {
        return Ok(id);
    }
    let id = uuid::Uuid::new_v4().to_string();
    db.kv_set(DEFAULT_USER_KEY, &id)?;
    Ok(id)
}

pub fn runtime() -> CliResult<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

/// `mm:ss`
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(0), "00:00");
    }

    #[test]
    fn default_user_id_is_stable() {
        let db = Database::open_memory().unwrap();
        let first = default_user_id(&db).unwrap();
        let second = default_user_id(&db).unwrap();
        assert_eq!(first, second);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
    }
}
