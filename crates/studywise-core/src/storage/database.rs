//! SQLite-based session log.
//!
//! Provides persistent storage for:
//! - Completed work sessions, per user
//! - Study totals (daily, all-time, per subject)
//! - Key-value store for application state

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::{data_dir, SessionLog};
use crate::error::{CoreError, DatabaseError};
use crate::timer::{Phase, PomodoroSession};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: i64,
    pub user_id: String,
    #[serde(flatten)]
    pub session: PomodoroSession,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectTotal {
    pub subject: String,
    pub sessions: u64,
    pub minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_sessions: u64,
    pub total_study_minutes: u64,
    pub today_sessions: u64,
    pub today_study_minutes: u64,
    /// Largest total first.
    pub by_subject: Vec<SubjectTotal>,
}

/// SQLite database for the session log.
///
/// The connection sits behind a mutex so one `Database` can be shared
/// between the timer driver and HTTP handlers.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `~/.config/studywise/studywise.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("studywise.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (tests, throwaway sessions).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves SQLite itself consistent.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn().execute_batch(
            "CREATE TABLE IF NOT EXISTS pomodoro_sessions (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id          TEXT NOT NULL,
                phase            TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL,
                subject          TEXT NOT NULL DEFAULT '',
                completed_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_user_completed_at
                ON pomodoro_sessions(user_id, completed_at);",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn().execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl SessionLog for Database {
    fn append(&self, user_id: &str, session: &PomodoroSession) -> Result<i64, DatabaseError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO pomodoro_sessions (user_id, phase, duration_minutes, subject, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user_id,
                session.phase.as_str(),
                session.duration_minutes,
                session.subject,
                timestamp(session.completed_at),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn list(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SessionRecord>, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, phase, duration_minutes, subject, completed_at
             FROM pomodoro_sessions
             WHERE user_id = ?1
             ORDER BY completed_at DESC, id DESC
             LIMIT ?2",
        )?;
        // SQLite treats a negative LIMIT as "no limit".
        let limit = limit.map(|n| n as i64).unwrap_or(-1);
        let rows = stmt.query_map(params![user_id, limit], record_from_row)?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn stats(&self, user_id: &str) -> Result<SessionStats, DatabaseError> {
        let conn = self.conn();
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let today_start = format!("{today}T00:00:00.000000Z");

        let mut stats = SessionStats::default();

        stats.total_sessions = conn.query_row(
            "SELECT COUNT(*) FROM pomodoro_sessions WHERE user_id = ?1",
            params![user_id],
            |row| row.get::<_, u64>(0),
        )?;

        let (total_min, today_count, today_min) = conn.query_row(
            "SELECT COALESCE(SUM(duration_minutes), 0),
                    COALESCE(SUM(CASE WHEN completed_at >= ?2 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN completed_at >= ?2 THEN duration_minutes ELSE 0 END), 0)
             FROM pomodoro_sessions
             WHERE user_id = ?1 AND phase = 'work'",
            params![user_id, today_start],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?, row.get::<_, u64>(2)?)),
        )?;
        stats.total_study_minutes = total_min;
        stats.today_sessions = today_count;
        stats.today_study_minutes = today_min;

        let mut stmt = conn.prepare(
            "SELECT subject, COUNT(*), COALESCE(SUM(duration_minutes), 0)
             FROM pomodoro_sessions
             WHERE user_id = ?1 AND phase = 'work'
             GROUP BY subject
             ORDER BY 3 DESC, subject ASC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(SubjectTotal {
                subject: row.get(0)?,
                sessions: row.get(1)?,
                minutes: row.get(2)?,
            })
        })?;
        stats.by_subject = rows.collect::<Result<Vec<_>, _>>()?;

        Ok(stats)
    }
}

/// Fixed-width UTC timestamps so text ordering matches time ordering.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    let phase: String = row.get(2)?;
    let phase = phase
        .parse::<Phase>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into()))?;
    let completed_at: String = row.get(5)?;
    let completed_at = DateTime::parse_from_rfc3339(&completed_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(SessionRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        session: PomodoroSession {
            phase,
            duration_minutes: row.get(3)?,
            subject: row.get(4)?,
            completed_at,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, SubsecRound};

    fn work(subject: &str, minutes: u32, at: DateTime<Utc>) -> PomodoroSession {
        PomodoroSession {
            phase: Phase::Work,
            duration_minutes: minutes,
            subject: subject.to_string(),
            completed_at: at,
        }
    }

    #[test]
    fn append_and_list_newest_first() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.append("alice", &work("Biology", 25, now - Duration::hours(2))).unwrap();
        db.append("alice", &work("Chemistry", 25, now)).unwrap();
        db.append("alice", &work("Physics", 25, now - Duration::hours(1))).unwrap();

        let records = db.list("alice", None).unwrap();
        let subjects: Vec<_> = records.iter().map(|r| r.session.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Chemistry", "Physics", "Biology"]);
        // Stored with microsecond precision.
        assert_eq!(records[0].session.completed_at, now.trunc_subsecs(6));
    }

    #[test]
    fn list_is_scoped_per_user_and_limited() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        for i in 0..5 {
            db.append("alice", &work("Math", 25, now + Duration::minutes(i))).unwrap();
        }
        db.append("bob", &work("Art", 25, now)).unwrap();

        assert_eq!(db.list("alice", Some(2)).unwrap().len(), 2);
        assert_eq!(db.list("bob", None).unwrap().len(), 1);
        assert!(db.list("carol", None).unwrap().is_empty());
    }

    #[test]
    fn stats_sum_work_minutes_by_subject() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();
        db.append("alice", &work("Biology", 25, now)).unwrap();
        db.append("alice", &work("Biology", 25, now)).unwrap();
        db.append("alice", &work("History", 50, now - Duration::days(3))).unwrap();

        let stats = db.stats("alice").unwrap();
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.total_study_minutes, 100);
        assert_eq!(stats.today_sessions, 2);
        assert_eq!(stats.today_study_minutes, 50);
        assert_eq!(stats.by_subject.len(), 2);
        assert_eq!(stats.by_subject[0].subject, "Biology");
        assert_eq!(stats.by_subject[0].minutes, 50);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }
}
