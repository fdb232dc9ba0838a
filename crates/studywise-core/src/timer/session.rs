use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phase::Phase;

/// A completed work phase, as handed to the session log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSession {
    pub phase: Phase,
    pub duration_minutes: u32,
    pub subject: String,
    pub completed_at: DateTime<Utc>,
}
