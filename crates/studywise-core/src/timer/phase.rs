use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Every Nth completed work phase is followed by a long break.
pub const LONG_BREAK_EVERY: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Work => "work",
            Phase::ShortBreak => "short-break",
            Phase::LongBreak => "long-break",
        }
    }

    /// Human-readable label, as shown by the CLI.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Focus",
            Phase::ShortBreak => "Short Break",
            Phase::LongBreak => "Long Break",
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, Phase::Work)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(Phase::Work),
            "short-break" => Ok(Phase::ShortBreak),
            "long-break" => Ok(Phase::LongBreak),
            other => Err(format!("unknown phase: {other}")),
        }
    }
}

/// Configured length of each phase, in minutes. Only [`Durations::new`]
/// builds one, so every phase is at least a minute long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDurations")]
pub struct Durations {
    work_min: u32,
    short_break_min: u32,
    long_break_min: u32,
}

#[derive(Deserialize)]
struct RawDurations {
    work_min: u32,
    short_break_min: u32,
    long_break_min: u32,
}

impl TryFrom<RawDurations> for Durations {
    type Error = ConfigError;

    fn try_from(raw: RawDurations) -> Result<Self, Self::Error> {
        Self::new(raw.work_min, raw.short_break_min, raw.long_break_min)
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            work_min: 25,
            short_break_min: 5,
            long_break_min: 15,
        }
    }
}

impl Durations {
    /// Build a validated set of durations. Every phase must last at least
    /// one minute.
    pub fn new(
        work_min: u32,
        short_break_min: u32,
        long_break_min: u32,
    ) -> Result<Self, ConfigError> {
        for (key, value) in [
            ("schedule.focus_duration", work_min),
            ("schedule.short_break", short_break_min),
            ("schedule.long_break", long_break_min),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "duration must be at least 1 minute".to_string(),
                });
            }
        }
        Ok(Self {
            work_min,
            short_break_min,
            long_break_min,
        })
    }

    pub fn minutes(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_min,
            Phase::ShortBreak => self.short_break_min,
            Phase::LongBreak => self.long_break_min,
        }
    }

    /// Uses saturating arithmetic so absurd configured values cannot overflow.
    pub fn seconds(&self, phase: Phase) -> u32 {
        self.minutes(phase).saturating_mul(60)
    }
}
