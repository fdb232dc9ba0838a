//! # StudyWise Core Library
//!
//! Business logic for the StudyWise study assistant, shared by the HTTP
//! server and the CLI.
//!
//! ## Architecture
//!
//! - **Timer**: a pure Pomodoro reducer plus an async driver that ticks it
//!   once per second and carries out its effects
//! - **Storage**: SQLite session log, a remote session log client, and
//!   TOML configuration
//! - **Extract**: plain text out of uploaded `.txt`, `.pdf` and `.docx` files
//! - **Generative**: summaries and multiple-choice quizzes from Gemini
//!
//! ## Key Components
//!
//! - [`reduce`]: timer state transitions
//! - [`TimerDriver`]: host task owning the timer state
//! - [`Database`]: session persistence and statistics
//! - [`Config`]: application configuration management
//! - [`GeminiClient`]: generative content client

pub mod error;
pub mod events;
pub mod extract;
pub mod generative;
pub mod quiz;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, ExtractError, GenerativeError};
pub use events::Event;
pub use extract::{extract, extract_file, DocumentKind};
pub use generative::{Analysis, GeminiClient};
pub use quiz::{grade, QuizQuestion, QuizScore};
pub use storage::{Config, Database, HttpSessionLog, SessionLog, SessionRecord, SessionStats};
pub use timer::{
    reduce, Command, Durations, Phase, PomodoroSession, TimerDriver, TimerHandle, TimerState,
};
