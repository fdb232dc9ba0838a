//! Summaries and quizzes from the Gemini generative language API.

mod gemini;

pub use gemini::GeminiClient;

use serde::{Deserialize, Serialize};

use crate::error::GenerativeError;
use crate::quiz::QuizQuestion;

/// Environment variable checked before the keyring.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Keyring entry holding the API key.
pub const API_KEY_ENTRY: &str = "gemini_api_key";

/// Placeholder returned when the service gives no usable summary.
pub const SUMMARY_FALLBACK: &str = "Could not generate summary.";

/// Result of analyzing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub summary: String,
    pub quiz: Vec<QuizQuestion>,
}

/// Find the API key: `GEMINI_API_KEY` first, then the OS keyring.
///
/// Keyring failures are logged and treated as "not set".
pub fn resolve_api_key() -> Result<String, GenerativeError> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        let key = key.trim();
        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }

    match keyring_store::get(API_KEY_ENTRY) {
        Ok(Some(key)) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        Ok(_) => Err(GenerativeError::MissingCredential),
        Err(e) => {
            tracing::warn!(error = %e, "Keyring lookup failed");
            Err(GenerativeError::MissingCredential)
        }
    }
}

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    const SERVICE: &str = "studywise";

    pub fn get(key: &str) -> Result<Option<String>, keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)
    }

    pub fn delete(key: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
