use std::io::BufRead;

use clap::Subcommand;
use studywise_core::generative::{keyring_store, API_KEY_ENTRY, API_KEY_ENV};

use crate::common::CliResult;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store the Gemini API key in the OS keyring
    SetKey {
        /// The key; read from stdin when omitted
        key: Option<String>,
    },
    /// Remove the stored key
    ClearKey,
    /// Show where the key would come from
    Status,
}

pub fn run(action: AuthAction) -> CliResult {
    match action {
        AuthAction::SetKey { key } => {
            let key = match key {
                Some(key) => key,
                None => {
                    eprint!("Gemini API key: ");
                    let mut line = String::new();
                    std::io::stdin().lock().read_line(&mut line)?;
                    line
                }
            };
            let key = key.trim();
            if key.is_empty() {
                return Err("no key given".into());
            }
            keyring_store::set(API_KEY_ENTRY, key)?;
            println!("Gemini API key stored in the OS keyring.");
        }
        AuthAction::ClearKey => {
            keyring_store::delete(API_KEY_ENTRY)?;
            println!("Gemini API key removed from the OS keyring.");
        }
        AuthAction::Status => {
            let from_env = std::env::var(API_KEY_ENV)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false);
            let in_keyring = match keyring_store::get(API_KEY_ENTRY) {
                Ok(v) => v.is_some(),
                Err(e) => {
                    tracing::warn!(error = %e, "Keyring unavailable");
                    false
                }
            };
            let status = serde_json::json!({
                "env": from_env,
                "keyring": in_keyring,
                "configured": from_env || in_keyring,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}
