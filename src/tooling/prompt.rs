//! Terminal prompt for conflict resolution.

use crate::cache::EditCacheEntry;
use crate::conflict::{DecisionPrompt, Notice, PromptKind, UserDecision};
use crate::error::ApiError;
use async_trait::async_trait;
use chrono::Local;
use dialoguer::{Confirm, Select};
use owo_colors::OwoColorize;

/// Asks on the controlling terminal. Escape or `q` counts as dismissal.
pub struct DialoguerPrompt;

#[async_trait]
impl DecisionPrompt for DialoguerPrompt {
    async fn decide(
        &self,
        kind: PromptKind,
        entry: &EditCacheEntry,
    ) -> Result<UserDecision, ApiError> {
        let entry = entry.clone();
        tokio::task::spawn_blocking(move || ask(kind, &entry))
            .await
            .map_err(|e| ApiError::PromptError(format!("Prompt task failed: {}", e)))?
    }

    fn notify(&self, notice: Notice) {
        match notice {
            Notice::RestoreFailed { path, message } => eprintln!(
                "{} could not restore {}: {}",
                "error:".red().bold(),
                path,
                message
            ),
            Notice::Restored { path } => {
                eprintln!("{} restored cached edit for {}", "ok:".green().bold(), path)
            }
            Notice::Discarded { path } => {
                eprintln!("{} discarded cached edit for {}", "ok:".yellow().bold(), path)
            }
        }
    }
}

fn ask(kind: PromptKind, entry: &EditCacheEntry) -> Result<UserDecision, ApiError> {
    match kind {
        PromptKind::RestoreOrDiscard => {
            let staged = entry.timestamp.with_timezone(&Local);
            let choice = Select::new()
                .with_prompt(format!(
                    "{} has an unsaved edit from {} ({} bytes)",
                    entry.path,
                    staged.format("%Y-%m-%d %H:%M:%S"),
                    entry.content.len()
                ))
                .items(&["Restore it to the server", "Discard it"])
                .default(0)
                .interact_opt()
                .map_err(prompt_error)?;
            Ok(match choice {
                Some(0) => UserDecision::Restore,
                Some(_) => UserDecision::Discard,
                None => UserDecision::Dismiss,
            })
        }
        PromptKind::ConfirmDiscard => {
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Permanently discard the cached edit for {}?",
                    entry.path
                ))
                .default(false)
                .interact_opt()
                .map_err(prompt_error)?;
            Ok(match confirmed {
                Some(true) => UserDecision::ConfirmDiscard,
                Some(false) => UserDecision::Cancel,
                None => UserDecision::Dismiss,
            })
        }
    }
}

fn prompt_error(err: dialoguer::Error) -> ApiError {
    ApiError::PromptError(format!("Failed to get user input: {}", err))
}
