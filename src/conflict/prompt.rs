//! Decision prompt port
//!
//! The resolver asks questions through [`DecisionPrompt`] so the terminal
//! front end and tests can answer them differently.

use super::machine::{PromptKind, UserDecision};
use crate::cache::EditCacheEntry;
use crate::error::ApiError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Outcome the user must be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    RestoreFailed { path: String, message: String },
    Restored { path: String },
    Discarded { path: String },
}

/// Source of user decisions during conflict resolution.
#[async_trait]
pub trait DecisionPrompt: Send + Sync {
    /// Ask `kind` about the cached `entry`.
    ///
    /// Closing the prompt without an answer is `UserDecision::Dismiss`, not an
    /// error. Errors are reserved for a broken prompt channel.
    async fn decide(
        &self,
        kind: PromptKind,
        entry: &EditCacheEntry,
    ) -> Result<UserDecision, ApiError>;

    /// Surface an outcome to the user.
    fn notify(&self, notice: Notice);
}

/// Prompt answering from a fixed script. Records every question and notice.
#[derive(Default)]
pub struct ScriptedPrompt {
    decisions: Mutex<VecDeque<UserDecision>>,
    asked: Mutex<Vec<PromptKind>>,
    notices: Mutex<Vec<Notice>>,
}

impl ScriptedPrompt {
    pub fn new(decisions: impl IntoIterator<Item = UserDecision>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<PromptKind> {
        self.asked.lock().clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    /// Decisions not consumed yet.
    pub fn remaining(&self) -> usize {
        self.decisions.lock().len()
    }
}

#[async_trait]
impl DecisionPrompt for ScriptedPrompt {
    async fn decide(
        &self,
        kind: PromptKind,
        entry: &EditCacheEntry,
    ) -> Result<UserDecision, ApiError> {
        self.asked.lock().push(kind);
        self.decisions.lock().pop_front().ok_or_else(|| {
            ApiError::PromptError(format!("No scripted answer left for {}", entry.path))
        })
    }

    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}
