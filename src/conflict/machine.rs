//! Resolution state machine
//!
//! Pure `(state, event) -> (next state, effect)` function for the protocol run
//! when a file with a surviving cache entry is reopened. The only exits are a
//! successful restore write or a confirmed discard; every other path loops
//! back to `CacheFound`.

use crate::cache::EditCacheEntry;
use crate::error::ApiError;

/// Which question the user is asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Restore the cached edit or discard it.
    RestoreOrDiscard,
    /// Confirm the destructive discard, or cancel back to the first prompt.
    ConfirmDiscard,
}

/// Answer produced by a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDecision {
    Restore,
    Discard,
    ConfirmDiscard,
    Cancel,
    /// Prompt closed without pressing one of its buttons.
    Dismiss,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionEvent {
    User(UserDecision),
    RestoreSucceeded { new_hash: Option<String> },
    RestoreFailed(String),
}

/// How a resolution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing was cached; open normally.
    NoCache,
    /// The cached content now lives on the server and is the current body.
    Restored {
        content: String,
        new_hash: Option<String>,
    },
    /// The cache was dropped; the server's content is authoritative.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    NoCache,
    CacheFound(EditCacheEntry),
    RestoreAttempt(EditCacheEntry),
    DiscardConfirm(EditCacheEntry),
    Resolved(Resolution),
}

impl ResolutionState {
    /// The cache entry under resolution, if any.
    pub fn entry(&self) -> Option<&EditCacheEntry> {
        match self {
            ResolutionState::CacheFound(entry)
            | ResolutionState::RestoreAttempt(entry)
            | ResolutionState::DiscardConfirm(entry) => Some(entry),
            ResolutionState::NoCache | ResolutionState::Resolved(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ResolutionState::NoCache | ResolutionState::Resolved(_))
    }

    fn name(&self) -> &'static str {
        match self {
            ResolutionState::NoCache => "NoCache",
            ResolutionState::CacheFound(_) => "CacheFound",
            ResolutionState::RestoreAttempt(_) => "RestoreAttempt",
            ResolutionState::DiscardConfirm(_) => "DiscardConfirm",
            ResolutionState::Resolved(_) => "Resolved",
        }
    }
}

/// Side effect the driver performs after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Prompt(PromptKind),
    WriteRemote { path: String, content: String },
    ClearCache { path: String },
    /// Terminal: hand the resolution back to the open flow.
    Finish,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: ResolutionState,
    pub effect: Effect,
}

impl Transition {
    fn to(state: ResolutionState, effect: Effect) -> Self {
        Self { state, effect }
    }

    fn reprompt(entry: EditCacheEntry) -> Self {
        Self::to(
            ResolutionState::CacheFound(entry),
            Effect::Prompt(PromptKind::RestoreOrDiscard),
        )
    }

    /// Entry point given the cache lookup for the path being opened.
    pub fn start(cached: Option<EditCacheEntry>) -> Self {
        match cached {
            Some(entry) => Self::reprompt(entry),
            None => Self::to(ResolutionState::NoCache, Effect::Finish),
        }
    }
}

/// Advance the protocol by one event.
///
/// Decisions that do not belong to the current prompt count as dismissal.
/// Events arriving in a state that cannot receive them are rejected.
pub fn step(state: ResolutionState, event: ResolutionEvent) -> Result<Transition, ApiError> {
    use ResolutionEvent::*;
    use ResolutionState::*;

    match (state, event) {
        (CacheFound(entry), User(UserDecision::Restore)) => {
            let effect = Effect::WriteRemote {
                path: entry.path.clone(),
                content: entry.content.clone(),
            };
            Ok(Transition::to(RestoreAttempt(entry), effect))
        }
        (CacheFound(entry), User(UserDecision::Discard)) => Ok(Transition::to(
            DiscardConfirm(entry),
            Effect::Prompt(PromptKind::ConfirmDiscard),
        )),
        (CacheFound(entry), User(_)) => Ok(Transition::reprompt(entry)),

        (RestoreAttempt(entry), RestoreSucceeded { new_hash }) => {
            let effect = Effect::ClearCache {
                path: entry.path.clone(),
            };
            Ok(Transition::to(
                Resolved(Resolution::Restored {
                    content: entry.content,
                    new_hash,
                }),
                effect,
            ))
        }
        (RestoreAttempt(entry), RestoreFailed(_)) => Ok(Transition::reprompt(entry)),

        (DiscardConfirm(entry), User(UserDecision::ConfirmDiscard)) => Ok(Transition::to(
            Resolved(Resolution::Discarded),
            Effect::ClearCache { path: entry.path },
        )),
        (DiscardConfirm(entry), User(_)) => Ok(Transition::reprompt(entry)),

        (state, event) => Err(ApiError::InvalidTransition(format!(
            "{} cannot handle {:?}",
            state.name(),
            event
        ))),
    }
}
