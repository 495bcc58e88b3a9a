//! Resolution driver
//!
//! Runs the state machine in [`super::machine`] against the real edit cache,
//! remote store and prompt. Store errors propagate with the cache untouched;
//! a failed restore write is reported and loops back to the first prompt.

use super::machine::{step, Effect, Resolution, ResolutionEvent, ResolutionState, Transition};
use super::prompt::{DecisionPrompt, Notice};
use crate::cache::EditCacheStore;
use crate::concurrency::PathGuardRegistry;
use crate::error::ApiError;
use crate::remote::{RemoteStore, WriteOutcome};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ConflictResolver {
    remote: Arc<dyn RemoteStore>,
    cache: Arc<dyn EditCacheStore>,
    in_flight: PathGuardRegistry,
}

impl ConflictResolver {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        cache: Arc<dyn EditCacheStore>,
        in_flight: PathGuardRegistry,
    ) -> Self {
        Self {
            remote,
            cache,
            in_flight,
        }
    }

    /// Whether a resolution for `path` is currently running.
    pub fn is_resolving(&self, path: &str) -> bool {
        self.in_flight.is_active(path)
    }

    /// Drive the protocol for `path` to a terminal state.
    ///
    /// Returns `Resolution::NoCache` without prompting when nothing is
    /// cached. Refuses with `ResolutionInProgress` if another resolution for
    /// the same path is running.
    pub async fn resolve(
        &self,
        path: &str,
        prompt: &dyn DecisionPrompt,
    ) -> Result<Resolution, ApiError> {
        let _guard = self
            .in_flight
            .try_acquire(path)
            .ok_or_else(|| ApiError::ResolutionInProgress(path.to_string()))?;

        let Transition {
            mut state,
            mut effect,
        } = Transition::start(self.cache.get(path)?);

        loop {
            let event = match effect {
                Effect::Finish => return finish(state),
                Effect::ClearCache { path } => {
                    self.cache.remove(&path)?;
                    match &state {
                        ResolutionState::Resolved(Resolution::Restored { .. }) => {
                            info!(path = %path, "Restored cached edit");
                            prompt.notify(Notice::Restored { path });
                        }
                        _ => {
                            info!(path = %path, "Discarded cached edit");
                            prompt.notify(Notice::Discarded { path });
                        }
                    }
                    effect = Effect::Finish;
                    continue;
                }
                Effect::Prompt(kind) => {
                    let entry = state.entry().ok_or_else(|| {
                        ApiError::InvalidTransition("Prompt without a cache entry".to_string())
                    })?;
                    let decision = prompt.decide(kind, entry).await?;
                    debug!(path, ?kind, ?decision, "Prompt answered");
                    ResolutionEvent::User(decision)
                }
                Effect::WriteRemote { path, content } => {
                    match self.remote.write_file(&path, &content, None).await {
                        Ok(outcome) => {
                            let new_hash = match outcome {
                                WriteOutcome::Written { new_hash } => Some(new_hash),
                                WriteOutcome::NoChange => None,
                            };
                            ResolutionEvent::RestoreSucceeded { new_hash }
                        }
                        Err(err) => {
                            warn!(path = %path, error = %err, "Restore failed; cache retained");
                            prompt.notify(Notice::RestoreFailed {
                                path: path.clone(),
                                message: err.to_string(),
                            });
                            ResolutionEvent::RestoreFailed(err.to_string())
                        }
                    }
                }
            };

            let next = step(state, event)?;
            state = next.state;
            effect = next.effect;
        }
    }
}

fn finish(state: ResolutionState) -> Result<Resolution, ApiError> {
    match state {
        ResolutionState::NoCache => Ok(Resolution::NoCache),
        ResolutionState::Resolved(resolution) => Ok(resolution),
        other => Err(ApiError::InvalidTransition(format!(
            "Finished in non-terminal state {:?}",
            other
        ))),
    }
}
