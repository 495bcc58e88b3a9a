//! Edit cache conflict resolution
//!
//! When a file is opened while an edit for it is still staged in the local
//! cache, the user must either restore that edit to the server or explicitly
//! discard it. Silence never discards.

pub mod machine;
pub mod prompt;
pub mod resolver;

pub use machine::{
    step, Effect, PromptKind, Resolution, ResolutionEvent, ResolutionState, Transition,
    UserDecision,
};
pub use prompt::{DecisionPrompt, Notice, ScriptedPrompt};
pub use resolver::ConflictResolver;
