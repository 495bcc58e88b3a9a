//! Markdrive: client-side manager for a remote Markdown store
//!
//! Projects the remote directory listing into a full tree and a folder
//! navigation tree with Markdown counts, keeps a durable local cache of every
//! save until the server confirms it, and walks the user through restoring or
//! discarding any edit that never made it.

pub mod cache;
pub mod concurrency;
pub mod config;
pub mod conflict;
pub mod error;
pub mod logging;
pub mod remote;
pub mod selection;
pub mod session;
pub mod store;
pub mod tooling;
pub mod tree;

pub use error::{ApiError, StorageError};
pub use session::{DeleteOutcome, OpenedFile, Session};
