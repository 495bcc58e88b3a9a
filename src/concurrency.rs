//! Per-path in-flight tracking
//!
//! Ensures at most one conflict resolution runs per file path. Flows for
//! different paths proceed independently; a second flow for a busy path is
//! refused instead of queued, since it would prompt the user twice for the
//! same cache entry.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Registry of paths with an operation in flight.
pub struct PathGuardRegistry {
    active: Arc<Mutex<HashSet<String>>>,
}

impl PathGuardRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Claim `path` for the lifetime of the returned guard.
    ///
    /// Returns `None` while another guard for the same path is alive.
    pub fn try_acquire(&self, path: &str) -> Option<PathGuard> {
        let mut active = self.active.lock();
        if !active.insert(path.to_string()) {
            return None;
        }
        Some(PathGuard {
            path: path.to_string(),
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_active(&self, path: &str) -> bool {
        self.active.lock().contains(path)
    }
}

impl Default for PathGuardRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases its path on drop.
pub struct PathGuard {
    path: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl PathGuard {
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        self.active.lock().remove(&self.path);
    }
}
