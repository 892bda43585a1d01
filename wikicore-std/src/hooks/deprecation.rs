//! Once-per-process deprecation notices.

use parking_lot::Mutex;
use std::{
    collections::HashSet,
    sync::{Arc, LazyLock},
};

static GLOBAL: LazyLock<Arc<DeprecationTracker>> =
    LazyLock::new(|| Arc::new(DeprecationTracker::new()));

/// Remembers which (event, handler) pairs have already been reported.
#[derive(Debug, Default)]
pub struct DeprecationTracker {
    seen: Mutex<HashSet<(String, String)>>,
}

impl DeprecationTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide tracker.
    pub fn global() -> Arc<Self> {
        GLOBAL.clone()
    }

    /// Record a use; `true` only the first time the pair is seen.
    pub fn first_use(&self, event: &str, handler: &str) -> bool {
        self.seen
            .lock()
            .insert((event.to_owned(), handler.to_owned()))
    }

    /// Number of distinct pairs reported so far.
    pub fn reported(&self) -> usize {
        self.seen.lock().len()
    }
}
