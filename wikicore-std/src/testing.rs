//! Testing utilities for wikicore.
//!
//! This module provides utilities to make testing handlers and request
//! processing easier.
//!
//! # Features
//!
//! - [`test_invoker`]: an invoker over an empty, clearable registry
//! - [`RecordingHook`]: a handler that records its calls into a shared log
//! - [`CountingHandler`]: a handler that counts invocations
//! - [`RecordingSink`]: a [`ResponseSink`] that remembers what it was told

use crate::hooks::{DeprecationTracker, HookInvoker, HookRegistry, RuntimeMode, StaticHooks};
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use wikicore_core::{Handler, Hook, HookArgs, HookOutcome, HookResult, ResponseSink};

/// An invoker over an empty registry in test mode, with its own deprecation
/// tracker.
pub fn test_invoker() -> Arc<HookInvoker> {
    let registry = HookRegistry::with_mode(StaticHooks::default(), RuntimeMode::Test);
    Arc::new(
        HookInvoker::new(Arc::new(registry))
            .with_deprecation_tracker(Arc::new(DeprecationTracker::new())),
    )
}

// ============================================================================
// Recording Hook
// ============================================================================

/// A shared, ordered log of handler calls.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// A handler that appends its label to a [`CallLog`] and returns a fixed
/// outcome.
///
/// # Example
///
/// ```rust,ignore
/// let log = CallLog::default();
/// registry.register("Ev", RecordingHook::new("first", &log).into_handler());
/// registry.register("Ev", RecordingHook::new("second", &log).into_handler());
///
/// invoker.run("Ev", &mut HookArgs::new())?;
/// assert_eq!(*log.lock(), ["first", "second"]);
/// ```
#[derive(Debug, Clone)]
pub struct RecordingHook {
    label: String,
    log: CallLog,
    outcome: HookOutcome,
}

impl RecordingHook {
    /// Create a recording hook that continues.
    pub fn new(label: impl Into<String>, log: &CallLog) -> Self {
        Self::with_outcome(label, log, HookOutcome::Continue)
    }

    /// Create a recording hook that returns `outcome`.
    pub fn with_outcome(label: impl Into<String>, log: &CallLog, outcome: HookOutcome) -> Self {
        Self {
            label: label.into(),
            log: log.clone(),
            outcome,
        }
    }

    /// Wrap as a bound handler.
    pub fn into_handler(self) -> Handler {
        Handler::bound(self)
    }
}

impl Hook for RecordingHook {
    fn on_event(&self, _args: &mut HookArgs<'_>) -> HookResult {
        self.log.lock().push(self.label.clone());
        Ok(self.outcome.clone())
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A handler that counts how many times it was called.
#[derive(Debug, Clone, Default)]
pub struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// Create a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// A handler incrementing this counter and continuing.
    pub fn handler(&self) -> Handler {
        let count = self.count.clone();
        Handler::plain(move |_: &mut HookArgs<'_>| {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }
}

// ============================================================================
// Recording Sink
// ============================================================================

/// Something a [`RecordingSink`] was told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// A redirect.
    Redirect {
        /// Target URL.
        url: String,
        /// HTTP status.
        status: u16,
        /// Shared cache lifetime.
        max_age: Option<u32>,
    },
    /// An error page.
    Error {
        /// HTTP status.
        status: u16,
        /// Message shown.
        message: String,
    },
}

/// A [`ResponseSink`] recording every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Vec<SinkEvent>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded, in order.
    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }
}

impl ResponseSink for RecordingSink {
    fn redirect(&mut self, url: &str, status: u16, max_age: Option<u32>) {
        self.events.push(SinkEvent::Redirect {
            url: url.to_owned(),
            status,
            max_age,
        });
    }

    fn error(&mut self, status: u16, message: &str) {
        self.events.push(SinkEvent::Error {
            status,
            message: message.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_hook_logs_in_order() {
        let invoker = test_invoker();
        let log = CallLog::default();
        invoker
            .registry()
            .register("Ev", RecordingHook::new("a", &log).into_handler());
        invoker.registry().register(
            "Ev",
            RecordingHook::with_outcome("b", &log, HookOutcome::Abort).into_handler(),
        );
        invoker
            .registry()
            .register("Ev", RecordingHook::new("c", &log).into_handler());

        assert!(!invoker.run("Ev", &mut HookArgs::new()).unwrap());
        assert_eq!(*log.lock(), ["a", "b"]);
    }

    #[test]
    fn test_counting_handler() {
        let invoker = test_invoker();
        let counter = CountingHandler::new();
        invoker.registry().register("Ev", counter.handler());
        invoker.run("Ev", &mut HookArgs::new()).unwrap();
        invoker.run_without_abort("Ev", &mut HookArgs::new()).unwrap();
        assert_eq!(counter.count(), 2);
    }
}
