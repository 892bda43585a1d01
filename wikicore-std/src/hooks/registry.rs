//! Registry of event handlers.
//!
//! The registry merges two sources:
//!
//! - **Programmatic** registrations made at runtime through
//!   [`HookRegistry::register`]
//! - **Static** registrations fixed at start-up ([`StaticHooks`])
//!
//! For every event, programmatic handlers run first, in registration order,
//! followed by the static handlers in their table order. This order is part
//! of the hook contract.

use super::static_hooks::StaticHooks;
use parking_lot::RwLock;
use std::{
    borrow::Cow,
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};
use wikicore_core::{Handler, HookError};

/// Environment markers that put the process into test mode.
pub const TEST_MODE_MARKERS: [&str; 2] = ["MW_PHPUNIT_TEST", "MW_PARSER_TEST"];

/// Whether destructive registry operations are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    /// Normal operation; registrations can only be added.
    Production,
    /// Test or maintenance mode; registrations may be cleared.
    Test,
}

impl RuntimeMode {
    /// Detect the mode from the process environment.
    pub fn detect() -> Self {
        Self::from_markers(|name| std::env::var_os(name).is_some())
    }

    /// Test mode if any of [`TEST_MODE_MARKERS`] is set according to `is_set`.
    pub fn from_markers(is_set: impl Fn(&str) -> bool) -> Self {
        if TEST_MODE_MARKERS.iter().any(|marker| is_set(marker)) {
            RuntimeMode::Test
        } else {
            RuntimeMode::Production
        }
    }
}

/// Metadata for a registered handler.
#[derive(Debug, Clone, Default)]
pub struct RegistrationMeta {
    name: Option<Cow<'static, str>>,
    deprecated_since: Option<Cow<'static, str>>,
    arity: Option<usize>,
}

impl RegistrationMeta {
    /// Create default metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the readable handler name used in logs and errors.
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark the registration as deprecated since `version`.
    pub fn deprecated_since(mut self, version: impl Into<Cow<'static, str>>) -> Self {
        self.deprecated_since = Some(version.into());
        self
    }

    /// Declare how many arguments the handler accepts.
    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = Some(arity);
        self
    }

    /// The deprecation version, if any.
    pub fn deprecation(&self) -> Option<&str> {
        self.deprecated_since.as_deref()
    }

    /// The declared arity, if any.
    pub fn arity(&self) -> Option<usize> {
        self.arity
    }
}

static NEXT_ENTRY_ID: AtomicU64 = AtomicU64::new(1);

/// A handler with associated metadata.
#[derive(Debug, Clone)]
pub struct HandlerEntry {
    handler: Handler,
    name: Cow<'static, str>,
    meta: RegistrationMeta,
    id: u64,
}

impl HandlerEntry {
    /// Create a new entry. Unnamed handlers are named after their shape and
    /// position (`function#2`).
    pub fn new(handler: Handler, meta: RegistrationMeta, position: usize) -> Self {
        let name = meta
            .name
            .clone()
            .unwrap_or_else(|| Cow::Owned(format!("{}#{}", handler.shape(), position)));
        Self {
            handler,
            name,
            meta,
            id: NEXT_ENTRY_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Process-wide unique id of this registration. Clones share it.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Identity of the handler across registries: its explicit name, or
    /// its registration id when unnamed. Positional names repeat between
    /// sources and after `clear`, so they are never used here.
    pub fn identity(&self) -> Cow<'_, str> {
        match &self.meta.name {
            Some(name) => Cow::Borrowed(name.as_ref()),
            None => Cow::Owned(format!("#{}", self.id)),
        }
    }

    /// The handler.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// The readable handler name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registration metadata.
    pub fn meta(&self) -> &RegistrationMeta {
        &self.meta
    }
}

// ============================================================================
// HookRegistry
// ============================================================================

/// Event name → ordered handler list, merged from both sources.
///
/// Registration normally finishes during start-up; afterwards the registry is
/// only read. Late registration is still safe: the programmatic map sits
/// behind a reader/writer lock, and [`handlers`](Self::handlers) returns a
/// snapshot so no lock is held while handlers run.
#[derive(Debug)]
pub struct HookRegistry {
    dynamic: RwLock<HashMap<String, Vec<HandlerEntry>>>,
    statics: StaticHooks,
    mode: RuntimeMode,
}

impl HookRegistry {
    /// Create a registry over `statics`, detecting the runtime mode from the
    /// environment.
    pub fn new(statics: StaticHooks) -> Self {
        Self::with_mode(statics, RuntimeMode::detect())
    }

    /// Create a registry with an explicit runtime mode.
    pub fn with_mode(statics: StaticHooks, mode: RuntimeMode) -> Self {
        Self {
            dynamic: RwLock::new(HashMap::new()),
            statics,
            mode,
        }
    }

    /// The runtime mode.
    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    /// The static registration table.
    pub fn statics(&self) -> &StaticHooks {
        &self.statics
    }

    /// Attach a handler to `event`.
    pub fn register(&self, event: impl Into<String>, handler: Handler) {
        self.register_with_meta(event, handler, RegistrationMeta::new());
    }

    /// Attach a handler to `event` with metadata.
    pub fn register_with_meta(
        &self,
        event: impl Into<String>,
        handler: Handler,
        meta: RegistrationMeta,
    ) {
        let event = event.into();
        let mut dynamic = self.dynamic.write();
        let list = dynamic.entry(event).or_default();
        let position = list.len() + 1;
        list.push(HandlerEntry::new(handler, meta, position));
    }

    /// Remove every programmatic handler of `event`. Static registrations
    /// are untouched.
    ///
    /// Only allowed in [`RuntimeMode::Test`]: silently dropping production
    /// handlers would disable whatever they enforce.
    pub fn clear(&self, event: &str) -> Result<(), HookError> {
        if self.mode != RuntimeMode::Test {
            return Err(HookError::ClearInOperation(event.to_owned()));
        }
        self.dynamic.write().remove(event);
        Ok(())
    }

    /// Whether `event` has at least one handler in either source.
    pub fn is_registered(&self, event: &str) -> bool {
        let dynamic = self
            .dynamic
            .read()
            .get(event)
            .is_some_and(|list| !list.is_empty());
        dynamic || !self.statics.handlers(event).is_empty()
    }

    /// All handlers of `event`: programmatic first, then static.
    pub fn handlers(&self, event: &str) -> Vec<HandlerEntry> {
        let mut merged: Vec<HandlerEntry> = self
            .dynamic
            .read()
            .get(event)
            .cloned()
            .unwrap_or_default();
        merged.extend_from_slice(self.statics.handlers(event));
        merged
    }

    /// Names of all events with at least one handler, sorted.
    pub fn events(&self) -> Vec<String> {
        let mut events: Vec<String> = self
            .dynamic
            .read()
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(event, _)| event.clone())
            .chain(self.statics.events().map(str::to_owned))
            .collect();
        events.sort();
        events.dedup();
        events
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new(StaticHooks::default())
    }
}
