//! # Hook invocation
//!
//! [`HookInvoker`] runs the handlers of an event one after another on the
//! caller's thread and folds their outcomes into a single "continue" flag.
//!
//! - [`run`](HookInvoker::run) stops at the first handler that aborts, and
//!   fails on fatal strings, handler errors and malformed handlers.
//! - [`run_without_abort`](HookInvoker::run_without_abort) runs every handler
//!   and logs whatever goes wrong. Use it for events no subscriber may block.

use super::{
    deprecation::DeprecationTracker,
    registry::{HandlerEntry, HookRegistry},
};
use std::sync::Arc;
use tracing::{debug, error, warn};
use wikicore_core::{ArgumentError, HookArgs, HookError, HookOutcome};

/// How `run_without_abort` treats malformed handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvocationPolicy {
    /// Fail loudly (development).
    Strict,
    /// Log and skip (production).
    #[default]
    Lenient,
}

impl InvocationPolicy {
    /// `Strict` when development warnings are enabled.
    pub fn from_development_warnings(enabled: bool) -> Self {
        if enabled {
            InvocationPolicy::Strict
        } else {
            InvocationPolicy::Lenient
        }
    }
}

/// Executes event handlers under the uniform return-value contract.
#[derive(Debug, Clone)]
pub struct HookInvoker {
    registry: Arc<HookRegistry>,
    policy: InvocationPolicy,
    deprecations: Arc<DeprecationTracker>,
}

impl HookInvoker {
    /// Create an invoker over `registry` with the lenient policy and the
    /// process-wide deprecation tracker.
    pub fn new(registry: Arc<HookRegistry>) -> Self {
        Self {
            registry,
            policy: InvocationPolicy::default(),
            deprecations: DeprecationTracker::global(),
        }
    }

    /// Set the policy for malformed handlers.
    pub fn with_policy(mut self, policy: InvocationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use a private deprecation tracker.
    pub fn with_deprecation_tracker(mut self, tracker: Arc<DeprecationTracker>) -> Self {
        self.deprecations = tracker;
        self
    }

    /// The registry handlers are read from.
    pub fn registry(&self) -> &Arc<HookRegistry> {
        &self.registry
    }

    /// The policy for malformed handlers.
    pub fn policy(&self) -> InvocationPolicy {
        self.policy
    }

    /// Run every handler of `event` until one aborts.
    ///
    /// Returns `Ok(true)` if no handler aborted and `Ok(false)` if one
    /// returned `false`. A handler returning a string raises
    /// [`HookError::Fatal`] carrying that string; an erroring or malformed
    /// handler also ends the chain with an error. No handler after the one
    /// that stopped the chain runs.
    pub fn run(&self, event: &str, args: &mut HookArgs<'_>) -> Result<bool, HookError> {
        let handlers = self.registry.handlers(event);
        debug!(event, handlers = handlers.len(), "running hook");

        for (index, entry) in handlers.iter().enumerate() {
            let outcome = self.call_hook(event, index, entry, args).inspect_err(|err| {
                error!(event, handler = entry.name(), error = %err, "hook handler failed");
            })?;
            match outcome {
                HookOutcome::Continue => {}
                HookOutcome::Abort => {
                    debug!(event, handler = entry.name(), "hook aborted");
                    return Ok(false);
                }
                HookOutcome::Fatal(message) => {
                    return Err(HookError::Fatal {
                        event: event.to_owned(),
                        handler: entry.name().to_owned(),
                        message,
                    });
                }
            }
        }
        Ok(true)
    }

    /// Run every handler of `event`, whatever they return.
    ///
    /// Always returns `Ok(true)`. Abort and fatal returns are logged as
    /// invalid for an unabortable event, handler errors are logged and
    /// skipped. A malformed handler is logged and skipped under
    /// [`InvocationPolicy::Lenient`] and returned as an error under
    /// [`InvocationPolicy::Strict`].
    pub fn run_without_abort(
        &self,
        event: &str,
        args: &mut HookArgs<'_>,
    ) -> Result<bool, HookError> {
        let handlers = self.registry.handlers(event);
        debug!(event, handlers = handlers.len(), "running unabortable hook");

        for (index, entry) in handlers.iter().enumerate() {
            match self.call_hook(event, index, entry, args) {
                Ok(HookOutcome::Continue) => {}
                Ok(outcome) => {
                    warn!(
                        event,
                        handler = entry.name(),
                        ?outcome,
                        "invalid return from handler for unabortable hook"
                    );
                }
                Err(err @ HookError::Invocation { .. }) => {
                    error!(event, handler = entry.name(), error = %err, "invalid hook handler");
                    if self.policy == InvocationPolicy::Strict {
                        return Err(err);
                    }
                }
                Err(err) => {
                    warn!(event, handler = entry.name(), error = %err, "hook handler failed; continuing");
                }
            }
        }
        Ok(true)
    }

    fn call_hook(
        &self,
        event: &str,
        index: usize,
        entry: &HandlerEntry,
        args: &mut HookArgs<'_>,
    ) -> Result<HookOutcome, HookError> {
        let invocation = |reason: ArgumentError| HookError::Invocation {
            event: event.to_owned(),
            index,
            handler: entry.name().to_owned(),
            reason,
        };

        if let Some(arity) = entry.meta().arity() {
            args.expect_arity(arity).map_err(invocation)?;
        }

        if let Some(version) = entry.meta().deprecation()
            && self.deprecations.first_use(event, &entry.identity())
        {
            warn!(
                event,
                handler = entry.name(),
                "Use of {} hook (used in {}) was deprecated in MediaWiki {}.",
                event,
                entry.name(),
                version
            );
        }

        entry
            .handler()
            .invoke(args)
            .map_err(|source| match source.downcast::<ArgumentError>() {
                Ok(reason) => invocation(*reason),
                Err(source) => HookError::HandlerFailed {
                    event: event.to_owned(),
                    index,
                    handler: entry.name().to_owned(),
                    source,
                },
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{RegistrationMeta, RuntimeMode, StaticHooks};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;
    use wikicore_core::{BoxError, Handler};

    fn invoker() -> HookInvoker {
        let registry = HookRegistry::with_mode(StaticHooks::default(), RuntimeMode::Test);
        HookInvoker::new(Arc::new(registry))
            .with_deprecation_tracker(Arc::new(DeprecationTracker::new()))
    }

    fn appender(n: i32) -> Handler {
        Handler::plain(move |args: &mut HookArgs<'_>| {
            args.get_mut::<Vec<i32>>(0)?.push(n);
            Ok::<_, BoxError>(true)
        })
    }

    #[test]
    fn test_all_handlers_run_in_order() {
        let invoker = invoker();
        for n in 1..=3 {
            invoker.registry().register("Ev", appender(n));
        }
        let mut seen: Vec<i32> = Vec::new();
        let result = invoker
            .run_without_abort("Ev", &mut HookArgs::new().with(&mut seen))
            .unwrap();
        assert!(result);
        assert_eq!(seen, [1, 2, 3]);
    }

    #[test]
    fn test_false_return_aborts() {
        let invoker = invoker();
        invoker
            .registry()
            .register("MediaWikiHooksTest001", Handler::plain(|_: &mut HookArgs<'_>| false));
        invoker.registry().register(
            "MediaWikiHooksTest001",
            Handler::plain(|args: &mut HookArgs<'_>| {
                *args.get_mut::<String>(0)? = "test".into();
                Ok::<_, BoxError>(true)
            }),
        );

        let mut foo = String::from("original");
        let result = invoker
            .run("MediaWikiHooksTest001", &mut HookArgs::new().with(&mut foo))
            .unwrap();
        assert!(!result);
        assert_eq!(foo, "original", "Hooks abort after a false return.");
    }

    #[test]
    fn test_null_return_continues() {
        let invoker = invoker();
        invoker
            .registry()
            .register("MediaWikiHooksTest001", Handler::plain(|_: &mut HookArgs<'_>| ()));
        invoker.registry().register(
            "MediaWikiHooksTest001",
            Handler::plain(|args: &mut HookArgs<'_>| {
                *args.get_mut::<String>(0)? = "test".into();
                Ok::<_, BoxError>(true)
            }),
        );

        let mut foo = String::from("original");
        assert!(invoker
            .run("MediaWikiHooksTest001", &mut HookArgs::new().with(&mut foo))
            .unwrap());
        assert_eq!(foo, "test", "Hooks continue after a null return.");
    }

    #[test]
    fn test_string_return_is_fatal() {
        let invoker = invoker();
        let later = Arc::new(AtomicUsize::new(0));
        let later_clone = later.clone();
        invoker.registry().register(
            "Ev",
            Handler::plain(|_: &mut HookArgs<'_>| "Bad things happened"),
        );
        invoker.registry().register(
            "Ev",
            Handler::plain(move |_: &mut HookArgs<'_>| {
                later_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let err = invoker.run("Ev", &mut HookArgs::new()).unwrap_err();
        match err {
            HookError::Fatal { message, .. } => assert_eq!(message, "Bad things happened"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handler_error_aborts_run_but_not_run_without_abort() {
        let invoker = invoker();
        invoker.registry().register(
            "Ev",
            Handler::plain(|_: &mut HookArgs<'_>| Err::<(), _>("func error")),
        );
        invoker.registry().register("Ev", appender(2));

        let mut seen: Vec<i32> = Vec::new();
        let err = invoker
            .run("Ev", &mut HookArgs::new().with(&mut seen))
            .unwrap_err();
        assert!(matches!(err, HookError::HandlerFailed { index: 0, .. }));
        assert!(seen.is_empty());

        assert!(invoker
            .run_without_abort("Ev", &mut HookArgs::new().with(&mut seen))
            .unwrap());
        assert_eq!(seen, [2]);
    }

    #[test]
    fn test_arity_mismatch_is_invocation_error() {
        let invoker = invoker();
        invoker.registry().register_with_meta(
            "Ev",
            Handler::plain(|_: &mut HookArgs<'_>| ()),
            RegistrationMeta::new().named("two-args").with_arity(2),
        );
        let mut only = 1i32;
        let err = invoker
            .run("Ev", &mut HookArgs::new().with(&mut only))
            .unwrap_err();
        match err {
            HookError::Invocation {
                event,
                index,
                handler,
                reason,
            } => {
                assert_eq!(event, "Ev");
                assert_eq!(index, 0);
                assert_eq!(handler, "two-args");
                assert_eq!(
                    reason,
                    ArgumentError::Arity {
                        expected: 2,
                        actual: 1
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_handler_policy_in_run_without_abort() {
        let registry = HookRegistry::with_mode(StaticHooks::default(), RuntimeMode::Test);
        registry.register(
            "Ev",
            Handler::plain(|args: &mut HookArgs<'_>| args.get::<u64>(0).map(|_| ())),
        );
        registry.register("Ev", appender(7));
        let registry = Arc::new(registry);

        let mut seen: Vec<i32> = Vec::new();
        let lenient = HookInvoker::new(registry.clone());
        assert!(lenient
            .run_without_abort("Ev", &mut HookArgs::new().with(&mut seen))
            .unwrap());
        assert_eq!(seen, [7]);

        let strict = HookInvoker::new(registry).with_policy(InvocationPolicy::Strict);
        let err = strict
            .run_without_abort("Ev", &mut HookArgs::new().with(&mut seen))
            .unwrap_err();
        assert!(matches!(err, HookError::Invocation { index: 0, .. }));
    }

    #[test]
    #[traced_test]
    fn test_deprecation_logged_once_per_pair() {
        let invoker = invoker();
        invoker.registry().register_with_meta(
            "OldEvent",
            Handler::plain(|_: &mut HookArgs<'_>| ()),
            RegistrationMeta::new().named("legacy").deprecated_since("1.31"),
        );
        for _ in 0..3 {
            invoker.run("OldEvent", &mut HookArgs::new()).unwrap();
        }
        logs_assert(|lines: &[&str]| {
            let count = lines
                .iter()
                .filter(|line| line.contains("was deprecated in MediaWiki 1.31"))
                .count();
            if count == 1 {
                Ok(())
            } else {
                Err(format!("expected one deprecation notice, got {count}"))
            }
        });
    }

    #[test]
    #[traced_test]
    fn test_unnamed_deprecated_handlers_are_told_apart() {
        let statics = StaticHooks::builder()
            .add_with_meta(
                "OldEv",
                Handler::plain(|_: &mut HookArgs<'_>| ()),
                RegistrationMeta::new().deprecated_since("1.20"),
            )
            .build();
        let registry = Arc::new(HookRegistry::with_mode(statics, RuntimeMode::Test));
        registry.register_with_meta(
            "OldEv",
            Handler::plain(|_: &mut HookArgs<'_>| ()),
            RegistrationMeta::new().deprecated_since("1.30"),
        );
        let invoker = HookInvoker::new(registry.clone())
            .with_deprecation_tracker(Arc::new(DeprecationTracker::new()));

        let names: Vec<String> = registry
            .handlers("OldEv")
            .iter()
            .map(|entry| entry.name().to_owned())
            .collect();
        assert_eq!(names, ["function#1", "function#1"]);

        invoker.run("OldEv", &mut HookArgs::new()).unwrap();
        invoker.run("OldEv", &mut HookArgs::new()).unwrap();

        // Re-registering after a clear is a new handler with the same name.
        registry.clear("OldEv").unwrap();
        registry.register_with_meta(
            "OldEv",
            Handler::plain(|_: &mut HookArgs<'_>| ()),
            RegistrationMeta::new().deprecated_since("1.30"),
        );
        invoker.run("OldEv", &mut HookArgs::new()).unwrap();

        logs_assert(|lines: &[&str]| {
            let count = |version: &str| {
                lines
                    .iter()
                    .filter(|line| line.contains(&format!("deprecated in MediaWiki {version}")))
                    .count()
            };
            match (count("1.20"), count("1.30")) {
                (1, 2) => Ok(()),
                other => Err(format!("unexpected notice counts (1.20, 1.30): {other:?}")),
            }
        });
    }

    #[test]
    fn test_entry_identity() {
        let named = HandlerEntry::new(
            Handler::plain(|_: &mut HookArgs<'_>| ()),
            RegistrationMeta::new().named("legacy"),
            1,
        );
        let first = HandlerEntry::new(Handler::plain(|_: &mut HookArgs<'_>| ()), RegistrationMeta::new(), 1);
        let second = HandlerEntry::new(Handler::plain(|_: &mut HookArgs<'_>| ()), RegistrationMeta::new(), 1);

        assert_eq!(named.identity(), "legacy");
        assert_eq!(first.name(), second.name());
        assert_ne!(first.identity(), second.identity());
        assert_eq!(first.clone().identity(), first.identity());
    }

    #[test]
    fn test_unknown_event_continues() {
        let invoker = invoker();
        assert!(invoker.run("Nobody", &mut HookArgs::new()).unwrap());
        assert!(invoker.run_without_abort("Nobody", &mut HookArgs::new()).unwrap());
    }
}
