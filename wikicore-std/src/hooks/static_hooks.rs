//! # Statically configured handlers
//!
//! Handlers that are known before the first request: functions annotated
//! with `#[wikicore::hook]` (collected through `inventory`) and tables built
//! explicitly at start-up with [`StaticHooksBuilder`].
//!
//! Once built, a [`StaticHooks`] table never changes.

use super::registry::{HandlerEntry, RegistrationMeta};
use std::{collections::HashMap, sync::Arc};
use wikicore_core::{Handler, HookArgs, HookResult};

/// A compile-time registration submitted to `inventory`.
///
/// Usually produced by the `#[hook]` attribute macro:
///
/// ```rust,ignore
/// #[wikicore::hook("TestCanonicalRedirect")]
/// fn keep_legacy_urls(args: &mut HookArgs<'_>) -> bool {
///     false
/// }
/// ```
#[derive(Debug)]
pub struct StaticHook {
    /// Event the function subscribes to.
    pub event: &'static str,
    /// Readable handler name.
    pub name: &'static str,
    /// The function.
    pub handler: fn(&mut HookArgs<'_>) -> HookResult,
    /// Sort key among static handlers of the same event (lower first).
    pub order: i32,
    /// Version the registration was deprecated in, if any.
    pub deprecated_since: Option<&'static str>,
}

inventory::collect!(StaticHook);

/// Immutable event → handler table.
#[derive(Debug, Clone, Default)]
pub struct StaticHooks {
    by_event: Arc<HashMap<String, Vec<HandlerEntry>>>,
}

impl StaticHooks {
    /// Start building a table.
    pub fn builder() -> StaticHooksBuilder {
        StaticHooksBuilder::default()
    }

    /// A table holding every `inventory`-submitted [`StaticHook`].
    pub fn collect() -> Self {
        Self::builder().with_inventory().build()
    }

    /// Handlers of `event`, in table order.
    pub fn handlers(&self, event: &str) -> &[HandlerEntry] {
        self.by_event.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Events with at least one handler.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.by_event
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(event, _)| event.as_str())
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.by_event.values().all(Vec::is_empty)
    }
}

/// Builder for [`StaticHooks`].
#[derive(Debug, Default)]
pub struct StaticHooksBuilder {
    by_event: HashMap<String, Vec<HandlerEntry>>,
}

impl StaticHooksBuilder {
    /// Append a handler for `event`.
    pub fn add(self, event: impl Into<String>, handler: Handler) -> Self {
        self.add_with_meta(event, handler, RegistrationMeta::new())
    }

    /// Append a handler for `event` with metadata.
    pub fn add_with_meta(
        mut self,
        event: impl Into<String>,
        handler: Handler,
        meta: RegistrationMeta,
    ) -> Self {
        let list = self.by_event.entry(event.into()).or_default();
        let position = list.len() + 1;
        list.push(HandlerEntry::new(handler, meta, position));
        self
    }

    /// Append every `inventory`-submitted [`StaticHook`].
    ///
    /// Link order is not stable, so submissions are sorted by
    /// `(event, order, name)` before being appended.
    pub fn with_inventory(mut self) -> Self {
        let mut submitted: Vec<&'static StaticHook> = inventory::iter::<StaticHook>().collect();
        submitted.sort_by(|a, b| (a.event, a.order, a.name).cmp(&(b.event, b.order, b.name)));

        for hook in submitted {
            let mut meta = RegistrationMeta::new().named(hook.name);
            if let Some(version) = hook.deprecated_since {
                meta = meta.deprecated_since(version);
            }
            self = self.add_with_meta(hook.event, Handler::plain(hook.handler), meta);
        }
        self
    }

    /// Freeze the table.
    pub fn build(self) -> StaticHooks {
        StaticHooks {
            by_event: Arc::new(self.by_event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wikicore_core::HookOutcome;

    fn first(args: &mut HookArgs<'_>) -> HookResult {
        args.get_mut::<Vec<&'static str>>(0)?.push("first");
        Ok(HookOutcome::Continue)
    }

    fn second(args: &mut HookArgs<'_>) -> HookResult {
        args.get_mut::<Vec<&'static str>>(0)?.push("second");
        Ok(HookOutcome::Continue)
    }

    // Submitted in reverse so the sort is what puts them in order.
    inventory::submit! {
        StaticHook {
            event: "StaticHooksUnitTest",
            name: "second",
            handler: second,
            order: 1,
            deprecated_since: None,
        }
    }

    inventory::submit! {
        StaticHook {
            event: "StaticHooksUnitTest",
            name: "first",
            handler: first,
            order: 0,
            deprecated_since: Some("1.31"),
        }
    }

    #[test]
    fn test_inventory_collection_is_ordered() {
        let statics = StaticHooks::collect();
        let handlers = statics.handlers("StaticHooksUnitTest");
        assert_eq!(handlers.len(), 2);
        assert_eq!(handlers[0].name(), "first");
        assert_eq!(handlers[0].meta().deprecation(), Some("1.31"));
        assert_eq!(handlers[1].name(), "second");

        let mut seen: Vec<&'static str> = Vec::new();
        for entry in handlers {
            entry
                .handler()
                .invoke(&mut HookArgs::new().with(&mut seen))
                .unwrap();
        }
        assert_eq!(seen, ["first", "second"]);
    }

    #[test]
    fn test_builder_keeps_insertion_order() {
        let statics = StaticHooks::builder()
            .add("A", Handler::plain(|_: &mut HookArgs<'_>| ()))
            .add("A", Handler::plain(|_: &mut HookArgs<'_>| false))
            .build();
        let names: Vec<&str> = statics.handlers("A").iter().map(|e| e.name()).collect();
        assert_eq!(names, ["function#1", "function#2"]);
        assert!(statics.handlers("B").is_empty());
        assert!(!statics.is_empty());
    }
}
