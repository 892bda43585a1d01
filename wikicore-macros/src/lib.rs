//! Procedural macros for wikicore.
//!
//! - `#[hook("Event")]` - register a function as a static event handler

use proc_macro::TokenStream;

mod hook;

/// Register a function as a handler of a named event.
///
/// The function takes `&mut HookArgs<'_>` and returns anything implementing
/// `IntoHookOutcome`. Options:
///
/// - `order = N`: position among the static handlers of the event (lower first)
/// - `name = "..."`: name used in logs, the function path by default
/// - `deprecated = "1.31"`: log a deprecation notice on first use
#[proc_macro_attribute]
pub fn hook(attr: TokenStream, item: TokenStream) -> TokenStream {
    hook::hook_impl(attr, item)
}
