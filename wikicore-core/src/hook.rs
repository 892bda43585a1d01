//! # Handler return contract
//!
//! Every handler invocation ends in a [`HookResult`]: either an error, or a
//! [`HookOutcome`] telling the invoker what to do next.
//!
//! | Handler returns         | Outcome                       |
//! |-------------------------|-------------------------------|
//! | nothing / `true`        | [`HookOutcome::Continue`]     |
//! | `false`                 | [`HookOutcome::Abort`]        |
//! | a string                | [`HookOutcome::Fatal`]        |
//! | an error                | `Err(_)`, handled by policy   |
//!
//! The conversions live in [`IntoHookOutcome`](crate::IntoHookOutcome).

use crate::{args::HookArgs, error::BoxError};

/// What the invoker does after a handler returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Proceed to the next handler.
    Continue,
    /// Stop the chain; the event reports `false` to its caller.
    Abort,
    /// Stop the chain and raise a fatal error carrying this message.
    Fatal(String),
}

impl HookOutcome {
    /// Whether the chain should proceed.
    pub fn is_continue(&self) -> bool {
        matches!(self, HookOutcome::Continue)
    }
}

/// Result of a single handler invocation.
pub type HookResult = Result<HookOutcome, BoxError>;

/// A receiver that handles events through a method.
///
/// This is the "bound method" shape: the handler carries its own state and
/// is invoked through `&self`. Register it with
/// [`Handler::bound`](crate::Handler::bound), or pair an arbitrary method
/// with a receiver through [`Handler::method`](crate::Handler::method).
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Hook`",
    label = "missing `Hook` implementation",
    note = "Hooks must implement `on_event`, or be registered as a plain function."
)]
pub trait Hook: Send + Sync + 'static {
    /// Called when an event this receiver is registered for fires.
    fn on_event(&self, args: &mut HookArgs<'_>) -> HookResult;
}

impl<H: Hook> Hook for std::sync::Arc<H> {
    fn on_event(&self, args: &mut HookArgs<'_>) -> HookResult {
        (**self).on_event(args)
    }
}
