//! Hook registration and dispatch.
//!
//! - [`HookRegistry`]: event name → ordered handlers, from both sources
//! - [`StaticHooks`]: registrations fixed at start-up
//! - [`HookInvoker`]: runs handlers and interprets their outcomes
//! - [`DeprecationTracker`]: once-per-process deprecation notices

mod deprecation;
mod invoker;
mod registry;
mod static_hooks;

pub use deprecation::DeprecationTracker;
pub use invoker::{HookInvoker, InvocationPolicy};
pub use registry::{HandlerEntry, HookRegistry, RegistrationMeta, RuntimeMode, TEST_MODE_MARKERS};
pub use static_hooks::{StaticHook, StaticHooks, StaticHooksBuilder};
