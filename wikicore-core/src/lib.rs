//! # wikicore-core
//!
//! Core traits for the wikicore request-processing engine.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! extensions that only need to subscribe to events, without pulling in the
//! title and namespace machinery of `wikicore-std`.
//!
//! # Handler Model
//!
//! An event is a name plus an ordered list of arguments ([`HookArgs`]),
//! handed to every subscriber by mutable reference. Subscribers come in three
//! shapes, unified by [`Handler`]:
//!
//! - **Plain**: a free function or closure
//! - **Bound**: a receiver implementing [`Hook`], or a method bound to a receiver
//! - **With data**: a function plus data captured at registration
//!
//! Whatever a handler returns is converted into a [`HookOutcome`] by
//! [`IntoHookOutcome`]: nothing or `true` continues, `false` aborts the chain,
//! a string is fatal, and an error is handed to the invoker's policy.
//!
//! # Collaborators
//!
//! [`WebRequest`] and [`ResponseSink`] are the seams to the web layer.
//!
//! # Error Types
//!
//! - [`WikiError`] - Top-level error type
//! - [`HookError`] - Dispatch errors
//! - [`MalformedTitleError`] - Title parsing errors
//! - [`RedirectLoopError`] - Canonicalization does not converge

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod args;
mod context;
mod error;
mod handler;
mod hook;
mod response;

// Re-exports
pub use args::HookArgs;
pub use context::{ResponseSink, WebRequest};
pub use error::{
    ArgumentError, BoxError, ConfigError, HookError, MalformedTitleError, RedirectLoopError,
    WikiError,
};
pub use handler::Handler;
pub use hook::{Hook, HookOutcome, HookResult};
pub use response::IntoHookOutcome;
