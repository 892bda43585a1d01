//! # wikicore - Hook Dispatch and Title Resolution
//!
//! `wikicore` is the request-processing core of a wiki: a synchronous,
//! name-keyed event system that extensions subscribe to, and the title
//! machinery built on top of it. A request is turned into a [`TitleValue`],
//! and clients using a non-canonical URL are sent to the canonical one.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wikicore::prelude::*;
//!
//! // Subscribe at start-up
//! #[wikicore::hook("TestCanonicalRedirect")]
//! fn keep_legacy_urls(args: &mut HookArgs<'_>) -> Result<bool, BoxError> {
//!     let title = args.get::<TitleValue>(1)?;
//!     Ok(!title.db_key().starts_with("Legacy"))
//! }
//!
//! let wiki = Wiki::from_config(&HashConfig::new())?;
//! let outcome = wiki.respond(&request, &mut sink)?;
//! ```
//!
//! ## Registering at run time
//!
//! ```rust,ignore
//! let registry = Arc::new(HookRegistry::new(StaticHooks::collect()));
//! registry.register("BeforeInitialize", Handler::plain(|args: &mut HookArgs<'_>| {
//!     let title = args.get_mut::<TitleValue>(0)?;
//!     tracing::debug!(%title, "initializing");
//!     Ok::<_, BoxError>(())
//! }));
//! let wiki = Wiki::new(&config, registry)?;
//! ```
//!
//! Handlers registered at run time run before the static ones, in
//! registration order.
//!
//! ## Crates
//!
//! - `wikicore-core`: handler model, errors and web-layer traits
//! - `wikicore-std`: registries, titles, namespaces, redirects
//! - `wikicore-macros`: `#[hook]`

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use wikicore_core::{
    // Errors
    ArgumentError,
    BoxError,
    ConfigError,
    // Handlers
    Handler,
    Hook,
    // Arguments
    HookArgs,
    HookError,
    HookOutcome,
    HookResult,
    IntoHookOutcome,
    MalformedTitleError,
    RedirectLoopError,
    // Web layer
    ResponseSink,
    WebRequest,
    WikiError,
    hook_args,
};

pub use wikicore_std::{
    config::{Config, HashConfig},
    hooks::{HookInvoker, HookRegistry, StaticHooks},
    namespace::NamespaceRegistry,
    redirect::RedirectNormalizer,
    special::SpecialPageList,
    title::{TitleResolver, TitleValue},
    wiki::{RequestOutcome, Wiki},
};

/// Hook registration and dispatch.
pub mod hooks {
    #![allow(clippy::wildcard_imports)]
    pub use wikicore_std::hooks::*;
}

/// Event names raised by the core.
pub mod events {
    #![allow(clippy::wildcard_imports)]
    pub use wikicore_std::events::*;
}

/// Configuration access.
pub mod config {
    #![allow(clippy::wildcard_imports)]
    pub use wikicore_std::config::*;
}

/// Namespace tables.
pub mod namespace {
    #![allow(clippy::wildcard_imports)]
    pub use wikicore_std::namespace::*;
}

/// Title values, parsing and formatting.
pub mod title {
    #![allow(clippy::wildcard_imports)]
    pub use wikicore_std::title::*;
}

/// Special page names and aliases.
pub mod special {
    #![allow(clippy::wildcard_imports)]
    pub use wikicore_std::special::*;
}

/// Canonical URL redirects.
pub mod redirect {
    #![allow(clippy::wildcard_imports)]
    pub use wikicore_std::redirect::*;
}

/// Request helpers: article path routing and in-memory requests.
pub mod request {
    #![allow(clippy::wildcard_imports)]
    pub use wikicore_std::request::*;
}

/// The request entry point.
pub mod wiki {
    #![allow(clippy::wildcard_imports)]
    pub use wikicore_std::wiki::*;
}

/// Test utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use wikicore_std::testing::*;
}

/// Prelude module for convenient imports.
///
/// ```rust
/// use wikicore::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Errors
        BoxError,
        // Configuration
        Config,
        // Handlers
        Handler,
        HashConfig,
        Hook,
        HookArgs,
        HookOutcome,
        HookRegistry,
        HookResult,
        IntoHookOutcome,
        RequestOutcome,
        // Web layer
        ResponseSink,
        StaticHooks,
        // Titles
        TitleValue,
        WebRequest,
        Wiki,
        WikiError,
    };
}

pub use wikicore_macros::hook;

pub use inventory;
