//! # wikicore-std
//!
//! Standard implementations for the wikicore request-processing engine.
//!
//! This crate provides:
//! - **Hooks**: [`HookRegistry`], [`StaticHooks`], [`HookInvoker`]
//! - **Namespaces**: [`NamespaceRegistry`]
//! - **Titles**: [`TitleValue`], [`TitleResolver`]
//! - **Special pages**: [`SpecialPageList`]
//! - **Canonical redirects**: [`RedirectNormalizer`]
//! - **Entry point**: [`Wiki`]
//! - **Configuration**: [`Config`], [`HashConfig`]
//!
//! [`HookRegistry`]: hooks::HookRegistry
//! [`StaticHooks`]: hooks::StaticHooks
//! [`HookInvoker`]: hooks::HookInvoker
//! [`NamespaceRegistry`]: namespace::NamespaceRegistry
//! [`TitleValue`]: title::TitleValue
//! [`TitleResolver`]: title::TitleResolver
//! [`SpecialPageList`]: special::SpecialPageList
//! [`RedirectNormalizer`]: redirect::RedirectNormalizer
//! [`Wiki`]: wiki::Wiki
//! [`Config`]: config::Config
//! [`HashConfig`]: config::HashConfig

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use wikicore_core;

// Modules
pub mod config;
pub mod events;
pub mod hooks;
pub mod namespace;
pub mod redirect;
pub mod request;
pub mod special;
pub mod testing;
pub mod title;
pub mod wiki;

pub use inventory;
