//! Error types for wikicore.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`WikiError`] - Top-level error type for all wikicore operations
//! - [`MalformedTitleError`] - Input that cannot be parsed into a title
//! - [`HookError`] - Errors raised while dispatching a hook event
//! - [`ArgumentError`] - A handler could not be called with the event arguments
//! - [`RedirectLoopError`] - Canonicalization does not converge
//! - [`ConfigError`] - Configuration lookups

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all wikicore operations.
#[derive(Error, Debug)]
pub enum WikiError {
    /// A title could not be parsed.
    #[error("bad title: {0}")]
    MalformedTitle(#[from] MalformedTitleError),

    /// A hook event failed.
    #[error("hook error: {0}")]
    Hook(#[from] HookError),

    /// The requested page redirects back to itself.
    #[error(transparent)]
    RedirectLoop(#[from] RedirectLoopError),

    /// A configuration value is missing or has the wrong type.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

impl From<BoxError> for WikiError {
    fn from(err: BoxError) -> Self {
        WikiError::Custom(err)
    }
}

/// Reasons a raw string cannot become a title.
///
/// The caller usually recovers by substituting a `Special:Badtitle`
/// placeholder and rendering an error page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedTitleError {
    /// Nothing is left once prefixes and whitespace are stripped.
    #[error("the requested page title is empty or contains only the name of a namespace")]
    Empty,

    /// The input contains a NUL byte.
    #[error("the requested page title contains a null byte")]
    NullByte,

    /// The input contains characters that are never legal in a title.
    #[error("the requested page title contains invalid characters: {0:?}")]
    InvalidCharacters(String),

    /// Percent-decoding failed or left an escape sequence behind.
    #[error("the requested page title contains an invalid percent-encoded sequence")]
    InvalidEncoding,

    /// Titles may not look like relative paths.
    #[error("the requested page title contains relative path components")]
    RelativePath,

    /// `~~~` is reserved for signatures.
    #[error("the requested page title contains a sequence of three or more tildes")]
    MagicTilde,

    /// The database key exceeds the maximum length.
    #[error("the requested page title is too long ({length} bytes, limit {max})")]
    TooLong {
        /// Length of the offending key in bytes.
        length: usize,
        /// Maximum permitted length in bytes.
        max: usize,
    },

    /// The namespace index is not registered.
    #[error("namespace {0} is not a registered namespace")]
    UnknownNamespace(i32),

    /// A talk page cannot point at another wiki.
    #[error("the requested page title is a talk page for an external wiki")]
    InterwikiTalk,
}

impl MalformedTitleError {
    /// The message key describing this error to users.
    pub fn message_key(&self) -> &'static str {
        match self {
            MalformedTitleError::Empty => "title-invalid-empty",
            MalformedTitleError::NullByte | MalformedTitleError::InvalidCharacters(_) => {
                "title-invalid-characters"
            }
            MalformedTitleError::InvalidEncoding => "title-invalid-utf8",
            MalformedTitleError::RelativePath => "title-invalid-relative",
            MalformedTitleError::MagicTilde => "title-invalid-magic-tilde",
            MalformedTitleError::TooLong { .. } => "title-invalid-too-long",
            MalformedTitleError::UnknownNamespace(_) => "title-invalid-bad-namespace",
            MalformedTitleError::InterwikiTalk => "title-invalid-talk-namespace",
        }
    }
}

/// Errors raised while dispatching a hook event.
#[derive(Error, Debug)]
pub enum HookError {
    /// A handler could not be called with the supplied arguments.
    #[error("invalid handler #{index} ({handler}) for hook {event}: {reason}")]
    Invocation {
        /// Event being dispatched.
        event: String,
        /// Position of the handler in the merged handler list.
        index: usize,
        /// Readable handler name.
        handler: String,
        /// What went wrong.
        #[source]
        reason: ArgumentError,
    },

    /// A handler returned a string, which signals a fatal condition.
    #[error("{message}")]
    Fatal {
        /// Event being dispatched.
        event: String,
        /// Readable handler name.
        handler: String,
        /// The exact string the handler returned.
        message: String,
    },

    /// A handler returned an error.
    #[error("handler #{index} ({handler}) for hook {event} failed")]
    HandlerFailed {
        /// Event being dispatched.
        event: String,
        /// Position of the handler in the merged handler list.
        index: usize,
        /// Readable handler name.
        handler: String,
        /// The handler's error.
        #[source]
        source: BoxError,
    },

    /// `clear` was called outside of test mode.
    #[error("cannot reset hook {0} in operation")]
    ClearInOperation(String),
}

/// A handler's view of the event arguments does not match what was passed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// The handler expects a different number of arguments.
    #[error("expected {expected} argument(s), got {actual}")]
    Arity {
        /// Number of arguments the handler declared.
        expected: usize,
        /// Number of arguments passed to the event.
        actual: usize,
    },

    /// No argument at this position.
    #[error("argument {index} is missing")]
    Missing {
        /// Requested position.
        index: usize,
    },

    /// The argument at this position has a different type.
    #[error("argument {index} is not a `{expected}`")]
    Type {
        /// Requested position.
        index: usize,
        /// Type the handler asked for.
        expected: &'static str,
    },

    /// The same argument was requested twice mutably.
    #[error("argument {index} was borrowed twice")]
    Aliased {
        /// Requested position.
        index: usize,
    },

    /// Extra data bound to a handler has a different type.
    #[error("bound data is not a `{expected}`")]
    Data {
        /// Type the handler asked for.
        expected: &'static str,
    },
}

/// Canonicalization did not converge; redirecting would loop forever.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RedirectLoopError {
    /// HTTP status the response layer should send.
    pub status: u16,
    /// URL the redirect would have pointed at.
    pub target_url: String,
    /// User-facing diagnostic.
    pub message: String,
}

/// Configuration lookup errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No setting with this name.
    #[error("no setting named {0}")]
    Missing(String),

    /// The setting exists but has another type.
    #[error("setting {name} is not a {expected}")]
    Type {
        /// Setting name.
        name: String,
        /// Expected type.
        expected: &'static str,
    },

    /// The configuration source could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(String),
}
