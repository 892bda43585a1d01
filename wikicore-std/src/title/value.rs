//! The immutable title value.

use crate::namespace::{NS_MAIN, NS_SPECIAL};
use std::fmt;
use wikicore_core::MalformedTitleError;

/// A structured reference to a wiki page.
///
/// Both the database form (`db_key`, underscores) and the display form
/// (`text`, spaces) are derived from the same source string when the value
/// is made, so they always agree. A `TitleValue` is never mutated; derive new
/// values with methods like [`create_fragment_target`](Self::create_fragment_target).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TitleValue {
    namespace: i32,
    db_key: String,
    text: String,
    fragment: String,
    interwiki: String,
}

impl TitleValue {
    /// Make a title without validation. Spaces in `title` become underscores
    /// in the database form and underscores become spaces in the text form.
    ///
    /// Every other constructor ends up here.
    pub fn make(ns: i32, title: &str, fragment: &str, interwiki: &str) -> Self {
        Self {
            namespace: ns,
            db_key: title.replace(' ', "_"),
            text: title.replace('_', " "),
            fragment: fragment.to_owned(),
            interwiki: interwiki.to_owned(),
        }
    }

    /// Make a title from a database key, checking only that the key is
    /// non-empty and free of whitespace and edge underscores.
    pub fn new(
        ns: i32,
        db_key: &str,
        fragment: &str,
        interwiki: &str,
    ) -> Result<Self, MalformedTitleError> {
        if db_key.is_empty() {
            return Err(MalformedTitleError::Empty);
        }
        if db_key.starts_with('_')
            || db_key.ends_with('_')
            || db_key.contains([' ', '\r', '\n', '\t'])
        {
            return Err(MalformedTitleError::InvalidCharacters(db_key.to_owned()));
        }
        Ok(Self::make(ns, db_key, fragment, interwiki))
    }

    /// The namespace index.
    pub fn namespace(&self) -> i32 {
        self.namespace
    }

    /// Whether the title is in `ns`.
    pub fn in_namespace(&self, ns: i32) -> bool {
        self.namespace == ns
    }

    /// The key with underscores, without namespace prefix.
    pub fn db_key(&self) -> &str {
        &self.db_key
    }

    /// The key with spaces, without namespace prefix.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The fragment after `#`, or `""`.
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Whether a fragment is set.
    pub fn has_fragment(&self) -> bool {
        !self.fragment.is_empty()
    }

    /// The interwiki prefix, or `""` for local titles.
    pub fn interwiki(&self) -> &str {
        &self.interwiki
    }

    /// Whether the title points at another wiki.
    pub fn is_external(&self) -> bool {
        !self.interwiki.is_empty()
    }

    /// Whether pages can be stored under this title.
    pub fn can_exist(&self) -> bool {
        self.namespace >= NS_MAIN
    }

    /// Whether this is a special page.
    pub fn is_special_page(&self) -> bool {
        self.namespace == NS_SPECIAL
    }

    /// The same title pointing at `fragment`.
    pub fn create_fragment_target(&self, fragment: &str) -> Self {
        Self::make(self.namespace, &self.text, fragment, &self.interwiki)
    }
}

/// Debugging form `iw:ns:db_key#fragment`. Use the resolver's formatting
/// methods for anything user-facing.
impl fmt::Display for TitleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_external() {
            write!(f, "{}:", self.interwiki)?;
        }
        write!(f, "{}:{}", self.namespace, self.db_key)?;
        if self.has_fragment() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}
