//! Names and argument shapes of the events fired by this crate.
//!
//! | Event | Arguments |
//! |-------|-----------|
//! | [`CANONICAL_NAMESPACES`] | `&mut BTreeMap<i32, String>` |
//! | [`TEST_CANONICAL_REDIRECT`] | `&mut RedirectRequest`, `&mut TitleValue` |
//! | [`BEFORE_INITIALIZE`] | `&mut TitleValue`, `&mut bool` (unused output flag) |
//! | [`SPECIAL_PAGE_INIT_LIST`] | `&mut BTreeSet<String>` (canonical special page names) |

/// Fired when the canonical namespace table is built. Handlers may add or
/// rename entries.
pub const CANONICAL_NAMESPACES: &str = "CanonicalNamespaces";

/// Fired before a canonical redirect is issued. Returning `false` vetoes it;
/// handlers may also rewrite the title.
pub const TEST_CANONICAL_REDIRECT: &str = "TestCanonicalRedirect";

/// Fired once the request title is known, before canonicalization.
pub const BEFORE_INITIALIZE: &str = "BeforeInitialize";

/// Fired when the special page list is built. Handlers may add pages or
/// remove core ones.
pub const SPECIAL_PAGE_INIT_LIST: &str = "SpecialPage_initList";
