//! # Namespaces
//!
//! A namespace is an integer-tagged partition of the page-name space. Negative
//! indices (`Media`, `Special`) are virtual: no page is ever stored in them.
//! Non-negative indices come in subject/talk pairs, the talk index being the
//! odd one.
//!
//! [`NamespaceRegistry`] maps indices to canonical names. The table is built
//! lazily from the built-in namespaces, extension namespaces, site-configured
//! extra namespaces and finally the `CanonicalNamespaces` hook, then cached
//! until [`NamespaceRegistry::invalidate`] is called.

use crate::{
    config::{Config, keys},
    events,
    hooks::HookInvoker,
};
use parking_lot::RwLock;
use phf::phf_map;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tracing::{debug, warn};
use wikicore_core::{ConfigError, HookArgs, HookError};

/// `Media:` links point directly at files.
pub const NS_MEDIA: i32 = -2;
/// Pages generated on the fly.
pub const NS_SPECIAL: i32 = -1;
/// Articles.
pub const NS_MAIN: i32 = 0;
#[allow(missing_docs)]
pub const NS_TALK: i32 = 1;
#[allow(missing_docs)]
pub const NS_USER: i32 = 2;
#[allow(missing_docs)]
pub const NS_USER_TALK: i32 = 3;
#[allow(missing_docs)]
pub const NS_PROJECT: i32 = 4;
#[allow(missing_docs)]
pub const NS_PROJECT_TALK: i32 = 5;
#[allow(missing_docs)]
pub const NS_FILE: i32 = 6;
#[allow(missing_docs)]
pub const NS_FILE_TALK: i32 = 7;
#[allow(missing_docs)]
pub const NS_MEDIAWIKI: i32 = 8;
#[allow(missing_docs)]
pub const NS_MEDIAWIKI_TALK: i32 = 9;
#[allow(missing_docs)]
pub const NS_TEMPLATE: i32 = 10;
#[allow(missing_docs)]
pub const NS_TEMPLATE_TALK: i32 = 11;
#[allow(missing_docs)]
pub const NS_HELP: i32 = 12;
#[allow(missing_docs)]
pub const NS_HELP_TALK: i32 = 13;
#[allow(missing_docs)]
pub const NS_CATEGORY: i32 = 14;
#[allow(missing_docs)]
pub const NS_CATEGORY_TALK: i32 = 15;

/// Built-in namespaces and their canonical names.
pub const BUILTIN_NAMESPACES: [(i32, &str); 18] = [
    (NS_MEDIA, "Media"),
    (NS_SPECIAL, "Special"),
    (NS_MAIN, ""),
    (NS_TALK, "Talk"),
    (NS_USER, "User"),
    (NS_USER_TALK, "User_talk"),
    (NS_PROJECT, "Project"),
    (NS_PROJECT_TALK, "Project_talk"),
    (NS_FILE, "File"),
    (NS_FILE_TALK, "File_talk"),
    (NS_MEDIAWIKI, "MediaWiki"),
    (NS_MEDIAWIKI_TALK, "MediaWiki_talk"),
    (NS_TEMPLATE, "Template"),
    (NS_TEMPLATE_TALK, "Template_talk"),
    (NS_HELP, "Help"),
    (NS_HELP_TALK, "Help_talk"),
    (NS_CATEGORY, "Category"),
    (NS_CATEGORY_TALK, "Category_talk"),
];

/// Legacy names still accepted as prefixes, keyed by their lowercase form.
static NAMESPACE_ALIASES: phf::Map<&'static str, i32> = phf_map! {
    "image" => NS_FILE,
    "image_talk" => NS_FILE_TALK,
};

/// Namespaces whose titles are capitalized whatever `CapitalLinks` says.
const ALWAYS_CAPITALIZED: [i32; 3] = [NS_SPECIAL, NS_USER, NS_MEDIAWIKI];

// ============================================================================
// Cache
// ============================================================================

/// Everything derived from one build of the canonical table. Replaced as a
/// whole so the derived lists can never disagree with the names.
#[derive(Debug)]
struct NamespaceTables {
    canonical: Arc<BTreeMap<i32, String>>,
    indexes: Vec<i32>,
    valid: Vec<i32>,
    by_name: HashMap<String, i32>,
}

impl NamespaceTables {
    fn new(canonical: BTreeMap<i32, String>) -> Self {
        let indexes: Vec<i32> = canonical.keys().copied().collect();
        let valid = indexes.iter().copied().filter(|ns| *ns >= 0).collect();

        let mut by_name = HashMap::with_capacity(canonical.len() + NAMESPACE_ALIASES.len());
        for (alias, index) in NAMESPACE_ALIASES.entries() {
            if canonical.contains_key(index) {
                by_name.insert((*alias).to_owned(), *index);
            }
        }
        for (index, name) in &canonical {
            if !name.is_empty() {
                by_name.insert(fold_name(name), *index);
            }
        }

        Self {
            canonical: Arc::new(canonical),
            indexes,
            valid,
            by_name,
        }
    }
}

fn fold_name(name: &str) -> String {
    name.trim().replace(' ', "_").to_lowercase()
}

// ============================================================================
// NamespaceRegistry
// ============================================================================

/// Namespace index ↔ canonical name lookups.
#[derive(Debug)]
pub struct NamespaceRegistry {
    invoker: Arc<HookInvoker>,
    extension: BTreeMap<i32, String>,
    extra: BTreeMap<i32, String>,
    capital_links: bool,
    cache: RwLock<Option<Arc<NamespaceTables>>>,
}

impl NamespaceRegistry {
    /// A registry holding the built-in namespaces only.
    pub fn new(invoker: Arc<HookInvoker>) -> Self {
        Self {
            invoker,
            extension: BTreeMap::new(),
            extra: BTreeMap::new(),
            capital_links: true,
            cache: RwLock::new(None),
        }
    }

    /// A registry reading `ExtensionNamespaces`, `ExtraNamespaces` and
    /// `CapitalLinks` from `config`.
    pub fn from_config(invoker: Arc<HookInvoker>, config: &dyn Config) -> Result<Self, ConfigError> {
        Ok(Self::new(invoker)
            .with_extension_namespaces(config.get_namespace_map(keys::EXTENSION_NAMESPACES)?)
            .with_extra_namespaces(config.get_namespace_map(keys::EXTRA_NAMESPACES)?)
            .with_capital_links(config.get_bool(keys::CAPITAL_LINKS)?))
    }

    /// Namespaces contributed by extensions.
    pub fn with_extension_namespaces(mut self, namespaces: BTreeMap<i32, String>) -> Self {
        self.extension = namespaces;
        self.invalidate();
        self
    }

    /// Site-configured namespaces. These override extension namespaces with
    /// the same index.
    pub fn with_extra_namespaces(mut self, namespaces: BTreeMap<i32, String>) -> Self {
        self.extra = namespaces;
        self.invalidate();
        self
    }

    /// Whether titles are capitalized outside the always-capitalized
    /// namespaces.
    pub fn with_capital_links(mut self, capital_links: bool) -> Self {
        self.capital_links = capital_links;
        self
    }

    /// The hook invoker used for `CanonicalNamespaces`.
    pub fn invoker(&self) -> &Arc<HookInvoker> {
        &self.invoker
    }

    /// Whether two indices refer to the same namespace.
    ///
    /// Today this is plain equality. Callers compare through this function so
    /// that namespace aliasing can be introduced in one place.
    pub fn equals(&self, a: i32, b: i32) -> bool {
        a == b
    }

    /// The index → canonical name table.
    ///
    /// Built on first use, or always when `force_rebuild` is set. Building
    /// runs the `CanonicalNamespaces` hook; its errors are returned and
    /// nothing is cached.
    pub fn canonical_namespaces(
        &self,
        force_rebuild: bool,
    ) -> Result<Arc<BTreeMap<i32, String>>, HookError> {
        if !force_rebuild {
            if let Some(tables) = self.cache.read().as_ref() {
                return Ok(tables.canonical.clone());
            }
        }
        let tables = self.rebuild()?;
        Ok(tables.canonical.clone())
    }

    /// Drop the cached table together with every list derived from it.
    pub fn invalidate(&self) {
        *self.cache.write() = None;
    }

    /// The canonical name of `ns`. The main namespace has the empty name.
    pub fn canonical_name(&self, ns: i32) -> Option<String> {
        self.tables().canonical.get(&ns).cloned()
    }

    /// The index of a canonical name or alias. Case-insensitive; spaces and
    /// underscores are interchangeable.
    pub fn canonical_index(&self, name: &str) -> Option<i32> {
        self.tables().by_name.get(&fold_name(name)).copied()
    }

    /// Every known index, ascending.
    pub fn namespace_indexes(&self) -> Vec<i32> {
        self.tables().indexes.clone()
    }

    /// Every index that can hold pages (non-negative), ascending.
    pub fn valid_namespaces(&self) -> Vec<i32> {
        self.tables().valid.clone()
    }

    /// Whether `ns` is known.
    pub fn exists(&self, ns: i32) -> bool {
        self.tables().canonical.contains_key(&ns)
    }

    /// Whether `ns` is a talk namespace.
    pub fn is_talk(&self, ns: i32) -> bool {
        ns > NS_MAIN && ns % 2 == 1
    }

    /// Whether `ns` is a subject (non-talk) namespace.
    pub fn is_subject(&self, ns: i32) -> bool {
        !self.is_talk(ns)
    }

    /// The subject namespace of `ns`. Virtual namespaces are their own subject.
    pub fn subject(&self, ns: i32) -> i32 {
        if ns < NS_MAIN { ns } else { ns & !1 }
    }

    /// The talk namespace of `ns`, or `None` for virtual namespaces.
    pub fn talk(&self, ns: i32) -> Option<i32> {
        (ns >= NS_MAIN).then_some(ns | 1)
    }

    /// Whether the first letter of titles in `ns` is uppercased.
    pub fn is_capitalized(&self, ns: i32) -> bool {
        ALWAYS_CAPITALIZED.contains(&self.subject(ns)) || self.capital_links
    }

    /// The cached tables, building them if needed. A failing hook is logged
    /// and the table is served without its contribution, uncached.
    fn tables(&self) -> Arc<NamespaceTables> {
        if let Some(tables) = self.cache.read().as_ref() {
            return tables.clone();
        }
        match self.rebuild() {
            Ok(tables) => tables,
            Err(err) => {
                warn!(error = %err, "CanonicalNamespaces hook failed; using configured namespaces");
                Arc::new(NamespaceTables::new(self.configured()))
            }
        }
    }

    fn rebuild(&self) -> Result<Arc<NamespaceTables>, HookError> {
        let mut canonical = self.configured();
        // No lock is held here: handlers may call back into the registry.
        self.invoker.run(
            events::CANONICAL_NAMESPACES,
            &mut HookArgs::new().with(&mut canonical),
        )?;
        debug!(namespaces = canonical.len(), "built canonical namespace table");

        let tables = Arc::new(NamespaceTables::new(canonical));
        *self.cache.write() = Some(tables.clone());
        Ok(tables)
    }

    fn configured(&self) -> BTreeMap<i32, String> {
        let mut canonical: BTreeMap<i32, String> = BUILTIN_NAMESPACES
            .iter()
            .map(|(index, name)| (*index, (*name).to_owned()))
            .collect();
        canonical.extend(self.extension.iter().map(|(k, v)| (*k, v.clone())));
        canonical.extend(self.extra.iter().map(|(k, v)| (*k, v.clone())));
        canonical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::HashConfig,
        hooks::{HookRegistry, RuntimeMode, StaticHooks},
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wikicore_core::{BoxError, Handler};

    fn invoker() -> Arc<HookInvoker> {
        let registry = HookRegistry::with_mode(StaticHooks::default(), RuntimeMode::Test);
        Arc::new(HookInvoker::new(Arc::new(registry)))
    }

    #[test]
    fn test_equals() {
        let namespaces = NamespaceRegistry::new(invoker());
        assert!(namespaces.equals(NS_MAIN, NS_MAIN));
        assert!(namespaces.equals(NS_MAIN, 0));
        assert!(namespaces.equals(NS_USER, 2));
        assert!(!namespaces.equals(NS_USER, NS_USER_TALK));
        assert!(!namespaces.equals(NS_MAIN, NS_TALK));
    }

    #[test]
    fn test_builtin_names() {
        let namespaces = NamespaceRegistry::new(invoker());
        assert_eq!(namespaces.canonical_name(NS_MAIN).as_deref(), Some(""));
        assert_eq!(namespaces.canonical_name(NS_USER_TALK).as_deref(), Some("User_talk"));
        assert_eq!(namespaces.canonical_name(NS_SPECIAL).as_deref(), Some("Special"));
        assert_eq!(namespaces.canonical_name(100), None);

        assert_eq!(namespaces.canonical_index("user talk"), Some(NS_USER_TALK));
        assert_eq!(namespaces.canonical_index("FILE"), Some(NS_FILE));
        assert_eq!(namespaces.canonical_index("Image"), Some(NS_FILE));
        assert_eq!(namespaces.canonical_index(""), None);
        assert_eq!(namespaces.canonical_index("Portal"), None);
    }

    #[test]
    fn test_subject_and_talk() {
        let namespaces = NamespaceRegistry::new(invoker());
        assert!(namespaces.is_talk(NS_TALK));
        assert!(!namespaces.is_talk(NS_MAIN));
        assert!(!namespaces.is_talk(NS_SPECIAL));
        assert!(namespaces.is_subject(NS_MEDIA));
        assert_eq!(namespaces.subject(NS_USER_TALK), NS_USER);
        assert_eq!(namespaces.subject(NS_SPECIAL), NS_SPECIAL);
        assert_eq!(namespaces.talk(NS_USER), Some(NS_USER_TALK));
        assert_eq!(namespaces.talk(NS_USER_TALK), Some(NS_USER_TALK));
        assert_eq!(namespaces.talk(NS_MEDIA), None);
    }

    #[test]
    fn test_capitalization() {
        let namespaces = NamespaceRegistry::new(invoker()).with_capital_links(false);
        assert!(namespaces.is_capitalized(NS_USER));
        assert!(namespaces.is_capitalized(NS_USER_TALK));
        assert!(namespaces.is_capitalized(NS_MEDIAWIKI));
        assert!(namespaces.is_capitalized(NS_SPECIAL));
        assert!(!namespaces.is_capitalized(NS_MAIN));
        assert!(!namespaces.is_capitalized(NS_HELP));
    }

    #[test]
    fn test_configured_namespaces() {
        let config = HashConfig::from_toml_str(
            r#"
            [ExtensionNamespaces]
            100 = "Extension"
            102 = "Gadget"

            [ExtraNamespaces]
            100 = "Portal"
            101 = "Portal_talk"
            "#,
        )
        .unwrap();
        let namespaces = NamespaceRegistry::from_config(invoker(), &config).unwrap();

        assert_eq!(namespaces.canonical_name(100).as_deref(), Some("Portal"));
        assert_eq!(namespaces.canonical_name(102).as_deref(), Some("Gadget"));
        assert_eq!(namespaces.canonical_index("portal talk"), Some(101));
        assert!(namespaces.exists(102));
        assert!(namespaces.valid_namespaces().iter().all(|ns| *ns >= 0));
        assert_eq!(namespaces.namespace_indexes().first(), Some(&NS_MEDIA));
        assert_eq!(namespaces.namespace_indexes().last(), Some(&102));
    }

    #[test]
    fn test_hook_contributes_and_invalidate_rebuilds() {
        let invoker = invoker();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        invoker.registry().register(
            events::CANONICAL_NAMESPACES,
            Handler::plain(move |args: &mut HookArgs<'_>| {
                counter.fetch_add(1, Ordering::SeqCst);
                args.get_mut::<BTreeMap<i32, String>>(0)?
                    .insert(3000, "Hooked".to_owned());
                Ok::<_, BoxError>(())
            }),
        );
        let namespaces = NamespaceRegistry::new(invoker);

        assert_eq!(namespaces.canonical_name(3000).as_deref(), Some("Hooked"));
        assert!(namespaces.canonical_namespaces(false).unwrap().contains_key(&3000));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        namespaces.invalidate();
        assert!(namespaces.exists(3000));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        namespaces.canonical_namespaces(true).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_failing_hook_is_not_cached() {
        let invoker = invoker();
        invoker.registry().register(
            events::CANONICAL_NAMESPACES,
            Handler::plain(|_: &mut HookArgs<'_>| Err::<(), _>("backend down")),
        );
        let namespaces = NamespaceRegistry::new(invoker.clone());

        assert!(namespaces.canonical_namespaces(false).is_err());
        assert_eq!(namespaces.canonical_name(NS_USER).as_deref(), Some("User"));

        invoker.registry().clear(events::CANONICAL_NAMESPACES).unwrap();
        assert!(namespaces.canonical_namespaces(false).is_ok());
    }
}
