//! # Special pages
//!
//! [`SpecialPageList`] knows which special pages exist and how their
//! localized aliases map back to canonical names. The list is built once
//! from the core pages, then handed to the `SpecialPage_initList` hook so
//! extensions can add or remove pages.

use crate::{
    config::{Config, keys},
    events,
    hooks::HookInvoker,
    namespace::NS_SPECIAL,
    title::TitleValue,
};
use parking_lot::RwLock;
use phf::phf_set;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};
use tracing::{debug, warn};
use wikicore_core::{ConfigError, HookArgs, HookError};

/// Special pages shipped with the core, except `Search` which depends on
/// `DisableInternalSearch`.
static CORE_SPECIAL_PAGES: phf::Set<&'static str> = phf_set! {
    // Maintenance reports
    "BrokenRedirects", "Deadendpages", "DoubleRedirects", "Longpages", "Ancientpages",
    "Lonelypages", "Fewestrevisions", "Withoutinterwiki", "Protectedpages",
    "Protectedtitles", "Shortpages", "Uncategorizedcategories", "Uncategorizedimages",
    "Uncategorizedpages", "Uncategorizedtemplates", "Unusedcategories", "Unusedimages",
    "Unusedtemplates", "Unwatchedpages", "Wantedcategories", "Wantedfiles", "Wantedpages",
    "Wantedtemplates",
    // Page lists
    "Allpages", "Prefixindex", "Categories", "Listredirects", "PagesWithProp",
    "TrackingCategories",
    // Login and account management
    "Userlogin", "Userlogout", "CreateAccount", "LinkAccounts", "UnlinkAccounts",
    "ChangeCredentials", "RemoveCredentials",
    // Users and rights
    "Activeusers", "Block", "Unblock", "BlockList", "AutoblockList", "ChangePassword",
    "BotPasswords", "PasswordReset", "DeletedContributions", "Preferences", "ResetTokens",
    "Contributions", "Listgrouprights", "Listgrants", "Listusers", "Listadmins", "Listbots",
    "Userrights", "EditWatchlist", "PasswordPolicies",
    // Recent changes and logs
    "Newimages", "Log", "Watchlist", "Newpages", "Recentchanges", "Recentchangeslinked",
    "Tags",
    // Media reports and uploads
    "Listfiles", "Filepath", "MediaStatistics", "MIMEsearch", "FileDuplicateSearch",
    "Upload", "UploadStash", "ListDuplicatedFiles",
    // Data and tools
    "ApiSandbox", "Statistics", "Allmessages", "Version", "Lockdb", "Unlockdb",
    // Redirecting special pages
    "LinkSearch", "Randompage", "RandomInCategory", "Randomredirect", "Randomrootpage",
    "GoToInterwiki",
    // High use pages
    "Mostlinkedcategories", "Mostimages", "Mostinterwikis", "Mostlinked",
    "Mostlinkedtemplates", "Mostcategories", "Mostrevisions",
    // Page tools
    "ComparePages", "Export", "Import", "Undelete", "Whatlinkshere", "MergeHistory",
    "ExpandTemplates",
    // Other
    "Booksources",
    // Unlisted / redirects
    "ApiHelp", "Badtitle", "Blankpage", "Diff", "EditTags", "Emailuser", "Movepage",
    "Mycontributions", "MyLanguage", "Mypage", "Mytalk", "Myuploads", "AllMyUploads",
    "PermanentLink", "Redirect", "Revisiondelete", "RunJobs", "Specialpages", "PageData",
};

/// Name of the internal search page.
pub const SEARCH_PAGE: &str = "Search";

/// Name of the placeholder page shown for malformed titles.
pub const BADTITLE_PAGE: &str = "Badtitle";

#[derive(Debug)]
struct SpecialPages {
    names: Arc<BTreeSet<String>>,
    aliases: HashMap<String, String>,
}

impl SpecialPages {
    fn new(names: BTreeSet<String>, configured: &BTreeMap<String, Vec<String>>) -> Self {
        let mut aliases = HashMap::new();
        for (name, list) in configured {
            if !names.contains(name) {
                continue;
            }
            for alias in list {
                aliases.insert(fold_alias(alias), name.clone());
            }
        }
        // A canonical name always maps to itself, even if an alias collides.
        for name in &names {
            aliases.insert(fold_alias(name), name.clone());
        }
        Self {
            names: Arc::new(names),
            aliases,
        }
    }
}

fn fold_alias(alias: &str) -> String {
    alias.replace(' ', "_").to_lowercase()
}

/// The special pages of the wiki and their aliases.
#[derive(Debug)]
pub struct SpecialPageList {
    invoker: Arc<HookInvoker>,
    internal_search: bool,
    aliases: BTreeMap<String, Vec<String>>,
    cache: RwLock<Option<Arc<SpecialPages>>>,
}

impl SpecialPageList {
    /// A list with the core pages, internal search enabled, and no aliases.
    pub fn new(invoker: Arc<HookInvoker>) -> Self {
        Self {
            invoker,
            internal_search: true,
            aliases: BTreeMap::new(),
            cache: RwLock::new(None),
        }
    }

    /// A list reading `DisableInternalSearch` and `SpecialPageAliases` from
    /// `config`.
    pub fn from_config(invoker: Arc<HookInvoker>, config: &dyn Config) -> Result<Self, ConfigError> {
        let aliases: BTreeMap<String, Vec<String>> = config
            .get(keys::SPECIAL_PAGE_ALIASES)?
            .clone()
            .try_into::<BTreeMap<String, Vec<String>>>()
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", keys::SPECIAL_PAGE_ALIASES)))?;
        Ok(Self::new(invoker)
            .with_internal_search(!config.get_bool(keys::DISABLE_INTERNAL_SEARCH)?)
            .with_aliases(aliases))
    }

    /// Whether `Special:Search` is listed.
    pub fn with_internal_search(mut self, enabled: bool) -> Self {
        self.internal_search = enabled;
        self.invalidate();
        self
    }

    /// Localized aliases, keyed by canonical page name.
    pub fn with_aliases(mut self, aliases: BTreeMap<String, Vec<String>>) -> Self {
        self.aliases = aliases;
        self.invalidate();
        self
    }

    /// Canonical names of every special page.
    ///
    /// Built on first use, or always when `force_rebuild` is set. Building
    /// runs the `SpecialPage_initList` hook; its errors are returned and
    /// nothing is cached.
    pub fn names(&self, force_rebuild: bool) -> Result<Arc<BTreeSet<String>>, HookError> {
        if !force_rebuild {
            if let Some(pages) = self.cache.read().as_ref() {
                return Ok(pages.names.clone());
            }
        }
        Ok(self.rebuild()?.names.clone())
    }

    /// Drop the cached list.
    pub fn invalidate(&self) {
        *self.cache.write() = None;
    }

    /// Whether `name` is a canonical special page name.
    pub fn exists(&self, name: &str) -> bool {
        self.pages().names.contains(name)
    }

    /// Split `Name/subpage` and resolve `Name` (a canonical name or alias,
    /// case-insensitively) to its canonical name.
    ///
    /// Returns `None` if no special page has that name.
    pub fn resolve_alias(&self, db_key: &str) -> Option<(String, Option<String>)> {
        let (alias, subpage) = match db_key.split_once('/') {
            Some((alias, subpage)) => (alias, (!subpage.is_empty()).then(|| subpage.to_owned())),
            None => (db_key, None),
        };
        let name = self.pages().aliases.get(&fold_alias(alias))?.clone();
        Some((name, subpage))
    }

    /// The title of special page `name`, with an optional subpage.
    pub fn title_for(&self, name: &str, subpage: Option<&str>) -> TitleValue {
        match subpage {
            Some(subpage) => TitleValue::make(NS_SPECIAL, &format!("{name}/{subpage}"), "", ""),
            None => TitleValue::make(NS_SPECIAL, name, "", ""),
        }
    }

    /// The title of `Special:Badtitle`.
    pub fn badtitle(&self) -> TitleValue {
        self.title_for(BADTITLE_PAGE, None)
    }

    fn pages(&self) -> Arc<SpecialPages> {
        if let Some(pages) = self.cache.read().as_ref() {
            return pages.clone();
        }
        match self.rebuild() {
            Ok(pages) => pages,
            Err(err) => {
                warn!(error = %err, "SpecialPage_initList hook failed; using core special pages");
                Arc::new(SpecialPages::new(self.core_names(), &self.aliases))
            }
        }
    }

    fn rebuild(&self) -> Result<Arc<SpecialPages>, HookError> {
        let mut names = self.core_names();
        self.invoker.run(
            events::SPECIAL_PAGE_INIT_LIST,
            &mut HookArgs::new().with(&mut names),
        )?;
        debug!(pages = names.len(), "built special page list");

        let pages = Arc::new(SpecialPages::new(names, &self.aliases));
        *self.cache.write() = Some(pages.clone());
        Ok(pages)
    }

    fn core_names(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> =
            CORE_SPECIAL_PAGES.iter().map(|name| (*name).to_owned()).collect();
        if self.internal_search {
            names.insert(SEARCH_PAGE.to_owned());
        }
        names
    }
}
