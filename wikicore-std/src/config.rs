//! # Configuration
//!
//! The core reads settings through the [`Config`] trait. [`HashConfig`] is the
//! stock implementation: a TOML table layered over MediaWiki's defaults.
//!
//! ```toml
//! Server = "https://wiki.example.org"
//! ArticlePath = "/wiki/$1"
//! UsePathInfo = true
//!
//! [ExtraNamespaces]
//! 100 = "Portal"
//! 101 = "Portal_talk"
//!
//! [InterwikiPrefixes]
//! wikipedia = "https://en.wikipedia.org/wiki/$1"
//!
//! [SpecialPageAliases]
//! Userlogin = ["Login", "Anmelden"]
//! ```

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use toml::{Table, Value};
use wikicore_core::ConfigError;

/// Setting names understood by the core.
pub mod keys {
    /// Whether titles are read from the URL path.
    pub const USE_PATH_INFO: &str = "UsePathInfo";
    /// URL path template for articles; `$1` is replaced by the title.
    pub const ARTICLE_PATH: &str = "ArticlePath";
    /// Path of the entry script.
    pub const SCRIPT: &str = "Script";
    /// Scheme and host prepended to local URLs.
    pub const SERVER: &str = "Server";
    /// Title shown when a request names none.
    pub const MAIN_PAGE: &str = "MainPage";
    /// Whether the first letter of titles is capitalized.
    pub const CAPITAL_LINKS: &str = "CapitalLinks";
    /// Removes `Special:Search` from the special page list.
    pub const DISABLE_INTERNAL_SEARCH: &str = "DisableInternalSearch";
    /// Site-defined namespaces (`index = "Name"`).
    pub const EXTRA_NAMESPACES: &str = "ExtraNamespaces";
    /// Namespaces contributed by extensions (`index = "Name"`).
    pub const EXTENSION_NAMESPACES: &str = "ExtensionNamespaces";
    /// Interwiki prefix → URL template.
    pub const INTERWIKI_PREFIXES: &str = "InterwikiPrefixes";
    /// Interwiki prefixes that point back at this wiki.
    pub const LOCAL_INTERWIKIS: &str = "LocalInterwikis";
    /// Enables strict handling of malformed hook handlers.
    pub const DEVELOPMENT_WARNINGS: &str = "DevelopmentWarnings";
    /// Canonical special page name → localized aliases.
    pub const SPECIAL_PAGE_ALIASES: &str = "SpecialPageAliases";
    /// Keep `:` percent-encoded in URLs (for servers that mangle it).
    pub const COLON_ENCODING_BROKEN: &str = "ColonEncodingBroken";
}

/// Read access to named settings.
pub trait Config: Send + Sync {
    /// The raw value of `name`.
    fn get(&self, name: &str) -> Result<&Value, ConfigError>;

    /// Whether `name` is set.
    fn has(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// `name` as a boolean.
    fn get_bool(&self, name: &str) -> Result<bool, ConfigError> {
        self.get(name)?
            .as_bool()
            .ok_or_else(|| type_error(name, "boolean"))
    }

    /// `name` as a string.
    fn get_str(&self, name: &str) -> Result<&str, ConfigError> {
        self.get(name)?
            .as_str()
            .ok_or_else(|| type_error(name, "string"))
    }

    /// `name` as a list of strings.
    fn get_string_list(&self, name: &str) -> Result<Vec<String>, ConfigError> {
        let array = self
            .get(name)?
            .as_array()
            .ok_or_else(|| type_error(name, "array of strings"))?;
        array
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| type_error(name, "array of strings"))
            })
            .collect()
    }

    /// `name` as a table of strings.
    fn get_string_map(&self, name: &str) -> Result<BTreeMap<String, String>, ConfigError> {
        let table = self
            .get(name)?
            .as_table()
            .ok_or_else(|| type_error(name, "table of strings"))?;
        table
            .iter()
            .map(|(k, v)| {
                v.as_str()
                    .map(|s| (k.clone(), s.to_owned()))
                    .ok_or_else(|| type_error(name, "table of strings"))
            })
            .collect()
    }

    /// `name` as a namespace table: integer keys written as strings.
    fn get_namespace_map(&self, name: &str) -> Result<BTreeMap<i32, String>, ConfigError> {
        self.get_string_map(name)?
            .into_iter()
            .map(|(k, v)| {
                k.trim()
                    .parse::<i32>()
                    .map(|index| (index, v))
                    .map_err(|_| type_error(name, "table with integer keys"))
            })
            .collect()
    }
}

fn type_error(name: &str, expected: &'static str) -> ConfigError {
    ConfigError::Type {
        name: name.to_owned(),
        expected,
    }
}

// ============================================================================
// HashConfig
// ============================================================================

/// A [`Config`] backed by an in-memory TOML table.
#[derive(Debug, Clone, PartialEq)]
pub struct HashConfig {
    values: Table,
}

impl HashConfig {
    /// A config holding nothing but MediaWiki's defaults.
    pub fn new() -> Self {
        Self {
            values: defaults(),
        }
    }

    /// A config holding only `values`, without defaults.
    pub fn from_table(values: Table) -> Self {
        Self { values }
    }

    /// Parse `source` and layer it over the defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let overrides: Table =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = Self::new();
        for (name, value) in overrides {
            config.values.insert(name, value);
        }
        Ok(config)
    }

    /// Set `name` (builder form).
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set `name`.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(name.to_owned(), value.into());
    }

    /// Deserialize `name` into any serde type.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, ConfigError> {
        self.get(name)?
            .clone()
            .try_into::<T>()
            .map_err(|e| ConfigError::Parse(format!("{name}: {e}")))
    }
}

impl Default for HashConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for HashConfig {
    fn get(&self, name: &str) -> Result<&Value, ConfigError> {
        self.values
            .get(name)
            .ok_or_else(|| ConfigError::Missing(name.to_owned()))
    }
}

fn defaults() -> Table {
    let mut table = Table::new();
    table.insert(keys::USE_PATH_INFO.into(), Value::Boolean(true));
    table.insert(keys::ARTICLE_PATH.into(), Value::from("/wiki/$1"));
    table.insert(keys::SCRIPT.into(), Value::from("/index.php"));
    table.insert(keys::SERVER.into(), Value::from("http://localhost"));
    table.insert(keys::MAIN_PAGE.into(), Value::from("Main Page"));
    table.insert(keys::CAPITAL_LINKS.into(), Value::Boolean(true));
    table.insert(keys::DISABLE_INTERNAL_SEARCH.into(), Value::Boolean(false));
    table.insert(keys::EXTRA_NAMESPACES.into(), Value::Table(Table::new()));
    table.insert(keys::EXTENSION_NAMESPACES.into(), Value::Table(Table::new()));
    table.insert(keys::INTERWIKI_PREFIXES.into(), Value::Table(Table::new()));
    table.insert(keys::LOCAL_INTERWIKIS.into(), Value::Array(Vec::new()));
    table.insert(keys::DEVELOPMENT_WARNINGS.into(), Value::Boolean(false));
    table.insert(keys::SPECIAL_PAGE_ALIASES.into(), Value::Table(Table::new()));
    table.insert(keys::COLON_ENCODING_BROKEN.into(), Value::Boolean(false));
    table
}
