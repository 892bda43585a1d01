//! Parsing raw text into titles, and formatting titles back into text and
//! URLs.

use super::{
    url::{has_percent_escape, url_decode, url_encode},
    value::TitleValue,
};
use crate::{
    config::{Config, keys},
    namespace::{NS_MAIN, NS_SPECIAL, NamespaceRegistry},
};
use std::{collections::BTreeMap, sync::Arc};
use tracing::trace;
use wikicore_core::{ConfigError, MalformedTitleError};

/// Maximum length of a database key in bytes, outside `Special:`.
pub const MAX_TITLE_LENGTH: usize = 255;

/// Characters never allowed in a title, besides control characters.
const ILLEGAL_CHARACTERS: [char; 7] = ['<', '>', '[', ']', '|', '{', '}'];

/// URL and interwiki settings used by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleSettings {
    /// Scheme and host, e.g. `https://wiki.example.org`.
    pub server: String,
    /// Path template for plain page views; `$1` is the title.
    pub article_path: String,
    /// Path of the entry script, used when a query string is needed.
    pub script: String,
    /// Interwiki prefix (lowercase) → URL template.
    pub interwikis: BTreeMap<String, String>,
    /// Interwiki prefixes (lowercase) that point back at this wiki.
    pub local_interwikis: Vec<String>,
    /// Keep `:` encoded in URLs.
    pub colon_encoding_broken: bool,
}

impl Default for TitleSettings {
    fn default() -> Self {
        Self {
            server: "http://localhost".to_owned(),
            article_path: "/wiki/$1".to_owned(),
            script: "/index.php".to_owned(),
            interwikis: BTreeMap::new(),
            local_interwikis: Vec::new(),
            colon_encoding_broken: false,
        }
    }
}

impl TitleSettings {
    /// Read the settings from `config`.
    pub fn from_config(config: &dyn Config) -> Result<Self, ConfigError> {
        Ok(Self {
            server: config.get_str(keys::SERVER)?.to_owned(),
            article_path: config.get_str(keys::ARTICLE_PATH)?.to_owned(),
            script: config.get_str(keys::SCRIPT)?.to_owned(),
            interwikis: config
                .get_string_map(keys::INTERWIKI_PREFIXES)?
                .into_iter()
                .map(|(prefix, url)| (prefix.to_lowercase(), url))
                .collect(),
            local_interwikis: config
                .get_string_list(keys::LOCAL_INTERWIKIS)?
                .iter()
                .map(|prefix| prefix.to_lowercase())
                .collect(),
            colon_encoding_broken: config.get_bool(keys::COLON_ENCODING_BROKEN)?,
        })
    }
}

// ============================================================================
// TitleResolver
// ============================================================================

/// Turns user input into [`TitleValue`]s and titles into display text and
/// URLs.
#[derive(Debug, Clone)]
pub struct TitleResolver {
    namespaces: Arc<NamespaceRegistry>,
    settings: TitleSettings,
}

impl TitleResolver {
    /// Create a resolver.
    pub fn new(namespaces: Arc<NamespaceRegistry>, settings: TitleSettings) -> Self {
        Self {
            namespaces,
            settings,
        }
    }

    /// The namespace registry.
    pub fn namespaces(&self) -> &Arc<NamespaceRegistry> {
        &self.namespaces
    }

    /// The URL settings.
    pub fn settings(&self) -> &TitleSettings {
        &self.settings
    }

    /// Make a title from trusted parts, without validation.
    pub fn make_title(&self, ns: i32, title: &str, fragment: &str, interwiki: &str) -> TitleValue {
        TitleValue::make(ns, title, fragment, interwiki)
    }

    /// Make a title from parts that may come from users. `ns` must be
    /// registered and `title` must pass the same checks as parsed input.
    pub fn make_title_safe(
        &self,
        ns: i32,
        title: &str,
        fragment: &str,
        interwiki: &str,
    ) -> Result<TitleValue, MalformedTitleError> {
        if !self.namespaces.exists(ns) {
            return Err(MalformedTitleError::UnknownNamespace(ns));
        }
        let mut text = String::new();
        if !interwiki.is_empty() {
            text.push_str(interwiki);
            text.push(':');
        }
        match self.namespaces.canonical_name(ns) {
            Some(name) if !name.is_empty() => text.push_str(&name),
            _ => {}
        }
        text.push(':');
        text.push_str(title);
        if !fragment.is_empty() {
            text.push('#');
            text.push_str(fragment);
        }
        self.new_from_text(&text, NS_MAIN)
    }

    /// Parse text as typed by a user or found in a link. Unprefixed titles
    /// land in `default_ns`.
    pub fn new_from_text(
        &self,
        text: &str,
        default_ns: i32,
    ) -> Result<TitleValue, MalformedTitleError> {
        self.split_title(text, default_ns)
    }

    /// Parse the title part of a URL.
    ///
    /// The string is percent-decoded and parsed like
    /// [`new_from_text`](Self::new_from_text) in the main namespace. `+` is a
    /// legal title character and is kept as is.
    pub fn new_from_url(&self, raw: &str) -> Result<TitleValue, MalformedTitleError> {
        let decoded = url_decode(raw)?;
        self.split_title(&decoded, NS_MAIN)
    }

    /// Percent-encode for URLs, honoring `ColonEncodingBroken`.
    pub fn url_encode(&self, s: &str) -> String {
        url_encode(s, self.settings.colon_encoding_broken)
    }

    fn split_title(&self, text: &str, default_ns: i32) -> Result<TitleValue, MalformedTitleError> {
        if text.contains('\0') {
            return Err(MalformedTitleError::NullByte);
        }

        let mut db_key = normalize_key(text);
        let mut fragment = String::new();
        if let Some(pos) = db_key.find('#') {
            fragment = db_key[pos + 1..].replace('_', " ");
            db_key = db_key[..pos].trim_end_matches('_').to_owned();
        }

        let mut namespace = default_ns;
        let mut interwiki = String::new();

        if let Some(rest) = db_key.strip_prefix(':') {
            namespace = NS_MAIN;
            db_key = rest.trim_start_matches('_').to_owned();
        }

        while let Some((prefix, rest)) = split_prefix(&db_key) {
            if let Some(ns) = self.namespaces.canonical_index(&prefix) {
                if self.namespaces.is_talk(ns) && self.starts_with_interwiki(&rest) {
                    return Err(MalformedTitleError::InterwikiTalk);
                }
                namespace = ns;
                db_key = rest;
                break;
            }

            let prefix = prefix.to_lowercase();
            if self.settings.local_interwikis.contains(&prefix) {
                db_key = rest;
                continue;
            }
            if self.settings.interwikis.contains_key(&prefix) {
                interwiki = prefix;
                namespace = NS_MAIN;
                db_key = match rest.strip_prefix(':') {
                    Some(stripped) => stripped.trim_start_matches('_').to_owned(),
                    None => rest,
                };
            }
            break;
        }

        if db_key.starts_with(':') {
            return Err(MalformedTitleError::InvalidCharacters(":".to_owned()));
        }
        if let Some(bad) = db_key
            .chars()
            .find(|c| c.is_control() || ILLEGAL_CHARACTERS.contains(c))
        {
            return Err(MalformedTitleError::InvalidCharacters(bad.to_string()));
        }
        if has_percent_escape(&db_key) {
            return Err(MalformedTitleError::InvalidEncoding);
        }
        if has_html_entity(&db_key) {
            return Err(MalformedTitleError::InvalidCharacters("&".to_owned()));
        }
        if is_relative_path(&db_key) {
            return Err(MalformedTitleError::RelativePath);
        }
        if db_key.contains("~~~") {
            return Err(MalformedTitleError::MagicTilde);
        }
        if namespace != NS_SPECIAL && db_key.len() > MAX_TITLE_LENGTH {
            return Err(MalformedTitleError::TooLong {
                length: db_key.len(),
                max: MAX_TITLE_LENGTH,
            });
        }
        if interwiki.is_empty() && self.namespaces.is_capitalized(namespace) {
            db_key = upper_first(&db_key);
        }
        if db_key.is_empty() && interwiki.is_empty() {
            return Err(MalformedTitleError::Empty);
        }

        trace!(namespace, db_key = %db_key, interwiki = %interwiki, "parsed title");
        Ok(TitleValue::make(namespace, &db_key, &fragment, &interwiki))
    }

    fn starts_with_interwiki(&self, key: &str) -> bool {
        split_prefix(key).is_some_and(|(prefix, _)| {
            self.settings
                .interwikis
                .contains_key(&prefix.to_lowercase())
        })
    }

    // ========================================================================
    // Formatting
    // ========================================================================

    /// The canonical name of `ns`, or `""`.
    pub fn namespace_text(&self, ns: i32) -> String {
        self.namespaces.canonical_name(ns).unwrap_or_default()
    }

    fn prefix(&self, title: &TitleValue, name: &str) -> String {
        let mut prefixed = String::new();
        if title.is_external() {
            prefixed.push_str(title.interwiki());
            prefixed.push(':');
        }
        if title.namespace() != NS_MAIN {
            prefixed.push_str(&self.namespace_text(title.namespace()));
            prefixed.push(':');
        }
        prefixed.push_str(name);
        prefixed
    }

    /// `Namespace:Key` with underscores.
    pub fn prefixed_db_key(&self, title: &TitleValue) -> String {
        self.prefix(title, title.db_key()).replace(' ', "_")
    }

    /// `Namespace:Text` with spaces, for display.
    pub fn prefixed_text(&self, title: &TitleValue) -> String {
        self.prefix(title, title.text()).replace('_', " ")
    }

    /// [`prefixed_text`](Self::prefixed_text) plus `#fragment`.
    pub fn full_text(&self, title: &TitleValue) -> String {
        let mut text = self.prefixed_text(title);
        if title.has_fragment() {
            text.push('#');
            text.push_str(title.fragment());
        }
        text
    }

    /// The prefixed key, percent-encoded for URLs.
    pub fn prefixed_url(&self, title: &TitleValue) -> String {
        self.url_encode(&self.prefixed_db_key(title))
    }

    /// Server-relative URL of `title`. An empty `query` yields the article
    /// path; otherwise the entry script is used.
    ///
    /// Interwiki titles yield the remote URL.
    pub fn local_url(&self, title: &TitleValue, query: &str) -> String {
        if let Some(url) = self.interwiki_url(title, query) {
            return url;
        }
        let key = self.prefixed_url(title);
        if query.is_empty() {
            self.settings.article_path.replace("$1", &key)
        } else {
            format!("{}?title={}&{}", self.settings.script, key, query)
        }
    }

    /// Absolute URL of `title`, including its fragment.
    pub fn full_url(&self, title: &TitleValue, query: &str) -> String {
        let mut url = match self.interwiki_url(title, query) {
            Some(url) => url,
            None => format!("{}{}", self.settings.server, self.local_url(title, query)),
        };
        if title.has_fragment() {
            url.push('#');
            url.push_str(&self.url_encode(&title.fragment().replace(' ', "_")));
        }
        url
    }

    fn interwiki_url(&self, title: &TitleValue, query: &str) -> Option<String> {
        if !title.is_external() {
            return None;
        }
        let template = self.settings.interwikis.get(title.interwiki())?;
        let mut remote = String::new();
        if title.namespace() != NS_MAIN {
            remote.push_str(&self.namespace_text(title.namespace()));
            remote.push(':');
        }
        remote.push_str(title.db_key());

        let mut url = template.replace("$1", &self.url_encode(&remote));
        if !query.is_empty() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(query);
        }
        Some(url)
    }
}

/// Spaces and underscores (and other non-control whitespace) collapse into
/// single underscores, trimmed from both ends.
fn normalize_key(text: &str) -> String {
    let mut key = String::with_capacity(text.len());
    let mut pending = false;
    for c in text.chars() {
        if c == '_' || (c.is_whitespace() && !c.is_control()) {
            pending = true;
            continue;
        }
        if pending && !key.is_empty() {
            key.push('_');
        }
        pending = false;
        key.push(c);
    }
    key
}

/// Split `Prefix:rest`, trimming underscores around the colon.
fn split_prefix(key: &str) -> Option<(String, String)> {
    let (prefix, rest) = key.split_once(':')?;
    let prefix = prefix.trim_end_matches('_');
    if prefix.is_empty() {
        return None;
    }
    Some((prefix.to_owned(), rest.trim_start_matches('_').to_owned()))
}

fn is_relative_path(key: &str) -> bool {
    key == "."
        || key == ".."
        || key.starts_with("./")
        || key.starts_with("../")
        || key.contains("/./")
        || key.contains("/../")
        || key.ends_with("/.")
        || key.ends_with("/..")
}

fn has_html_entity(key: &str) -> bool {
    key.match_indices('&').any(|(start, _)| {
        let tail = &key[start + 1..];
        match tail.find(';') {
            Some(end) => {
                end > 0
                    && tail[..end]
                        .chars()
                        .all(|c| c.is_alphanumeric() || c == '#')
            }
            None => false,
        }
    })
}

fn upper_first(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        hooks::{HookInvoker, HookRegistry, RuntimeMode, StaticHooks},
        namespace::{NS_HELP, NS_TALK, NS_TEMPLATE, NS_USER, NS_USER_TALK},
    };

    fn resolver_with(settings: TitleSettings, capital_links: bool) -> TitleResolver {
        let registry = HookRegistry::with_mode(StaticHooks::default(), RuntimeMode::Test);
        let invoker = Arc::new(HookInvoker::new(Arc::new(registry)));
        let namespaces = NamespaceRegistry::new(invoker).with_capital_links(capital_links);
        TitleResolver::new(Arc::new(namespaces), settings)
    }

    fn resolver() -> TitleResolver {
        let mut settings = TitleSettings::default();
        settings.interwikis.insert(
            "wikipedia".to_owned(),
            "https://en.wikipedia.org/wiki/$1".to_owned(),
        );
        settings.local_interwikis.push("local".to_owned());
        resolver_with(settings, true)
    }

    #[test]
    fn test_whitespace_normalization() {
        let r = resolver();
        let title = r.new_from_text("  Foo __ bar_  ", NS_MAIN).unwrap();
        assert_eq!(title.db_key(), "Foo_bar");
        assert_eq!(title.text(), "Foo bar");

        let title = r.new_from_text("Foo\u{3000}bar", NS_MAIN).unwrap();
        assert_eq!(title.db_key(), "Foo_bar");
    }

    #[test]
    fn test_namespace_prefix() {
        let r = resolver();
        let title = r.new_from_text("user talk : foo", NS_MAIN).unwrap();
        assert_eq!(title.namespace(), NS_USER_TALK);
        assert_eq!(title.db_key(), "Foo");

        let title = r.new_from_text("Image:Foo.png", NS_MAIN).unwrap();
        assert_eq!(title.namespace(), crate::namespace::NS_FILE);

        let title = r.new_from_text("NotANamespace:Foo", NS_MAIN).unwrap();
        assert_eq!(title.namespace(), NS_MAIN);
        assert_eq!(title.db_key(), "NotANamespace:Foo");
    }

    #[test]
    fn test_leading_colon_resets_default_namespace() {
        let r = resolver();
        let title = r.new_from_text(":Foo", NS_TEMPLATE).unwrap();
        assert_eq!(title.namespace(), NS_MAIN);
        let title = r.new_from_text("Foo", NS_TEMPLATE).unwrap();
        assert_eq!(title.namespace(), NS_TEMPLATE);
        let title = r.new_from_text(":Help:Foo", NS_TEMPLATE).unwrap();
        assert_eq!(title.namespace(), NS_HELP);
    }

    #[test]
    fn test_fragment() {
        let r = resolver();
        let title = r.new_from_text("Help:Foo#Bar_baz", NS_MAIN).unwrap();
        assert_eq!(title.db_key(), "Foo");
        assert_eq!(title.fragment(), "Bar baz");
        assert_eq!(r.full_text(&title), "Help:Foo#Bar baz");
    }

    #[test]
    fn test_interwiki() {
        let r = resolver();
        let title = r.new_from_text("Wikipedia:foo bar", NS_MAIN).unwrap();
        assert_eq!(title.interwiki(), "wikipedia");
        assert_eq!(title.db_key(), "foo_bar");
        assert_eq!(
            r.full_url(&title, ""),
            "https://en.wikipedia.org/wiki/foo_bar"
        );

        let title = r.new_from_text("local:Help:Foo", NS_MAIN).unwrap();
        assert!(!title.is_external());
        assert_eq!(title.namespace(), NS_HELP);

        assert_eq!(
            r.new_from_text("Talk:wikipedia:Foo", NS_MAIN).unwrap_err(),
            MalformedTitleError::InterwikiTalk
        );
    }

    #[test]
    fn test_capitalization() {
        let r = resolver();
        assert_eq!(r.new_from_text("foo", NS_MAIN).unwrap().db_key(), "Foo");
        assert_eq!(r.new_from_text("éclair", NS_MAIN).unwrap().db_key(), "Éclair");

        let r = resolver_with(TitleSettings::default(), false);
        assert_eq!(r.new_from_text("foo", NS_MAIN).unwrap().db_key(), "foo");
        assert_eq!(r.new_from_text("User:foo", NS_MAIN).unwrap().db_key(), "Foo");
    }

    #[test]
    fn test_rejections() {
        let r = resolver();
        let cases: [(&str, MalformedTitleError); 10] = [
            ("", MalformedTitleError::Empty),
            ("Help:", MalformedTitleError::Empty),
            ("#Section", MalformedTitleError::Empty),
            ("Foo\0bar", MalformedTitleError::NullByte),
            ("Foo<bar>", MalformedTitleError::InvalidCharacters("<".into())),
            ("Foo%41", MalformedTitleError::InvalidEncoding),
            ("Foo&amp;bar", MalformedTitleError::InvalidCharacters("&".into())),
            ("../Foo", MalformedTitleError::RelativePath),
            ("Foo/./bar", MalformedTitleError::RelativePath),
            ("Foo~~~", MalformedTitleError::MagicTilde),
        ];
        for (text, expected) in cases {
            assert_eq!(r.new_from_text(text, NS_MAIN).unwrap_err(), expected, "{text:?}");
        }
        assert!(r.new_from_text("Foo & bar", NS_MAIN).is_ok());
        assert!(r.new_from_text("Foo/..", NS_MAIN).is_err());
        assert!(r.new_from_text("Talk::Foo", NS_MAIN).is_err());
    }

    #[test]
    fn test_length_limit() {
        let r = resolver();
        let long = "A".repeat(MAX_TITLE_LENGTH + 1);
        assert_eq!(
            r.new_from_text(&long, NS_MAIN).unwrap_err(),
            MalformedTitleError::TooLong {
                length: MAX_TITLE_LENGTH + 1,
                max: MAX_TITLE_LENGTH
            }
        );
        assert!(r.new_from_text(&"A".repeat(MAX_TITLE_LENGTH), NS_MAIN).is_ok());
        assert!(r.new_from_text(&format!("Special:{long}"), NS_MAIN).is_ok());
    }

    #[test]
    fn test_new_from_url() {
        let r = resolver();
        let title = r.new_from_url("User_talk:Foo%20bar%2Fbaz").unwrap();
        assert_eq!(title.namespace(), NS_USER_TALK);
        assert_eq!(title.db_key(), "Foo_bar/baz");
        assert_eq!(r.new_from_url("C++").unwrap().db_key(), "C++");
        assert_eq!(r.new_from_url("C%2B%2B").unwrap().db_key(), "C++");

        assert_eq!(
            r.new_from_url("Foo%00").unwrap_err(),
            MalformedTitleError::NullByte
        );
        assert_eq!(
            r.new_from_url("Foo%2541").unwrap_err(),
            MalformedTitleError::InvalidEncoding
        );
    }

    #[test]
    fn test_new_from_url_is_idempotent_over_prefixed_url() {
        let r = resolver();
        for text in [
            "Main Page",
            "Help:Café & co?",
            "User talk:A/b (c), d!",
            "Talk:100% sure",
            "Special:Search/a+b",
        ] {
            let title = r.new_from_text(text, NS_MAIN).unwrap();
            let again = r.new_from_url(&r.prefixed_url(&title)).unwrap();
            assert_eq!(again, title, "{text}");
        }
    }

    #[test]
    fn test_make_title_safe() {
        let r = resolver();
        let title = r.make_title_safe(NS_TALK, "foo bar", "Sec", "").unwrap();
        assert_eq!(title.namespace(), NS_TALK);
        assert_eq!(title.db_key(), "Foo_bar");
        assert_eq!(title.fragment(), "Sec");

        let title = r.make_title_safe(NS_MAIN, "Help:Foo", "", "").unwrap();
        assert_eq!(title.namespace(), NS_HELP);

        assert_eq!(
            r.make_title_safe(5000, "Foo", "", "").unwrap_err(),
            MalformedTitleError::UnknownNamespace(5000)
        );
        assert!(r.make_title_safe(NS_USER, "Foo|bar", "", "").is_err());
    }

    #[test]
    fn test_formatting() {
        let r = resolver();
        let title = r.make_title(NS_USER_TALK, "Foo bar", "Sec two", "");
        assert_eq!(r.prefixed_db_key(&title), "User_talk:Foo_bar");
        assert_eq!(r.prefixed_text(&title), "User talk:Foo bar");
        assert_eq!(r.prefixed_url(&title), "User_talk:Foo_bar");
        assert_eq!(r.local_url(&title, ""), "/wiki/User_talk:Foo_bar");
        assert_eq!(
            r.local_url(&title, "action=edit"),
            "/index.php?title=User_talk:Foo_bar&action=edit"
        );
        assert_eq!(
            r.full_url(&title, ""),
            "http://localhost/wiki/User_talk:Foo_bar#Sec_two"
        );

        let main = r.make_title(NS_MAIN, "A&B", "", "");
        assert_eq!(r.prefixed_url(&main), "A%26B");
    }

    #[test]
    fn test_colon_encoding_broken() {
        let settings = TitleSettings {
            colon_encoding_broken: true,
            ..TitleSettings::default()
        };
        let r = resolver_with(settings, true);
        let title = r.make_title(NS_HELP, "Foo", "", "");
        assert_eq!(r.local_url(&title, ""), "/wiki/Help%3AFoo");
        assert_eq!(r.new_from_url("Help%3AFoo").unwrap(), title);
    }
}
