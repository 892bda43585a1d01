//! # Canonical redirects
//!
//! A page can be reached through many equivalent URLs: `/wiki/foo`,
//! `/wiki/Foo%20bar`, `/index.php?title=Foo_bar`, a localized special page
//! alias. [`RedirectNormalizer`] decides whether a request should be sent to
//! the single canonical URL of its title, and refuses to redirect when doing
//! so would loop.
//!
//! The decision runs through these checks, in order:
//!
//! 1. `TestCanonicalRedirect` hook: any handler may veto, or rewrite the title
//! 2. Method: only plain views (GET, `action=view`, no extra parameters)
//! 3. Match: a request already naming the canonical key is left alone
//! 4. Build: special page aliases are resolved and the full URL computed
//! 5. Loop guard: the target must differ from the request URL and be a fixed
//!    point of the same procedure

use crate::{
    events,
    hooks::HookInvoker,
    request::ArticlePath,
    special::SpecialPageList,
    title::{TitleResolver, TitleValue},
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use wikicore_core::{HookArgs, MalformedTitleError, RedirectLoopError, WebRequest, WikiError};

/// Status of a canonical redirect.
pub const REDIRECT_STATUS: u16 = 301;

/// Shared cache lifetime of a canonical redirect, in seconds.
pub const REDIRECT_MAX_AGE: u32 = 1200;

/// Status of a redirect loop error page.
pub const LOOP_STATUS: u16 = 500;

const LOOP_PREAMBLE: &str = "Redirect loop detected!\n\n\
    This means the wiki got confused about what page was requested; this \
    sometimes happens when moving a wiki to a new server or changing the \
    server configuration.\n\n";

const LOOP_HINT_PATH_INFO: &str = "The wiki is trying to interpret the page title from the \
    URL path portion (PATH_INFO), which sometimes fails depending on the web server. Try \
    setting \"$wgUsePathInfo = false;\" in your LocalSettings.php, or check that \
    $wgArticlePath is correct.";

const LOOP_HINT_NO_PATH_INFO: &str = "Your web server was detected as possibly not \
    supporting URL path components (PATH_INFO) correctly; check your LocalSettings.php for \
    a customized $wgArticlePath setting and/or toggle $wgUsePathInfo to true.";

/// The diagnostic shown when a redirect would loop.
pub fn loop_message(use_path_info: bool) -> String {
    let hint = if use_path_info {
        LOOP_HINT_PATH_INFO
    } else {
        LOOP_HINT_NO_PATH_INFO
    };
    format!("{LOOP_PREAMBLE}{hint}")
}

// ============================================================================
// RedirectRequest
// ============================================================================

/// The parts of a request the normalizer looks at.
///
/// Passed to `TestCanonicalRedirect` handlers by mutable reference, so a
/// handler may also adjust what the later checks see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectRequest {
    /// HTTP method, upper case.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// The requested title as sent, if any.
    pub title: Option<String>,
    /// The `action` parameter, `view` when absent.
    pub action: String,
    /// Parameter names other than `title` and `action`.
    pub extra_params: Vec<String>,
}

impl RedirectRequest {
    /// Snapshot `request`.
    pub fn from_request(request: &dyn WebRequest) -> Self {
        Self {
            method: request.method().to_ascii_uppercase(),
            url: request.full_url(),
            title: request
                .check("title")
                .then(|| request.get_string("title", "")),
            action: request.get_string("action", "view"),
            extra_params: request.value_names(&["action", "title"]),
        }
    }

    /// Set the requested title, e.g. one recovered from path info.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Whether the request was a POST.
    pub fn was_posted(&self) -> bool {
        self.method == "POST"
    }

    /// Whether this is a plain page view that may be redirected.
    pub fn is_plain_view(&self) -> bool {
        self.action == "view" && !self.was_posted() && self.extra_params.is_empty()
    }
}

// ============================================================================
// RedirectDecision
// ============================================================================

/// Why no redirect was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoRedirectReason {
    /// A `TestCanonicalRedirect` handler returned `false`.
    Vetoed,
    /// Not a plain GET view.
    NotAView,
    /// The request already names the canonical title.
    AlreadyCanonical,
}

/// The outcome of canonicalization for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectDecision {
    target: TitleValue,
    target_url: String,
    reason: Option<NoRedirectReason>,
}

impl RedirectDecision {
    fn redirect(target: TitleValue, target_url: String) -> Self {
        Self {
            target,
            target_url,
            reason: None,
        }
    }

    fn stay(target: TitleValue, reason: NoRedirectReason) -> Self {
        Self {
            target,
            target_url: String::new(),
            reason: Some(reason),
        }
    }

    /// Whether the client must be redirected.
    pub fn should_redirect(&self) -> bool {
        self.reason.is_none()
    }

    /// The title the request resolves to, after any handler rewrite.
    pub fn target(&self) -> &TitleValue {
        &self.target
    }

    /// Absolute URL to redirect to; empty when not redirecting.
    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    /// HTTP status of the redirect.
    pub fn http_status(&self) -> u16 {
        REDIRECT_STATUS
    }

    /// Shared cache lifetime of the redirect, in seconds.
    pub fn cache_max_age(&self) -> u32 {
        REDIRECT_MAX_AGE
    }

    /// Why no redirect is issued, if none is.
    pub fn reason(&self) -> Option<NoRedirectReason> {
        self.reason
    }
}

// ============================================================================
// RedirectNormalizer
// ============================================================================

/// Decides canonical redirects.
#[derive(Debug)]
pub struct RedirectNormalizer {
    resolver: Arc<TitleResolver>,
    invoker: Arc<HookInvoker>,
    special_pages: Arc<SpecialPageList>,
    article_path: Option<Arc<ArticlePath>>,
    use_path_info: bool,
}

impl RedirectNormalizer {
    /// Create a normalizer.
    ///
    /// `article_path` is used to read titles back out of target URLs when
    /// checking for loops; without it target URLs are not re-parsed.
    pub fn new(
        resolver: Arc<TitleResolver>,
        invoker: Arc<HookInvoker>,
        special_pages: Arc<SpecialPageList>,
        article_path: Option<Arc<ArticlePath>>,
        use_path_info: bool,
    ) -> Self {
        Self {
            resolver,
            invoker,
            special_pages,
            article_path,
            use_path_info,
        }
    }

    /// Decide whether `request`, resolved to `title`, must be redirected.
    ///
    /// Fails with [`WikiError::RedirectLoop`] when the redirect would point
    /// back at the request or would itself be redirected elsewhere, and with
    /// [`WikiError::Hook`] when a handler fails.
    pub fn normalize(
        &self,
        request: RedirectRequest,
        title: &TitleValue,
    ) -> Result<RedirectDecision, WikiError> {
        let mut request = request;
        let mut title = title.clone();

        if !self.run_hook(&mut request, &mut title)? {
            debug!(%title, "canonical redirect vetoed");
            return Ok(RedirectDecision::stay(title, NoRedirectReason::Vetoed));
        }
        if !request.is_plain_view() {
            return Ok(RedirectDecision::stay(title, NoRedirectReason::NotAView));
        }
        // Special page aliases are not canonical even when typed exactly.
        let target = self.resolve_special(&title);
        let canonical_key = self.resolver.prefixed_db_key(&target);
        if request.title.as_deref() == Some(canonical_key.as_str()) {
            return Ok(RedirectDecision::stay(target, NoRedirectReason::AlreadyCanonical));
        }

        let target_url = self.resolver.full_url(&target, "");

        if target_url == request.url {
            return Err(self.loop_error(target_url).into());
        }
        if !self.is_fixpoint(&target, &target_url)? {
            return Err(self.loop_error(target_url).into());
        }

        info!(from = %request.url, to = %target_url, "canonical redirect");
        Ok(RedirectDecision::redirect(target, target_url))
    }

    fn run_hook(
        &self,
        request: &mut RedirectRequest,
        title: &mut TitleValue,
    ) -> Result<bool, WikiError> {
        let proceed = self.invoker.run(
            events::TEST_CANONICAL_REDIRECT,
            &mut HookArgs::new().with(request).with(title),
        )?;
        Ok(proceed)
    }

    fn resolve_special(&self, title: &TitleValue) -> TitleValue {
        if !title.is_special_page() {
            return title.clone();
        }
        match self.special_pages.resolve_alias(title.db_key()) {
            Some((name, subpage)) => {
                let mut target = self.special_pages.title_for(&name, subpage.as_deref());
                if title.has_fragment() {
                    target = target.create_fragment_target(title.fragment());
                }
                target
            }
            None => title.clone(),
        }
    }

    /// Replay the decision for a request of `target_url`: it must settle on
    /// `target` again.
    fn is_fixpoint(&self, target: &TitleValue, target_url: &str) -> Result<bool, WikiError> {
        let mut replayed = match self.title_from_url(target_url) {
            Some(Ok(title)) => title,
            Some(Err(err)) => {
                warn!(url = target_url, error = %err, "canonical URL does not parse back");
                return Ok(false);
            }
            None => target.clone(),
        };
        if target.has_fragment() {
            replayed = replayed.create_fragment_target(target.fragment());
        }

        let mut request = RedirectRequest {
            method: "GET".to_owned(),
            url: target_url.to_owned(),
            title: Some(self.resolver.prefixed_db_key(target)),
            action: "view".to_owned(),
            extra_params: Vec::new(),
        };
        if !self.run_hook(&mut request, &mut replayed)? {
            return Ok(true);
        }
        Ok(self.resolve_special(&replayed) == *target)
    }

    fn title_from_url(&self, url: &str) -> Option<Result<TitleValue, MalformedTitleError>> {
        let article_path = self.article_path.as_ref()?;
        let server = &self.resolver.settings().server;
        let path = url.strip_prefix(server.as_str())?;
        let path = path.split_once('#').map_or(path, |(path, _)| path);
        let segment = article_path.match_path(path)?;
        Some(self.resolver.new_from_url(segment))
    }

    fn loop_error(&self, target_url: String) -> RedirectLoopError {
        warn!(url = %target_url, "redirect loop detected");
        RedirectLoopError {
            status: LOOP_STATUS,
            target_url,
            message: loop_message(self.use_path_info),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        namespace::{NS_MAIN, NamespaceRegistry},
        request::FauxRequest,
        testing::test_invoker,
        title::TitleSettings,
    };
    use std::collections::BTreeMap;
    use wikicore_core::{BoxError, Handler};

    struct Fixture {
        invoker: Arc<HookInvoker>,
        resolver: Arc<TitleResolver>,
        normalizer: RedirectNormalizer,
    }

    fn fixture(use_path_info: bool) -> Fixture {
        let invoker = test_invoker();
        let namespaces = Arc::new(NamespaceRegistry::new(invoker.clone()));
        let resolver = Arc::new(TitleResolver::new(namespaces, TitleSettings::default()));
        let aliases = BTreeMap::from([("Userlogin".to_owned(), vec!["Login".to_owned()])]);
        let special = Arc::new(SpecialPageList::new(invoker.clone()).with_aliases(aliases));
        let article_path = ArticlePath::new("/wiki/$1").ok().map(Arc::new);
        let normalizer = RedirectNormalizer::new(
            resolver.clone(),
            invoker.clone(),
            special,
            article_path,
            use_path_info,
        );
        Fixture {
            invoker,
            resolver,
            normalizer,
        }
    }

    fn decide(fx: &Fixture, url: &str) -> Result<RedirectDecision, WikiError> {
        let request = FauxRequest::get(url);
        let raw = request.get_string("title", "");
        let title = fx.resolver.new_from_text(&raw, NS_MAIN).unwrap();
        fx.normalizer
            .normalize(RedirectRequest::from_request(&request), &title)
    }

    #[test]
    fn test_noncanonical_title_redirects() {
        let fx = fixture(true);
        let decision = decide(&fx, "http://localhost/index.php?title=foo_bar").unwrap();
        assert!(decision.should_redirect());
        assert_eq!(decision.target_url(), "http://localhost/wiki/Foo_bar");
        assert_eq!(decision.http_status(), 301);
        assert_eq!(decision.cache_max_age(), 1200);
    }

    #[test]
    fn test_canonical_title_stays() {
        let fx = fixture(true);
        let decision = decide(&fx, "http://localhost/index.php?title=Foo_bar").unwrap();
        assert!(!decision.should_redirect());
        assert_eq!(decision.reason(), Some(NoRedirectReason::AlreadyCanonical));
    }

    #[test]
    fn test_non_views_are_not_redirected() {
        let fx = fixture(true);
        for url in [
            "http://localhost/index.php?title=foo&action=edit",
            "http://localhost/index.php?title=foo&oldid=12",
        ] {
            let decision = decide(&fx, url).unwrap();
            assert_eq!(decision.reason(), Some(NoRedirectReason::NotAView), "{url}");
        }

        let request = FauxRequest::get("http://localhost/index.php?title=foo").posted();
        let title = fx.resolver.new_from_text("foo", NS_MAIN).unwrap();
        let decision = fx
            .normalizer
            .normalize(RedirectRequest::from_request(&request), &title)
            .unwrap();
        assert_eq!(decision.reason(), Some(NoRedirectReason::NotAView));
    }

    #[test]
    fn test_veto() {
        let fx = fixture(true);
        fx.invoker.registry().register(
            events::TEST_CANONICAL_REDIRECT,
            Handler::plain(|_: &mut HookArgs<'_>| false),
        );
        let decision = decide(&fx, "http://localhost/index.php?title=foo").unwrap();
        assert_eq!(decision.reason(), Some(NoRedirectReason::Vetoed));
        assert_eq!(decision.target().db_key(), "Foo");
    }

    #[test]
    fn test_special_alias_is_resolved() {
        let fx = fixture(true);
        let decision = decide(&fx, "http://localhost/index.php?title=Special:login/x").unwrap();
        assert!(decision.should_redirect());
        assert_eq!(decision.target().db_key(), "Userlogin/x");
        assert_eq!(
            decision.target_url(),
            "http://localhost/wiki/Special:Userlogin/x"
        );

        let decision = decide(&fx, "http://localhost/index.php?title=Special:Login").unwrap();
        assert_eq!(decision.target().db_key(), "Userlogin");
        assert!(decision.should_redirect());

        let decision = decide(&fx, "http://localhost/index.php?title=Special:Userlogin").unwrap();
        assert_eq!(decision.reason(), Some(NoRedirectReason::AlreadyCanonical));
    }

    #[test]
    fn test_target_equal_to_request_is_a_loop() {
        let fx = fixture(true);
        // The server hands over a title that differs from the path.
        let request = FauxRequest::get("http://localhost/wiki/Foo");
        let title = fx.resolver.new_from_text("Foo", NS_MAIN).unwrap();
        let err = fx
            .normalizer
            .normalize(
                RedirectRequest::from_request(&request).with_title("Foo_"),
                &title,
            )
            .unwrap_err();
        match err {
            WikiError::RedirectLoop(err) => {
                assert_eq!(err.status, 500);
                assert_eq!(err.target_url, "http://localhost/wiki/Foo");
                assert!(err.message.starts_with("Redirect loop detected!"));
                assert!(err.message.contains("(PATH_INFO), which sometimes fails"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rewriting_cycle_is_a_loop() {
        let fx = fixture(false);
        fx.invoker.registry().register(
            events::TEST_CANONICAL_REDIRECT,
            Handler::plain(|args: &mut HookArgs<'_>| {
                let title = args.get_mut::<TitleValue>(1)?;
                let flipped = if title.db_key() == "A" { "B" } else { "A" };
                *title = TitleValue::make(title.namespace(), flipped, "", "");
                Ok::<_, BoxError>(true)
            }),
        );

        let err = decide(&fx, "http://localhost/index.php?title=A").unwrap_err();
        match err {
            WikiError::RedirectLoop(err) => {
                assert_eq!(err.target_url, "http://localhost/wiki/B");
                assert!(err.message.contains("toggle $wgUsePathInfo to true"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_hook_sees_request_and_title() {
        let fx = fixture(true);
        fx.invoker.registry().register(
            events::TEST_CANONICAL_REDIRECT,
            Handler::plain(|args: &mut HookArgs<'_>| {
                let (request, title) = args.pair_mut::<RedirectRequest, TitleValue>(0, 1)?;
                Ok::<_, BoxError>(!(request.url.contains("keep=") || title.db_key() == "Legacy"))
            }),
        );
        let decision = decide(&fx, "http://localhost/index.php?title=legacy").unwrap();
        assert_eq!(decision.reason(), Some(NoRedirectReason::Vetoed));
        assert!(decide(&fx, "http://localhost/index.php?title=other")
            .unwrap()
            .should_redirect());
    }

    #[test]
    fn test_loop_messages() {
        assert!(loop_message(true).contains("$wgUsePathInfo = false;"));
        assert!(loop_message(false).contains("toggle $wgUsePathInfo to true."));
        assert!(loop_message(false).starts_with(LOOP_PREAMBLE));
    }
}
