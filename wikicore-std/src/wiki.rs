//! # Request entry point
//!
//! [`Wiki`] wires the registries together and takes a request from raw
//! parameters to a decision: which title it names, and whether the client
//! must go elsewhere first.

use crate::{
    config::{Config, keys},
    events,
    hooks::{HookInvoker, HookRegistry, InvocationPolicy, StaticHooks},
    namespace::{NS_MAIN, NamespaceRegistry},
    redirect::{RedirectNormalizer, RedirectRequest},
    request::ArticlePath,
    special::{SEARCH_PAGE, SpecialPageList},
    title::{TitleResolver, TitleSettings, TitleValue, url_decode},
};
use std::sync::Arc;
use tracing::{debug, info};
use wikicore_core::{HookArgs, MalformedTitleError, ResponseSink, WebRequest, WikiError};

/// Status of the error page for malformed titles.
pub const BAD_TITLE_STATUS: u16 = 400;

/// Status of interwiki redirects.
pub const INTERWIKI_STATUS: u16 = 302;

/// What the web layer should do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Show `title`.
    View {
        /// The resolved title.
        title: TitleValue,
    },
    /// Redirect to the canonical URL of `title`.
    Redirect {
        /// The canonical title.
        title: TitleValue,
        /// Absolute target URL.
        url: String,
        /// HTTP status.
        status: u16,
        /// Shared cache lifetime in seconds.
        max_age: u32,
    },
    /// Send the client to another wiki.
    Interwiki {
        /// The interwiki title.
        title: TitleValue,
        /// Absolute URL on the other wiki.
        url: String,
    },
    /// The request named no valid title.
    BadTitle {
        /// `Special:Badtitle`.
        title: TitleValue,
        /// Why the title was rejected.
        error: MalformedTitleError,
    },
}

impl RequestOutcome {
    /// The title the outcome is about.
    pub fn title(&self) -> &TitleValue {
        match self {
            RequestOutcome::View { title }
            | RequestOutcome::Redirect { title, .. }
            | RequestOutcome::Interwiki { title, .. }
            | RequestOutcome::BadTitle { title, .. } => title,
        }
    }

    /// Hand redirects and errors to `sink`. Views write nothing.
    pub fn write_to(&self, sink: &mut dyn ResponseSink) {
        match self {
            RequestOutcome::View { .. } => {}
            RequestOutcome::Redirect {
                url,
                status,
                max_age,
                ..
            } => sink.redirect(url, *status, Some(*max_age)),
            RequestOutcome::Interwiki { url, .. } => sink.redirect(url, INTERWIKI_STATUS, None),
            RequestOutcome::BadTitle { error, .. } => {
                sink.error(BAD_TITLE_STATUS, error.message_key())
            }
        }
    }
}

/// The title named by a request, before hooks run.
struct RequestedTitle {
    parsed: Result<TitleValue, MalformedTitleError>,
    /// Title recovered from path info, as the client sent it.
    from_path: Option<String>,
}

/// The request-processing core of one wiki.
#[derive(Debug)]
pub struct Wiki {
    invoker: Arc<HookInvoker>,
    namespaces: Arc<NamespaceRegistry>,
    resolver: Arc<TitleResolver>,
    special_pages: Arc<SpecialPageList>,
    normalizer: RedirectNormalizer,
    article_path: Option<Arc<ArticlePath>>,
    main_page: String,
    use_path_info: bool,
}

impl Wiki {
    /// Build a wiki over `config`, with handlers from `registry`.
    pub fn new(config: &dyn Config, registry: Arc<HookRegistry>) -> Result<Self, WikiError> {
        let policy =
            InvocationPolicy::from_development_warnings(config.get_bool(keys::DEVELOPMENT_WARNINGS)?);
        let invoker = Arc::new(HookInvoker::new(registry).with_policy(policy));
        Self::with_invoker(config, invoker)
    }

    /// Build a wiki whose handlers come from `#[hook]` registrations only.
    pub fn from_config(config: &dyn Config) -> Result<Self, WikiError> {
        Self::new(config, Arc::new(HookRegistry::new(StaticHooks::collect())))
    }

    /// Build a wiki around an existing invoker.
    pub fn with_invoker(config: &dyn Config, invoker: Arc<HookInvoker>) -> Result<Self, WikiError> {
        let use_path_info = config.get_bool(keys::USE_PATH_INFO)?;
        let article_path = if use_path_info {
            Some(Arc::new(ArticlePath::new(config.get_str(keys::ARTICLE_PATH)?)?))
        } else {
            None
        };

        let namespaces = Arc::new(NamespaceRegistry::from_config(invoker.clone(), config)?);
        let resolver = Arc::new(TitleResolver::new(
            namespaces.clone(),
            TitleSettings::from_config(config)?,
        ));
        let special_pages = Arc::new(SpecialPageList::from_config(invoker.clone(), config)?);
        let normalizer = RedirectNormalizer::new(
            resolver.clone(),
            invoker.clone(),
            special_pages.clone(),
            article_path.clone(),
            use_path_info,
        );

        Ok(Self {
            invoker,
            namespaces,
            resolver,
            special_pages,
            normalizer,
            article_path,
            main_page: config.get_str(keys::MAIN_PAGE)?.to_owned(),
            use_path_info,
        })
    }

    /// The hook invoker.
    pub fn invoker(&self) -> &Arc<HookInvoker> {
        &self.invoker
    }

    /// The hook registry.
    pub fn hooks(&self) -> &Arc<HookRegistry> {
        self.invoker.registry()
    }

    /// The namespace registry.
    pub fn namespaces(&self) -> &Arc<NamespaceRegistry> {
        &self.namespaces
    }

    /// The title resolver.
    pub fn titles(&self) -> &Arc<TitleResolver> {
        &self.resolver
    }

    /// The special page list.
    pub fn special_pages(&self) -> &Arc<SpecialPageList> {
        &self.special_pages
    }

    /// The configured main page.
    pub fn main_page(&self) -> Result<TitleValue, MalformedTitleError> {
        self.resolver.new_from_text(&self.main_page, NS_MAIN)
    }

    /// Resolve the title named by `request`, substituting `Special:Badtitle`
    /// for malformed input.
    pub fn title_for(&self, request: &dyn WebRequest) -> Result<TitleValue, MalformedTitleError> {
        self.requested_title(request).parsed
    }

    fn requested_title(&self, request: &dyn WebRequest) -> RequestedTitle {
        let raw = request.get_string("title", "");
        if !raw.is_empty() {
            return RequestedTitle {
                parsed: self.resolver.new_from_text(&raw, NS_MAIN),
                from_path: None,
            };
        }

        if self.use_path_info && !request.check("title") {
            let segment = self
                .article_path
                .as_ref()
                .and_then(|path| path.match_path(request.path()));
            if let Some(segment) = segment {
                return match url_decode(segment) {
                    Ok(decoded) => RequestedTitle {
                        parsed: self.resolver.new_from_text(&decoded, NS_MAIN),
                        from_path: Some(decoded.into_owned()),
                    },
                    Err(error) => RequestedTitle {
                        parsed: Err(error),
                        from_path: None,
                    },
                };
            }
        }

        let parsed = if request.check("search") {
            Ok(self.special_pages.title_for(SEARCH_PAGE, None))
        } else {
            self.main_page()
        };
        RequestedTitle {
            parsed,
            from_path: None,
        }
    }

    /// Process `request` up to the point where a page would be rendered.
    ///
    /// Fails on redirect loops and on failing hook handlers.
    pub fn perform(&self, request: &dyn WebRequest) -> Result<RequestOutcome, WikiError> {
        let requested = self.requested_title(request);
        let (mut title, bad) = match requested.parsed {
            Ok(title) => (title, None),
            Err(error) => {
                debug!(%error, "malformed title");
                (self.special_pages.badtitle(), Some(error))
            }
        };

        let mut unused = false;
        self.invoker.run(
            events::BEFORE_INITIALIZE,
            &mut HookArgs::new().with(&mut title).with(&mut unused),
        )?;

        if let Some(error) = bad {
            return Ok(RequestOutcome::BadTitle { title, error });
        }
        if title.db_key().is_empty() && !title.is_external() {
            return Ok(RequestOutcome::BadTitle {
                title: self.special_pages.badtitle(),
                error: MalformedTitleError::Empty,
            });
        }

        if title.is_external() {
            let url = self.resolver.full_url(&title, "");
            info!(%title, %url, "interwiki redirect");
            return Ok(RequestOutcome::Interwiki { title, url });
        }

        let mut snapshot = RedirectRequest::from_request(request);
        if let Some(from_path) = requested.from_path {
            snapshot = snapshot.with_title(from_path);
        }
        let decision = self.normalizer.normalize(snapshot, &title)?;
        if decision.should_redirect() {
            return Ok(RequestOutcome::Redirect {
                url: decision.target_url().to_owned(),
                status: decision.http_status(),
                max_age: decision.cache_max_age(),
                title: decision.target().clone(),
            });
        }
        Ok(RequestOutcome::View {
            title: decision.target().clone(),
        })
    }

    /// [`perform`](Self::perform) and write the result to `sink`. Redirect
    /// loops are written as error pages before being returned.
    pub fn respond(
        &self,
        request: &dyn WebRequest,
        sink: &mut dyn ResponseSink,
    ) -> Result<RequestOutcome, WikiError> {
        match self.perform(request) {
            Ok(outcome) => {
                outcome.write_to(sink);
                Ok(outcome)
            }
            Err(WikiError::RedirectLoop(err)) => {
                sink.error(err.status, &err.message);
                Err(WikiError::RedirectLoop(err))
            }
            Err(err) => Err(err),
        }
    }
}
