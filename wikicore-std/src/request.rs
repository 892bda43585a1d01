//! # Requests
//!
//! [`FauxRequest`] is an in-memory [`WebRequest`] for tests and internal
//! sub-requests. [`ArticlePath`] matches request paths against the configured
//! article path to recover the title from path info.

use crate::title::url_decode;
use matchit::Router;
use std::fmt;
use wikicore_core::{ConfigError, WebRequest};

/// Name of the catch-all route parameter holding the title.
const TITLE_PARAM: &str = "title";

// ============================================================================
// ArticlePath
// ============================================================================

/// A compiled article path such as `/wiki/$1`.
pub struct ArticlePath {
    template: String,
    router: Router<()>,
}

impl ArticlePath {
    /// Compile `template`. `$1` must appear once, directly after a `/`, at
    /// the end of the path.
    pub fn new(template: &str) -> Result<Self, ConfigError> {
        let (path, rest) = template
            .split_once("$1")
            .ok_or_else(|| ConfigError::Parse(format!("article path {template} has no $1")))?;
        if !rest.is_empty() || !path.ends_with('/') {
            return Err(ConfigError::Parse(format!(
                "article path {template} cannot be matched against path info"
            )));
        }

        let route = format!("{}{{*{TITLE_PARAM}}}", escape_route(path));
        let mut router = Router::new();
        router
            .insert(route, ())
            .map_err(|e| ConfigError::Parse(format!("article path {template}: {e}")))?;
        Ok(Self {
            template: template.to_owned(),
            router,
        })
    }

    /// The template this path was compiled from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The still-encoded title segment of `path`, if it is an article path.
    pub fn match_path<'p>(&self, path: &'p str) -> Option<&'p str> {
        let matched = self.router.at(path).ok()?;
        matched.params.get(TITLE_PARAM)
    }
}

impl fmt::Debug for ArticlePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArticlePath")
            .field("template", &self.template)
            .finish()
    }
}

fn escape_route(path: &str) -> String {
    path.replace('{', "{{").replace('}', "}}")
}

// ============================================================================
// FauxRequest
// ============================================================================

/// An in-memory request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FauxRequest {
    method: String,
    server: String,
    path: String,
    query: String,
    params: Vec<(String, String)>,
}

impl FauxRequest {
    /// A GET request for `url` (`scheme://host/path?query`). Query values
    /// are decoded the way a web server would.
    pub fn get(url: &str) -> Self {
        let (server, rest) = match url.find("://") {
            Some(scheme_end) => {
                let host_start = scheme_end + 3;
                let path_start = url[host_start..]
                    .find('/')
                    .map_or(url.len(), |i| host_start + i);
                (&url[..path_start], &url[path_start..])
            }
            None => ("", url),
        };
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));

        let params = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_query_part(name), decode_query_part(value))
            })
            .collect();

        Self {
            method: "GET".to_owned(),
            server: server.to_owned(),
            path: if path.is_empty() { "/" } else { path }.to_owned(),
            query: query.to_owned(),
            params,
        }
    }

    /// The same request sent as a POST.
    pub fn posted(mut self) -> Self {
        self.method = "POST".to_owned();
        self
    }

    /// Override the HTTP method.
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.to_ascii_uppercase();
        self
    }
}

fn decode_query_part(part: &str) -> String {
    let spaced = part.replace('+', " ");
    match url_decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

impl WebRequest for FauxRequest {
    fn get_string(&self, name: &str, default: &str) -> String {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map_or_else(|| default.to_owned(), |(_, v)| v.clone())
    }

    fn check(&self, name: &str) -> bool {
        self.params.iter().any(|(n, _)| n == name)
    }

    fn method(&self) -> &str {
        &self.method
    }

    fn value_names(&self, exclude: &[&str]) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for (name, _) in &self.params {
            if !exclude.contains(&name.as_str()) && !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn full_url(&self) -> String {
        if self.query.is_empty() {
            format!("{}{}", self.server, self.path)
        } else {
            format!("{}{}?{}", self.server, self.path, self.query)
        }
    }
}
