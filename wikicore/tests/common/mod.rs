#![allow(dead_code)]

use std::sync::Arc;
use wikicore::{
    HashConfig, HookInvoker, RequestOutcome, Wiki, WikiError,
    request::FauxRequest,
    testing::{RecordingSink, SinkEvent, test_invoker},
};

// ============================================================================
// Wiki Fixtures
// ============================================================================

pub struct TestWiki {
    pub wiki: Wiki,
    pub invoker: Arc<HookInvoker>,
}

impl TestWiki {
    pub fn new(config: &HashConfig) -> Self {
        let invoker = test_invoker();
        let wiki = Wiki::with_invoker(config, invoker.clone()).unwrap();
        Self { wiki, invoker }
    }

    pub fn with_defaults() -> Self {
        Self::new(&HashConfig::new())
    }

    /// Run a GET of `url` and return the outcome and everything written.
    pub fn get(&self, url: &str) -> (Result<RequestOutcome, WikiError>, Vec<SinkEvent>) {
        self.send(&FauxRequest::get(url))
    }

    pub fn send(&self, request: &FauxRequest) -> (Result<RequestOutcome, WikiError>, Vec<SinkEvent>) {
        let mut sink = RecordingSink::new();
        let outcome = self.wiki.respond(request, &mut sink);
        (outcome, sink.events().to_vec())
    }
}

pub fn config_from(source: &str) -> HashConfig {
    HashConfig::from_toml_str(source).unwrap()
}
