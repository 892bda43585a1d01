//! # Collaborator traits
//!
//! The core never talks HTTP. It reads request state through [`WebRequest`]
//! and hands decisions to a [`ResponseSink`]; the surrounding web layer
//! provides both.

/// Read-only access to the current request.
pub trait WebRequest {
    /// Fetch a scalar parameter, or `default` when it is not set.
    fn get_string(&self, name: &str, default: &str) -> String;

    /// Whether the named parameter is present, whatever its value.
    fn check(&self, name: &str) -> bool;

    /// HTTP method of the request, upper case.
    fn method(&self) -> &str;

    /// Names of all parameters, except those listed in `exclude`.
    fn value_names(&self, exclude: &[&str]) -> Vec<String>;

    /// Path portion of the request URL, without the query string.
    fn path(&self) -> &str;

    /// The full URL of the request, including scheme, host and query.
    fn full_url(&self) -> String;

    /// Whether the request was a POST.
    fn was_posted(&self) -> bool {
        self.method().eq_ignore_ascii_case("POST")
    }
}

/// Receives the decisions the core produces for a request.
pub trait ResponseSink {
    /// Redirect the client to `url`.
    ///
    /// `max_age` is the shared cache lifetime in seconds, if any.
    fn redirect(&mut self, url: &str, status: u16, max_age: Option<u32>);

    /// Terminate the request with an error page.
    fn error(&mut self, status: u16, message: &str);
}
