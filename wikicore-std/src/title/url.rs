//! Percent coding for titles in URLs.

use std::borrow::Cow;
use wikicore_core::MalformedTitleError;

/// Escapes restored to literal characters after encoding. Browsers and
/// servers handle these fine in paths, and they keep URLs readable.
const RESTORED: [(&str, &str); 10] = [
    ("%3B", ";"),
    ("%40", "@"),
    ("%24", "$"),
    ("%21", "!"),
    ("%2A", "*"),
    ("%28", "("),
    ("%29", ")"),
    ("%2C", ","),
    ("%2F", "/"),
    ("%7E", "~"),
];

/// Percent-encode `s` for use in a URL path or query, leaving
/// `;@$!*(),/~` and `:` readable.
///
/// Set `colon_encoding_broken` for servers that mangle a literal `:` in
/// paths; it then stays encoded.
pub fn url_encode(s: &str, colon_encoding_broken: bool) -> String {
    let mut encoded = urlencoding::encode(s).into_owned();
    for (escape, literal) in RESTORED {
        if encoded.contains(escape) {
            encoded = encoded.replace(escape, literal);
        }
    }
    if !colon_encoding_broken {
        encoded = encoded.replace("%3A", ":");
    }
    encoded
}

/// Percent-decode `s`. Invalid UTF-8 after decoding is an error.
pub fn url_decode(s: &str) -> Result<Cow<'_, str>, MalformedTitleError> {
    urlencoding::decode(s).map_err(|_| MalformedTitleError::InvalidEncoding)
}

/// Whether `s` still contains a `%XX` escape.
pub(crate) fn has_percent_escape(s: &str) -> bool {
    s.as_bytes()
        .windows(3)
        .any(|w| w[0] == b'%' && w[1].is_ascii_hexdigit() && w[2].is_ascii_hexdigit())
}
