//! # Titles
//!
//! - [`TitleValue`]: the immutable namespace + key + fragment + interwiki value
//! - [`TitleResolver`]: parsing user and URL input, formatting titles back
//!   into prefixed text and URLs
//! - [`url_encode`]: percent coding that keeps common path characters readable

mod resolver;
mod url;
mod value;

pub use resolver::{MAX_TITLE_LENGTH, TitleResolver, TitleSettings};
pub use url::{url_decode, url_encode};
pub use value::TitleValue;
