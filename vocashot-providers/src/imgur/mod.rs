//! Imgur, the legacy keyed host.
//!
//! Multipart upload authenticated with a `Client-ID` header. Filenames are
//! sanitized before they are sent.
//! Limit: 5 MiB by default, overridable with `IMGUR_MAX_SIZE`.

mod host;
pub(crate) mod parser;

pub use host::{ImgurHost, default_endpoints, sanitize_filename};
