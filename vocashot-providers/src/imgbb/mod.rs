//! ImgBB, the credentialed primary host.
//!
//! Uploads are form POSTs carrying the API key and a base64 payload.
//! Limit: 32 MiB.

mod host;
pub(crate) mod parser;

pub use host::{ImgBBHost, default_endpoints};
