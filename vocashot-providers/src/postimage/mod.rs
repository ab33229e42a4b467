//! PostImage, the second keyless community host.
//!
//! Anonymous multipart upload to the landing page. There is no JSON API,
//! so the direct link is scraped out of the returned HTML.
//! Limit: 24 MiB.

mod host;
pub(crate) mod parser;

pub use host::{PostImageHost, default_endpoints};
