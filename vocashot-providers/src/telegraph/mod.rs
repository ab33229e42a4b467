//! Telegraph, the keyless community host.
//!
//! Multipart upload with a single `file` field. The response is a JSON array
//! of relative paths which are joined onto the public base.
//! Limit: 5 MiB.

mod host;
pub(crate) mod parser;

pub use host::{TelegraphHost, default_endpoints};
