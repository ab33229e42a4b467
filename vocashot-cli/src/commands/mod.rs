//! CLI command implementations.

pub mod check;
pub mod config;
pub mod providers;
pub mod upload;
