//! Runtime adapters for tabstage (configuration, caching, shared utilities).

pub mod cache;
pub mod config;
pub mod util;
