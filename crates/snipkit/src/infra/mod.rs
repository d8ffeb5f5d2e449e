//! Infrastructure adapters for snippet storage, config, and file watching.

pub mod config;
pub mod store;
pub mod watch;
