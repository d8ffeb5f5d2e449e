//! Application services: scanning, context capture, execution, registry sync.

pub mod context;
pub mod engine;
pub mod registry;
pub mod scan;
