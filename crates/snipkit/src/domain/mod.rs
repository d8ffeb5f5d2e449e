//! Domain models: snippet records, command names, key sequences, errors.

pub mod errors;
pub mod keyseq;
pub mod model;
