//! Domain-specific errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnippetError {
    #[error("failed to compile {}: {message}", path.display())]
    Compile { path: PathBuf, message: String },
    #[error("snippet {} raised: {message}", path.display())]
    Script { path: PathBuf, message: String },
    #[error("command registration failed for {name}: {message}")]
    Registration { name: String, message: String },
}
