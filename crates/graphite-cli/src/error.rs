//! CLI error types.

use graphite_render::RenderError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Building the client or fetching from the render endpoint failed.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
