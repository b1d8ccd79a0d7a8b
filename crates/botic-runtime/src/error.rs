//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use botic_core::TransportError;

/// Errors surfaced by the runtime layer.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Loading or validating configuration failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The transport failed to connect or close.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
