//! Runtime error types.

use mirai_core::ApiError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while starting or running a bot.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Connecting or talking to the server failed.
    #[error("Connection error: {0}")]
    Api(#[from] ApiError),

    /// The logging subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    /// Waiting for the shutdown signal failed.
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
