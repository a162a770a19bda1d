//! Common error types for Sophono

use thiserror::Error;

/// Common result type for Sophono operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the shared configuration layer
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
