//! Error types.

use thiserror::Error;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by this crate.
///
/// Untrusted tokens never produce an `Error`; see [`crate::Rejected`].
#[derive(Debug, Error)]
pub enum Error {
    /// Signing secret or other start-up configuration is missing or unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller-supplied values (claims, cookie options) failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// jsonwebtoken error while signing.
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Unable to read a configuration file.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML.
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}
