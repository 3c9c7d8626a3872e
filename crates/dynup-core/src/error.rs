//! Error types for the updater.
//!
//! Every terminal failure of a run is one of these variants; the binary
//! maps each class to a distinct process exit code.

use thiserror::Error;

/// Result type alias for updater operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the updater
#[derive(Error, Debug)]
pub enum Error {
    /// Settings document missing/malformed, or validation failed
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller-supplied IP is invalid or violates the address-family policy
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Failures talking to the public-IP discovery service
    #[error("IP discovery error: {0}")]
    Discovery(String),

    /// Failures talking to the DNS update endpoint, including empty replies
    #[error("update error: {0}")]
    Update(String),

    /// Credential cipher failures (wrong key, corrupted payload)
    #[error("cipher error: {0}")]
    Decryption(String),

    /// No encryption key available from any configured source
    #[error("encryption key not found: {0}")]
    MissingKey(String),

    /// Invalid input to a component that assumes well-formed input
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a discovery error
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery(msg.into())
    }

    /// Create an update error
    pub fn update(msg: impl Into<String>) -> Self {
        Self::Update(msg.into())
    }

    /// Create a decryption error
    pub fn decryption(msg: impl Into<String>) -> Self {
        Self::Decryption(msg.into())
    }

    /// Create a missing key error
    pub fn missing_key(msg: impl Into<String>) -> Self {
        Self::MissingKey(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
