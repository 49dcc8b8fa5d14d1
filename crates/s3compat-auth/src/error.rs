//! Error types for credential and key handling.
//!
//! Signing itself is infallible once credentials are present; the failures
//! represented by [`AuthError`] happen when key material is loaded.

use std::path::PathBuf;

/// Errors that can occur while loading signing material.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The key material is not a PEM-encoded private key.
    #[error("Invalid signing key: {0}")]
    InvalidSigningKey(String),

    /// The key file could not be read.
    #[error("Unable to read signing key {path}: {source}")]
    KeyIo {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The key pair identifier is empty.
    #[error("Signing key pair id must not be empty")]
    MissingKeyPairId,
}
