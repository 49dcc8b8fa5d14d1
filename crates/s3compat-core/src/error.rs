//! Error types for the s3compat core.

/// Core error type for configuration parsing.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Unknown signature version string.
    #[error("invalid signature version: {0} (expected 'v2' or 'v4')")]
    InvalidSignatureVersion(String),

    /// Unknown TLS version string.
    #[error("invalid TLS version: {0} (expected '1.2' or '1.3')")]
    InvalidTlsVersion(String),

    /// Unknown canned value (ACL, storage class, encryption).
    #[error("invalid {kind}: {value}")]
    InvalidValue {
        /// What was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
