//! Client error type and the error-reporting hook.
//!
//! Every failed operation produces exactly one [`ClientError`]. Before it is
//! returned, the error passes through [`ErrorMode::report`], which either logs
//! it as a warning or raises it as a panic carrying an [`S3Panic`] payload.

use std::panic::Location;

use s3compat_auth::AuthError;
use s3compat_core::CoreError;

use crate::transport::TransportError;

/// Code reported for failures that never reached the network.
pub const LOCAL_ERROR_CODE: &str = "0";

/// Errors produced by the S3 client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Invalid or missing input detected before any network call.
    #[error("{0}")]
    Input(String),

    /// Local file I/O failed before or after the exchange.
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted.
        context: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The request never produced an HTTP response.
    #[error("[{code}] {message} ({resource})")]
    Transport {
        /// Transport failure code.
        code: String,
        /// Transport failure description.
        message: String,
        /// Canonical resource of the request.
        resource: String,
    },

    /// The server answered with an error status or `<Error>` document.
    #[error("[{code}] {message}")]
    Protocol {
        /// HTTP status of the response.
        status: u16,
        /// S3 error code, or the HTTP status when no document was returned.
        code: String,
        /// Error message.
        message: String,
        /// Resource named in the error document.
        resource: Option<String>,
    },

    /// Signing key material could not be loaded.
    #[error(transparent)]
    Key(#[from] AuthError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] CoreError),
}

impl ClientError {
    /// Build an input error.
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    /// Build an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Build a transport error from a failed exchange.
    #[must_use]
    pub fn transport(err: &TransportError, resource: &str) -> Self {
        Self::Transport {
            code: err.code().to_owned(),
            message: err.to_string(),
            resource: resource.to_owned(),
        }
    }

    /// Build the error used when a status is outside the accepted set and no
    /// error document explains it.
    #[must_use]
    pub fn unexpected_status(status: u16) -> Self {
        Self::Protocol {
            status,
            code: status.to_string(),
            message: "Unexpected HTTP status".to_owned(),
            resource: None,
        }
    }

    /// The error code as a string: the local code `"0"`, the transport code,
    /// the HTTP status, or the S3 error code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Transport { code, .. } | Self::Protocol { code, .. } => code,
            Self::Input(_) | Self::Io { .. } | Self::Key(_) | Self::Config(_) => LOCAL_ERROR_CODE,
        }
    }

    /// The HTTP status, for protocol errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server reported that the object or bucket does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Protocol { status: 404, .. }
        ) || matches!(self, Self::Protocol { code, .. } if code == "NoSuchKey" || code == "NoSuchBucket")
    }
}

/// Convenience result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// How operation failures are surfaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorMode {
    /// Log a warning and return the error.
    #[default]
    Warn,
    /// Panic with an [`S3Panic`] payload.
    Panic,
}

/// Panic payload raised in [`ErrorMode::Panic`].
#[derive(Debug)]
pub struct S3Panic {
    /// The operation that failed, e.g. `put_object`.
    pub operation: &'static str,
    /// Error code, see [`ClientError::code`].
    pub code: String,
    /// Rendered error message.
    pub message: String,
    /// Where the failing operation was called from.
    pub location: &'static Location<'static>,
    /// The typed error.
    pub error: ClientError,
}

impl ErrorMode {
    /// Surface an operation failure according to the mode.
    ///
    /// In [`ErrorMode::Warn`] the error is logged and handed back. In
    /// [`ErrorMode::Panic`] this never returns.
    #[track_caller]
    pub fn report(self, operation: &'static str, error: ClientError) -> ClientError {
        let location = Location::caller();
        let code = error.code().to_owned();
        let message = error.to_string();
        match self {
            Self::Warn => {
                tracing::warn!(
                    operation,
                    code = %code,
                    file = location.file(),
                    line = location.line(),
                    "{message}"
                );
                error
            }
            Self::Panic => std::panic::panic_any(S3Panic {
                operation,
                code,
                message,
                location,
                error,
            }),
        }
    }
}
