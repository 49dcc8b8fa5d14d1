//! Client configuration.
//!
//! [`ClientConfig`] is owned by the client and bundles everything a call
//! needs besides its own arguments: credentials, the endpoint, how errors are
//! surfaced, the clock correction and an optional signing key pair.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use s3compat_auth::{Credentials, SigningKey};
use s3compat_core::EndpointConfig;
use typed_builder::TypedBuilder;

use crate::error::{ClientResult, ErrorMode};
use crate::input::guess_mime;

/// Maps a file path to a content type.
pub type MimeResolver = Arc<dyn Fn(&Path) -> Option<String> + Send + Sync>;

/// The default resolver, guessing from the file extension.
#[must_use]
pub fn default_mime_resolver() -> MimeResolver {
    Arc::new(guess_mime)
}

/// Configuration for an [`S3Client`](crate::S3Client).
///
/// # Examples
///
/// ```
/// use s3compat_auth::Credentials;
/// use s3compat_client::{ClientConfig, ErrorMode};
///
/// let config = ClientConfig::builder()
///     .credentials(Credentials::new("AKID", "secret"))
///     .error_mode(ErrorMode::Panic)
///     .build();
/// assert!(config.has_auth());
/// ```
#[derive(TypedBuilder)]
pub struct ClientConfig {
    /// Access key pair. Without one, requests are sent unsigned.
    #[builder(default, setter(strip_option))]
    pub credentials: Option<Credentials>,

    /// Target endpoint.
    #[builder(default)]
    pub endpoint: EndpointConfig,

    /// How failures are surfaced.
    #[builder(default)]
    pub error_mode: ErrorMode,

    /// Seconds added to the system clock when stamping requests.
    #[builder(default)]
    pub time_offset: i64,

    /// Key pair for signed distribution URLs.
    #[builder(default, setter(strip_option))]
    pub signing_key: Option<SigningKey>,

    /// Content-type lookup for file uploads.
    #[builder(default = default_mime_resolver())]
    pub mime_resolver: MimeResolver,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("credentials", &self.credentials)
            .field("endpoint", &self.endpoint)
            .field("error_mode", &self.error_mode)
            .field("time_offset", &self.time_offset)
            .field("signing_key", &self.signing_key)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// Load the endpoint and credentials from the environment.
    ///
    /// See [`EndpointConfig::from_env`] and [`Credentials::from_env`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error for unrecognised endpoint settings.
    pub fn from_env() -> ClientResult<Self> {
        let endpoint = EndpointConfig::from_env()?;
        Ok(Self {
            credentials: Credentials::from_env(),
            endpoint,
            ..Self::default()
        })
    }

    /// Whether requests will be signed.
    #[must_use]
    pub fn has_auth(&self) -> bool {
        self.credentials
            .as_ref()
            .is_some_and(Credentials::is_complete)
    }

    /// Credentials to sign with, if any.
    #[must_use]
    pub fn signing_credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref().filter(|c| c.is_complete())
    }

    /// Load a signing key pair from a PEM file, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns a key error when the file cannot be read or does not hold a
    /// PEM private key. The previous key is kept in that case.
    pub fn load_signing_key(
        &mut self,
        key_pair_id: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> ClientResult<()> {
        self.signing_key = Some(SigningKey::from_file(key_pair_id, path)?);
        Ok(())
    }

    /// Drop the signing key, wiping its material.
    pub fn clear_signing_key(&mut self) {
        self.signing_key = None;
    }
}
