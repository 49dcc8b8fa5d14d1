//! Endpoint configuration.
//!
//! Provides [`EndpointConfig`], the description of the S3-compatible service a
//! client talks to. Values can be built explicitly with the typed builder or
//! loaded from environment variables via [`EndpointConfig::from_env`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{CoreError, CoreResult};
use crate::types::{AwsRegion, SignatureVersion};

/// Default endpoint host.
pub const DEFAULT_ENDPOINT: &str = "s3.amazonaws.com";

/// Host of the CloudFront API, which only accepts date-only V2 signatures.
const CLOUDFRONT_HOST: &str = "cloudfront.amazonaws.com";

/// Minimum TLS protocol version accepted when `use_ssl` is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TlsVersion {
    /// TLS 1.2 and later.
    #[default]
    #[serde(rename = "1.2")]
    Tls12,
    /// TLS 1.3 only.
    #[serde(rename = "1.3")]
    Tls13,
}

impl FromStr for TlsVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().trim_start_matches("tls").trim() {
            "1.2" | "12" => Ok(Self::Tls12),
            "1.3" | "13" => Ok(Self::Tls13),
            _ => Err(CoreError::InvalidTlsVersion(s.to_owned())),
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tls12 => f.write_str("1.2"),
            Self::Tls13 => f.write_str("1.3"),
        }
    }
}

/// Outbound HTTP proxy.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Proxy URL, e.g. `http://proxy.local:3128`.
    #[builder(setter(into))]
    pub url: String,

    /// Basic-auth user name.
    #[builder(default, setter(strip_option, into))]
    pub username: Option<String>,

    /// Basic-auth password.
    #[builder(default, setter(strip_option, into))]
    pub password: Option<String>,
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// S3-compatible endpoint configuration.
///
/// # Examples
///
/// ```
/// use s3compat_core::{EndpointConfig, SignatureVersion};
///
/// let config = EndpointConfig::default();
/// assert_eq!(config.host, "s3.amazonaws.com");
/// assert_eq!(config.region().as_str(), "us-east-1");
/// assert_eq!(config.signature_version, SignatureVersion::V4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    /// Endpoint host name, optionally with a `:port` suffix.
    #[builder(default = String::from(DEFAULT_ENDPOINT), setter(into))]
    pub host: String,

    /// Explicit signing region. When unset the region is inferred from `host`.
    #[builder(default, setter(strip_option, into))]
    pub region: Option<String>,

    /// Use `https` instead of `http`.
    #[builder(default = false)]
    pub use_ssl: bool,

    /// Verify the server certificate and host name.
    #[builder(default = true)]
    pub ssl_verify: bool,

    /// Minimum TLS version.
    #[builder(default)]
    pub ssl_version: TlsVersion,

    /// Optional outbound proxy.
    #[builder(default, setter(strip_option))]
    pub proxy: Option<ProxyConfig>,

    /// Signing algorithm.
    #[builder(default)]
    pub signature_version: SignatureVersion,

    /// Whole-request timeout in seconds. `None` means no timeout.
    #[builder(default, setter(strip_option))]
    pub timeout_secs: Option<u64>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: String::from(DEFAULT_ENDPOINT),
            region: None,
            use_ssl: false,
            ssl_verify: true,
            ssl_version: TlsVersion::default(),
            proxy: None,
            signature_version: SignatureVersion::default(),
            timeout_secs: None,
        }
    }
}

impl EndpointConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `S3_ENDPOINT` | `s3.amazonaws.com` |
    /// | `S3_REGION` | inferred from the endpoint |
    /// | `S3_USE_SSL` | `false` |
    /// | `S3_SSL_VERIFY` | `true` |
    /// | `S3_SSL_VERSION` | `1.2` |
    /// | `S3_SIGNATURE_VERSION` | `v4` |
    /// | `S3_PROXY` | unset |
    /// | `S3_PROXY_USER` | unset |
    /// | `S3_PROXY_PASS` | unset |
    /// | `S3_TIMEOUT_SECS` | unset |
    ///
    /// # Errors
    ///
    /// Returns an error when `S3_SIGNATURE_VERSION` or `S3_SSL_VERSION` hold an
    /// unrecognised value.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("S3_ENDPOINT").filter(|v| !v.is_empty()) {
            config.host = v;
        }
        if let Some(v) = lookup("S3_REGION").filter(|v| !v.is_empty()) {
            config.region = Some(v);
        }
        if let Some(v) = lookup("S3_USE_SSL") {
            config.use_ssl = parse_bool(&v);
        }
        if let Some(v) = lookup("S3_SSL_VERIFY") {
            config.ssl_verify = parse_bool(&v);
        }
        if let Some(v) = lookup("S3_SSL_VERSION") {
            config.ssl_version = v.parse()?;
        }
        if let Some(v) = lookup("S3_SIGNATURE_VERSION") {
            config.signature_version = v.parse()?;
        }
        if let Some(url) = lookup("S3_PROXY").filter(|v| !v.is_empty()) {
            config.proxy = Some(ProxyConfig {
                url,
                username: lookup("S3_PROXY_USER"),
                password: lookup("S3_PROXY_PASS"),
            });
        }
        if let Some(v) = lookup("S3_TIMEOUT_SECS") {
            match v.parse::<u64>() {
                Ok(n) => config.timeout_secs = Some(n),
                Err(_) => tracing::warn!(value = %v, "ignoring invalid S3_TIMEOUT_SECS"),
            }
        }

        Ok(config)
    }

    /// Effective signing region.
    #[must_use]
    pub fn region(&self) -> AwsRegion {
        AwsRegion::resolve(self.region.as_deref(), &self.host)
    }

    /// URL scheme for this endpoint.
    #[must_use]
    pub fn scheme(&self) -> &'static str {
        if self.use_ssl { "https" } else { "http" }
    }

    /// Whether the endpoint is the CloudFront API host.
    #[must_use]
    pub fn is_cloudfront(&self) -> bool {
        self.host.eq_ignore_ascii_case(CLOUDFRONT_HOST)
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_should_create_default_config() {
        let config = EndpointConfig::default();
        assert_eq!(config.host, DEFAULT_ENDPOINT);
        assert!(config.region.is_none());
        assert!(!config.use_ssl);
        assert!(config.ssl_verify);
        assert_eq!(config.ssl_version, TlsVersion::Tls12);
        assert!(config.proxy.is_none());
        assert_eq!(config.signature_version, SignatureVersion::V4);
        assert_eq!(config.scheme(), "http");
    }

    #[test]
    fn test_should_build_with_typed_builder() {
        let config = EndpointConfig::builder()
            .host("minio.local:9000")
            .region("auto")
            .use_ssl(true)
            .signature_version(SignatureVersion::V2)
            .timeout_secs(30)
            .proxy(ProxyConfig::builder().url("http://proxy:3128").build())
            .build();

        assert_eq!(config.host, "minio.local:9000");
        assert_eq!(config.region().as_str(), "auto");
        assert_eq!(config.scheme(), "https");
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(
            config.proxy.as_ref().map(|p| p.url.as_str()),
            Some("http://proxy:3128")
        );
    }

    #[test]
    fn test_should_load_from_lookup() {
        let config = EndpointConfig::from_lookup(lookup_from(&[
            ("S3_ENDPOINT", "s3.eu-west-1.amazonaws.com"),
            ("S3_USE_SSL", "true"),
            ("S3_SSL_VERIFY", "0"),
            ("S3_SIGNATURE_VERSION", "v2"),
            ("S3_PROXY", "http://proxy:3128"),
            ("S3_PROXY_USER", "bob"),
            ("S3_PROXY_PASS", "hunter2"),
            ("S3_TIMEOUT_SECS", "nope"),
        ]))
        .unwrap();

        assert_eq!(config.region().as_str(), "eu-west-1");
        assert!(config.use_ssl);
        assert!(!config.ssl_verify);
        assert_eq!(config.signature_version, SignatureVersion::V2);
        let proxy = config.proxy.unwrap();
        assert_eq!(proxy.username.as_deref(), Some("bob"));
        assert_eq!(proxy.password.as_deref(), Some("hunter2"));
        assert!(config.timeout_secs.is_none());
    }

    #[test]
    fn test_should_reject_unknown_signature_version_in_env() {
        let result =
            EndpointConfig::from_lookup(lookup_from(&[("S3_SIGNATURE_VERSION", "v3")]));
        assert!(matches!(result, Err(CoreError::InvalidSignatureVersion(_))));
    }

    #[test]
    fn test_should_detect_cloudfront_host() {
        let config = EndpointConfig::builder()
            .host("cloudfront.amazonaws.com")
            .build();
        assert!(config.is_cloudfront());
        assert!(!EndpointConfig::default().is_cloudfront());
    }

    #[test]
    fn test_should_parse_tls_version() {
        assert_eq!("1.3".parse::<TlsVersion>().unwrap(), TlsVersion::Tls13);
        assert_eq!("tls1.2".parse::<TlsVersion>().unwrap(), TlsVersion::Tls12);
        assert!("1.1".parse::<TlsVersion>().is_err());
    }

    #[test]
    fn test_should_redact_proxy_password() {
        let proxy = ProxyConfig::builder()
            .url("http://proxy:3128")
            .username("bob")
            .password("hunter2")
            .build();
        let debug = format!("{proxy:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_should_serialize_to_camel_case_json() {
        let json = serde_json::to_string(&EndpointConfig::default()).expect("test serialization");
        assert!(json.contains("useSsl"));
        assert!(json.contains("signatureVersion"));
        assert!(json.contains("\"v4\""));
    }

    #[test]
    fn test_should_parse_bool_values() {
        assert!(parse_bool("1"));
        assert!(parse_bool("TRUE"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool(""));
    }
}
