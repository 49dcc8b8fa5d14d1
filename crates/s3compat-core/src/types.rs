//! Common S3 type definitions shared across crates.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Matches AWS S3 endpoint host names and captures the region component.
///
/// Covers `s3.<region>.amazonaws.com`, `s3-<region>.amazonaws.com`, and the
/// `website-` / `dualstack.` variants.
static REGION_IN_HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)s3[.-](?:website-|dualstack\.)?(.+)\.amazonaws\.com")
        .expect("region pattern is a valid regex")
});

/// Legacy host suffix that looks like a region but is not one.
const EXTERNAL_ONE: &str = "external-1";

/// AWS region identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AwsRegion(String);

impl AwsRegion {
    /// Region used when neither configuration nor endpoint host names one.
    pub const DEFAULT: &'static str = "us-east-1";

    /// Create a new region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Infer the region from an endpoint host name.
    ///
    /// Returns `None` for hosts that do not follow the AWS naming scheme and
    /// for the legacy `s3-external-1` host.
    ///
    /// # Examples
    ///
    /// ```
    /// use s3compat_core::AwsRegion;
    ///
    /// let region = AwsRegion::from_endpoint("s3.eu-west-1.amazonaws.com").unwrap();
    /// assert_eq!(region.as_str(), "eu-west-1");
    /// assert!(AwsRegion::from_endpoint("s3.amazonaws.com").is_none());
    /// ```
    #[must_use]
    pub fn from_endpoint(host: &str) -> Option<Self> {
        let captures = REGION_IN_HOST.captures(host)?;
        let region = captures.get(1)?.as_str();
        if region.eq_ignore_ascii_case(EXTERNAL_ONE) {
            return None;
        }
        Some(Self(region.to_owned()))
    }

    /// Resolve the effective region: the explicit value if non-empty, else the
    /// region inferred from `host`, else [`AwsRegion::DEFAULT`].
    #[must_use]
    pub fn resolve(explicit: Option<&str>, host: &str) -> Self {
        match explicit.map(str::trim) {
            Some(region) if !region.is_empty() => Self::new(region),
            _ => Self::from_endpoint(host).unwrap_or_default(),
        }
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AwsRegion {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request signing algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureVersion {
    /// HMAC-SHA1 string signing.
    V2,
    /// HMAC-SHA256 derived-key signing.
    #[default]
    V4,
}

impl SignatureVersion {
    /// Return the lowercase name (`v2` / `v4`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V2 => "v2",
            Self::V4 => "v4",
        }
    }
}

impl fmt::Display for SignatureVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v2" | "2" => Ok(Self::V2),
            "v4" | "4" => Ok(Self::V4),
            _ => Err(CoreError::InvalidSignatureVersion(s.to_owned())),
        }
    }
}

/// Canned ACL sent as `x-amz-acl` on uploads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Acl {
    /// Owner-only access.
    #[default]
    Private,
    /// Anyone may read.
    PublicRead,
    /// Anyone may read and write.
    PublicReadWrite,
    /// Any authenticated AWS user may read.
    AuthenticatedRead,
}

impl Acl {
    /// Header value for this ACL.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::PublicRead => "public-read",
            Self::PublicReadWrite => "public-read-write",
            Self::AuthenticatedRead => "authenticated-read",
        }
    }
}

impl fmt::Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Acl {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Self::Private),
            "public-read" => Ok(Self::PublicRead),
            "public-read-write" => Ok(Self::PublicReadWrite),
            "authenticated-read" => Ok(Self::AuthenticatedRead),
            _ => Err(CoreError::InvalidValue {
                kind: "ACL",
                value: s.to_owned(),
            }),
        }
    }
}

/// Object storage class sent as `x-amz-storage-class`.
///
/// `Standard` is the server default and is never sent explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StorageClass {
    /// The default storage class.
    #[default]
    Standard,
    /// Reduced redundancy storage.
    ReducedRedundancy,
    /// Infrequent access.
    StandardIa,
    /// Single-zone infrequent access.
    OnezoneIa,
    /// Automatic tiering.
    IntelligentTiering,
    /// Archive storage.
    Glacier,
}

impl StorageClass {
    /// Header value for this storage class.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::ReducedRedundancy => "REDUCED_REDUNDANCY",
            Self::StandardIa => "STANDARD_IA",
            Self::OnezoneIa => "ONEZONE_IA",
            Self::IntelligentTiering => "INTELLIGENT_TIERING",
            Self::Glacier => "GLACIER",
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageClass {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STANDARD" => Ok(Self::Standard),
            "REDUCED_REDUNDANCY" => Ok(Self::ReducedRedundancy),
            "STANDARD_IA" => Ok(Self::StandardIa),
            "ONEZONE_IA" => Ok(Self::OnezoneIa),
            "INTELLIGENT_TIERING" => Ok(Self::IntelligentTiering),
            "GLACIER" => Ok(Self::Glacier),
            _ => Err(CoreError::InvalidValue {
                kind: "storage class",
                value: s.to_owned(),
            }),
        }
    }
}

/// Server-side encryption sent as `x-amz-server-side-encryption`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ServerSideEncryption {
    /// No encryption header is sent.
    #[default]
    None,
    /// S3-managed keys.
    Aes256,
    /// KMS-managed keys.
    AwsKms,
}

impl ServerSideEncryption {
    /// Header value, or `None` when no header should be sent.
    #[must_use]
    pub fn header_value(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Aes256 => Some("AES256"),
            Self::AwsKms => Some("aws:kms"),
        }
    }
}

impl FromStr for ServerSideEncryption {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Self::None),
            "AES256" => Ok(Self::Aes256),
            "aws:kms" => Ok(Self::AwsKms),
            _ => Err(CoreError::InvalidValue {
                kind: "server-side encryption",
                value: s.to_owned(),
            }),
        }
    }
}
