//! Bucket addressing and object key encoding.
//!
//! A DNS-compliant bucket is addressed virtual-host style
//! (`bucket.endpoint/key`), anything else path style (`endpoint/bucket/key`).
//! The canonical resource is `/bucket/key` in both cases, so signing and
//! addressing always agree.

use std::net::Ipv4Addr;

use s3compat_auth::canonical::uri_encode;

/// Maximum length of a bucket name that can be used as a host label.
const MAX_DNS_BUCKET_LEN: usize = 63;

/// Whether `bucket` can be used as part of a host name.
///
/// The name must be at most 63 characters of lowercase letters, digits, `.`
/// and `-`, start and end with a letter or digit, contain none of `..`, `-.`
/// and `.-`, and not look like an IPv4 address. Over TLS the name must not
/// contain a dot at all, since it would not match a wildcard certificate.
///
/// # Examples
///
/// ```
/// use s3compat_client::addressing::is_dns_compliant;
///
/// assert!(is_dns_compliant("my-bucket", false));
/// assert!(!is_dns_compliant("My_Bucket", false));
/// assert!(!is_dns_compliant("bucket.with.dots", true));
/// ```
#[must_use]
pub fn is_dns_compliant(bucket: &str, use_ssl: bool) -> bool {
    if bucket.is_empty() || bucket.len() > MAX_DNS_BUCKET_LEN {
        return false;
    }
    if use_ssl && bucket.contains('.') {
        return false;
    }
    if !bucket
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'.' || b == b'-')
    {
        return false;
    }
    let bytes = bucket.as_bytes();
    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !edge_ok(bytes[0]) || !edge_ok(bytes[bytes.len() - 1]) {
        return false;
    }
    if bucket.contains("..") || bucket.contains("-.") || bucket.contains(".-") {
        return false;
    }
    bucket.parse::<Ipv4Addr>().is_err()
}

/// Percent-encode an object key for use in a request path.
///
/// Everything outside the RFC 3986 unreserved set is encoded except `/`,
/// which keeps its role as a separator. The result always starts with `/`.
///
/// # Examples
///
/// ```
/// use s3compat_client::addressing::encode_key;
///
/// assert_eq!(encode_key(""), "/");
/// assert_eq!(encode_key("photos/my cat.jpg"), "/photos/my%20cat.jpg");
/// ```
#[must_use]
pub fn encode_key(key: &str) -> String {
    if key.is_empty() {
        return "/".to_owned();
    }
    format!("/{}", uri_encode(key).replace("%2F", "/"))
}

/// Where a request goes and what it signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Value of the `Host` header.
    pub host: String,
    /// Encoded request path, without query.
    pub path: String,
    /// Canonical resource used by SigV2, without sub-resources.
    pub resource: String,
}

/// Resolve the host, path and canonical resource for a bucket and key.
///
/// # Examples
///
/// ```
/// use s3compat_client::addressing::resolve;
///
/// let virt = resolve("s3.amazonaws.com", "my-bucket", "a b", false);
/// assert_eq!(virt.host, "my-bucket.s3.amazonaws.com");
/// assert_eq!(virt.path, "/a%20b");
/// assert_eq!(virt.resource, "/my-bucket/a%20b");
///
/// let path = resolve("s3.amazonaws.com", "My_Bucket", "k", false);
/// assert_eq!(path.host, "s3.amazonaws.com");
/// assert_eq!(path.path, "/My_Bucket/k");
/// assert_eq!(path.resource, "/My_Bucket/k");
/// ```
#[must_use]
pub fn resolve(endpoint: &str, bucket: &str, key: &str, use_ssl: bool) -> Address {
    let uri = encode_key(key);
    if bucket.is_empty() {
        return Address {
            host: endpoint.to_owned(),
            resource: uri.clone(),
            path: uri,
        };
    }
    if is_dns_compliant(bucket, use_ssl) {
        Address {
            host: format!("{bucket}.{endpoint}"),
            resource: format!("/{bucket}{uri}"),
            path: uri,
        }
    } else {
        let path = format!("/{bucket}{uri}");
        Address {
            host: endpoint.to_owned(),
            resource: path.clone(),
            path,
        }
    }
}
