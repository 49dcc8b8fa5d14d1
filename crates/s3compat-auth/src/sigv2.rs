//! AWS Signature Version 2 signing.
//!
//! SigV2 signs a newline-separated description of the request with HMAC-SHA1.
//! The `Authorization` header has the format:
//!
//! ```text
//! AWS <AWSAccessKeyId>:<Signature>
//! ```
//!
//! Where `Signature = Base64(HMAC-SHA1(SecretKey, StringToSign))` and:
//!
//! ```text
//! StringToSign = HTTP-Verb + "\n" +
//!                Content-MD5 + "\n" +
//!                Content-Type + "\n" +
//!                Date +
//!                ("\n" + CanonicalizedAmzHeaders)? + "\n" +
//!                CanonicalizedResource
//! ```

use std::cmp::Ordering;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, KeyInit, Mac};
use sha1::Sha1;
use tracing::debug;

use crate::credentials::Credentials;

type HmacSha1 = Hmac<Sha1>;

/// Order two `name:value` amz header lines.
///
/// Lines are compared over the length of the shorter header name. When both
/// names have the same length a tie falls back to comparing the full lines;
/// otherwise a tie puts the shorter name first.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use s3compat_auth::sigv2::compare_amz_lines;
///
/// assert_eq!(compare_amz_lines("x-amz-acl:private", "x-amz-meta-a:1"), Ordering::Less);
/// assert_eq!(compare_amz_lines("x-amz-meta-ab:1", "x-amz-meta-a:1"), Ordering::Greater);
/// ```
#[must_use]
pub fn compare_amz_lines(a: &str, b: &str) -> Ordering {
    let len_a = a.find(':').unwrap_or(a.len());
    let len_b = b.find(':').unwrap_or(b.len());
    let min_len = len_a.min(len_b);
    let truncated = a.as_bytes()[..min_len].cmp(&b.as_bytes()[..min_len]);

    if len_a == len_b {
        return truncated.then_with(|| a.cmp(b));
    }
    truncated.then(len_a.cmp(&len_b))
}

/// Build the canonicalized amz header block.
///
/// Names are lowercased, empty values are skipped and the lines are ordered
/// with [`compare_amz_lines`]. Returns an empty string when nothing remains,
/// otherwise the block prefixed with a newline.
#[must_use]
pub fn build_canonicalized_amz_headers(amz_headers: &[(&str, &str)]) -> String {
    let mut lines: Vec<String> = amz_headers
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| format!("{}:{value}", name.to_ascii_lowercase()))
        .collect();

    if lines.is_empty() {
        return String::new();
    }

    lines.sort_by(|a, b| compare_amz_lines(a, b));
    format!("\n{}", lines.join("\n"))
}

/// Build the SigV2 string to sign.
///
/// # Examples
///
/// ```
/// use s3compat_auth::sigv2::build_string_to_sign;
///
/// let sts = build_string_to_sign(
///     "GET",
///     "",
///     "",
///     "Tue, 27 Mar 2007 19:36:42 +0000",
///     &[],
///     "/johnsmith/photos/puppy.jpg",
/// );
/// assert_eq!(sts, "GET\n\n\nTue, 27 Mar 2007 19:36:42 +0000\n/johnsmith/photos/puppy.jpg");
/// ```
#[must_use]
pub fn build_string_to_sign(
    verb: &str,
    content_md5: &str,
    content_type: &str,
    date: &str,
    amz_headers: &[(&str, &str)],
    resource: &str,
) -> String {
    let amz = build_canonicalized_amz_headers(amz_headers);
    format!("{verb}\n{content_md5}\n{content_type}\n{date}{amz}\n{resource}")
}

/// Compute `Base64(HMAC-SHA1(secret_key, data))`.
#[must_use]
pub fn compute_signature(secret_key: &str, data: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(secret_key.as_bytes()).expect("HMAC can accept keys of any length");
    mac.update(data.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// Produce the `Authorization` header value for a string to sign.
///
/// # Examples
///
/// ```
/// use s3compat_auth::Credentials;
/// use s3compat_auth::sigv2::authorization;
///
/// let creds = Credentials::new("AKID", "secret");
/// assert!(authorization(&creds, "GET\n\n\n\n/").starts_with("AWS AKID:"));
/// ```
#[must_use]
pub fn authorization(credentials: &Credentials, string_to_sign: &str) -> String {
    debug!(string_to_sign = ?string_to_sign, "Built SigV2 string to sign");
    let signature = compute_signature(credentials.secret_key(), string_to_sign);
    format!("AWS {}:{signature}", credentials.access_key())
}
