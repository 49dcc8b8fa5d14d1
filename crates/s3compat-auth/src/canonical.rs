//! Canonical request construction for AWS Signature Version 4.
//!
//! The canonical request is the exact byte string that is hashed and signed:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! Every component is normalized so that a server rebuilding the request from
//! the wire arrives at the same bytes.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Everything except the RFC 3986 unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`) is percent-encoded.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Build the full canonical request string from its components.
///
/// `canonical_query` must already be in canonical form, see
/// [`build_canonical_query_string`].
///
/// # Examples
///
/// ```
/// use s3compat_auth::canonical::build_canonical_request;
///
/// let canonical = build_canonical_request(
///     "GET",
///     "/test.txt",
///     "",
///     &[("host", "examplebucket.s3.amazonaws.com")],
///     &["host"],
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
/// );
/// assert!(canonical.starts_with("GET\n/test.txt\n"));
/// ```
#[must_use]
pub fn build_canonical_request(
    method: &str,
    uri: &str,
    canonical_query: &str,
    headers: &[(&str, &str)],
    signed_headers: &[&str],
    payload_hash: &str,
) -> String {
    let canonical_uri = build_canonical_uri(uri);
    let canonical_headers = build_canonical_headers(headers, signed_headers);
    let signed_headers_str = build_signed_headers_string(signed_headers);

    format!(
        "{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n\n{signed_headers_str}\n{payload_hash}"
    )
}

/// Build the canonical URI by URI-encoding each path segment individually.
///
/// Forward slashes are preserved and empty paths become `/`. Segments are
/// decoded before encoding so an already-encoded path is not encoded twice.
///
/// # Examples
///
/// ```
/// use s3compat_auth::canonical::build_canonical_uri;
///
/// assert_eq!(build_canonical_uri("/photos/puppy%20dog.jpg"), "/photos/puppy%20dog.jpg");
/// assert_eq!(build_canonical_uri(""), "/");
/// ```
#[must_use]
pub fn build_canonical_uri(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }

    path.split('/')
        .map(|segment| uri_encode(&percent_decode_str(segment).decode_utf8_lossy()))
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the canonical query string from decoded parameters.
///
/// Keys and values are RFC 3986 encoded, then sorted by key and by value for
/// duplicate keys. Parameters without a value render as `key=`.
///
/// # Examples
///
/// ```
/// use s3compat_auth::canonical::build_canonical_query_string;
///
/// assert_eq!(build_canonical_query_string(&[]), "");
/// assert_eq!(
///     build_canonical_query_string(&[("prefix", "a b"), ("acl", "")]),
///     "acl=&prefix=a%20b"
/// );
/// ```
#[must_use]
pub fn build_canonical_query_string(params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (uri_encode(k), uri_encode(v)))
        .collect();

    encoded.sort_unstable();

    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the canonical headers block.
///
/// Only headers listed in `signed_headers` are included. Names are lowercased,
/// values trimmed with inner whitespace runs collapsed, duplicates joined with
/// commas, and the result sorted by name. No trailing newline.
#[must_use]
pub fn build_canonical_headers(headers: &[(&str, &str)], signed_headers: &[&str]) -> String {
    let mut header_map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let lower_name = name.to_lowercase();
        let trimmed_value = collapse_whitespace(value.trim());
        header_map
            .entry(lower_name)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&trimmed_value);
            })
            .or_insert(trimmed_value);
    }

    let mut sorted_signed: Vec<&str> = signed_headers.to_vec();
    sorted_signed.sort_unstable();
    sorted_signed.dedup();

    sorted_signed
        .iter()
        .filter_map(|name| header_map.get(*name).map(|value| format!("{name}:{value}")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the `;`-separated, sorted list of signed header names.
///
/// # Examples
///
/// ```
/// use s3compat_auth::canonical::build_signed_headers_string;
///
/// assert_eq!(
///     build_signed_headers_string(&["x-amz-date", "host"]),
///     "host;x-amz-date"
/// );
/// ```
#[must_use]
pub fn build_signed_headers_string(signed_headers: &[&str]) -> String {
    let mut sorted: Vec<&str> = signed_headers.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.join(";")
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
///
/// # Examples
///
/// ```
/// use s3compat_auth::canonical::uri_encode;
///
/// assert_eq!(uri_encode("a b/c~d"), "a%20b%2Fc~d");
/// ```
#[must_use]
pub fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, URI_ENCODE_SET).to_string()
}

/// Collapse consecutive whitespace characters in a string to a single space.
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}
