//! Request builder.
//!
//! [`S3Request`] collects the verb, bucket, key, query parameters, headers and
//! body of one call. [`S3Request::prepare`] resolves the addressing mode, stamps
//! the `Date` header, signs the request and yields a [`PreparedRequest`] ready
//! for a [`Transport`](crate::transport::Transport).

use chrono::{DateTime, Utc};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use s3compat_auth::Credentials;
use s3compat_auth::canonical::uri_encode;
use s3compat_auth::sigv4::{
    self, CONTENT_SHA256_HEADER, DATE_HEADER, Payload, SigningRequest, UNSIGNED_PAYLOAD,
};
use s3compat_auth::sigv2;
use s3compat_core::{EndpointConfig, SignatureVersion};
use tracing::debug;

use crate::addressing;
use crate::error::{ClientError, ClientResult};
use crate::input::BodySource;

/// Query parameters that address a sub-resource and are part of the SigV2
/// canonical resource.
pub const SUB_RESOURCES: [&str; 5] = ["acl", "location", "torrent", "website", "logging"];

/// Format a timestamp the way the `Date` header carries it.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use s3compat_client::request::http_date;
///
/// let when = Utc.with_ymd_and_hms(2007, 3, 27, 19, 36, 42).unwrap();
/// assert_eq!(http_date(when), "Tue, 27 Mar 2007 19:36:42 GMT");
/// ```
#[must_use]
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// One request under construction.
#[derive(Debug)]
pub struct S3Request {
    method: Method,
    bucket: String,
    key: String,
    parameters: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    amz_headers: Vec<(String, String)>,
    body: BodySource,
}

impl S3Request {
    /// Start a request for `key` in `bucket`. An empty bucket addresses the
    /// bare endpoint.
    pub fn new(method: Method, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            method,
            bucket: bucket.into(),
            key: key.into(),
            parameters: Vec::new(),
            headers: Vec::new(),
            amz_headers: Vec::new(),
            body: BodySource::Empty,
        }
    }

    /// Set a query parameter. An empty value is sent as a bare key.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        upsert(&mut self.parameters, name.into(), value.into(), false);
        self
    }

    /// Set a request header. Empty values are not sent.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        upsert(&mut self.headers, name.into(), value.into(), true);
        self
    }

    /// Set an `x-amz-*` header.
    #[must_use]
    pub fn amz_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        upsert(&mut self.amz_headers, name.into(), value.into(), true);
        self
    }

    /// Set the request body.
    #[must_use]
    pub fn body(mut self, body: BodySource) -> Self {
        self.body = body;
        self
    }

    /// The HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The target bucket, empty for the bare endpoint.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The object key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Resolve, stamp and sign the request.
    ///
    /// Without `credentials` the request is sent unsigned. `now` becomes the
    /// SigV4 timestamp and the `Date` header, unless the caller set `Date`
    /// explicitly. Caller headers replace the generated `Host` and `Date`, and
    /// whatever is sent is what gets signed. Under SigV4 a caller
    /// `x-amz-date` is dropped in favour of `now`.
    ///
    /// # Errors
    ///
    /// Returns an input error when a header name or value cannot be sent over
    /// HTTP.
    pub fn prepare(
        self,
        endpoint: &EndpointConfig,
        credentials: Option<&Credentials>,
        now: DateTime<Utc>,
    ) -> ClientResult<PreparedRequest> {
        let address =
            addressing::resolve(&endpoint.host, &self.bucket, &self.key, endpoint.use_ssl);

        let query = self.query_string();
        let mut resource = address.resource;
        if !query.is_empty()
            && self
                .parameters
                .iter()
                .any(|(name, _)| SUB_RESOURCES.contains(&name.as_str()))
        {
            resource.push('?');
            resource.push_str(&query);
        }

        let mut headers: Vec<(String, String)> = vec![
            ("Host".to_owned(), address.host.clone()),
            ("Date".to_owned(), http_date(now)),
        ];
        for (name, value) in &self.headers {
            upsert(&mut headers, name.clone(), value.clone(), true);
        }
        let mut amz_headers = self.amz_headers.clone();
        if credentials.is_some() && endpoint.signature_version == SignatureVersion::V4 {
            // The V4 timestamp is always `now`.
            amz_headers.retain(|(name, _)| !name.eq_ignore_ascii_case(DATE_HEADER));
            headers.retain(|(name, _)| !name.eq_ignore_ascii_case(DATE_HEADER));
        }
        let date = header_value(&headers, "Date").to_owned();

        match credentials {
            None => {}
            Some(creds) if endpoint.is_cloudfront() => {
                let authorization = sigv2::authorization(creds, &date);
                upsert(&mut headers, "Authorization".to_owned(), authorization, true);
            }
            Some(creds) => match endpoint.signature_version {
                SignatureVersion::V2 => {
                    let amz: Vec<(&str, &str)> = pairs(&amz_headers);
                    let sts = sigv2::build_string_to_sign(
                        self.method.as_str(),
                        header_value(&headers, "Content-MD5"),
                        header_value(&headers, "Content-Type"),
                        &date,
                        &amz,
                        &resource,
                    );
                    let authorization = sigv2::authorization(creds, &sts);
                    upsert(&mut headers, "Authorization".to_owned(), authorization, true);
                }
                SignatureVersion::V4 => {
                    if header_value(&amz_headers, CONTENT_SHA256_HEADER).is_empty()
                        && header_value(&headers, CONTENT_SHA256_HEADER).is_empty()
                    {
                        let hash = match self.body.as_buffer() {
                            Some(bytes) => sigv4::hash_payload(bytes),
                            None if matches!(self.body, BodySource::Empty) => {
                                sigv4::hash_payload(b"")
                            }
                            None => UNSIGNED_PAYLOAD.to_owned(),
                        };
                        upsert(&mut amz_headers, CONTENT_SHA256_HEADER.to_owned(), hash, true);
                    }
                    let mut to_sign = pairs(&headers);
                    to_sign.extend(pairs(&amz_headers));
                    let query_pairs = pairs(&self.parameters);
                    let request = SigningRequest {
                        method: self.method.as_str(),
                        path: &address.path,
                        query: &query_pairs,
                        headers: &to_sign,
                        payload: self
                            .body
                            .as_buffer()
                            .map_or(Payload::Stream, Payload::Buffer),
                    };
                    let signed =
                        sigv4::sign(&request, creds, endpoint.region().as_str(), now);
                    for (name, value) in signed.into_pairs() {
                        upsert(&mut headers, name.to_owned(), value, true);
                    }
                }
            },
        }

        let mut header_map = HeaderMap::new();
        for (name, value) in headers.iter().chain(amz_headers.iter()) {
            if value.is_empty() {
                continue;
            }
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::input(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::input(format!("invalid value for {name}: {e}")))?;
            header_map.insert(name, value);
        }

        let mut url = format!("{}://{}{}", endpoint.scheme(), address.host, address.path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        debug!(method = %self.method, url, resource, "Prepared request");

        Ok(PreparedRequest {
            method: self.method,
            url,
            headers: header_map,
            body: self.body,
            resource,
        })
    }

    /// Query string in insertion order, `k` or `k=rawurlencode(v)`.
    fn query_string(&self) -> String {
        self.parameters
            .iter()
            .map(|(name, value)| {
                if value.is_empty() {
                    name.clone()
                } else {
                    format!("{name}={}", uri_encode(value))
                }
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// A resolved, signed request.
#[derive(Debug)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL including the query string.
    pub url: String,
    /// Headers to send, including `Host`, `Date` and `Authorization`.
    pub headers: HeaderMap,
    /// Request body.
    pub body: BodySource,
    /// Canonical resource, used in error reports.
    pub resource: String,
}

fn upsert(list: &mut Vec<(String, String)>, name: String, value: String, ignore_case: bool) {
    let existing = list.iter_mut().find(|(n, _)| {
        if ignore_case {
            n.eq_ignore_ascii_case(&name)
        } else {
            *n == name
        }
    });
    match existing {
        Some(entry) => entry.1 = value,
        None => list.push((name, value)),
    }
}

fn header_value<'a>(list: &'a [(String, String)], name: &str) -> &'a str {
    list.iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map_or("", |(_, v)| v.as_str())
}

fn pairs(list: &[(String, String)]) -> Vec<(&str, &str)> {
    list.iter().map(|(n, v)| (n.as_str(), v.as_str())).collect()
}
