//! Request execution and response capture.
//!
//! [`execute`] hands a prepared request to a [`Transport`] and collects the
//! result: well-known headers into [`ResponseHeaders`], and the body either
//! into a caller sink (status 200/206) or into memory.

use std::collections::BTreeMap;
use std::io::{self, Write};

use chrono::DateTime;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::request::PreparedRequest;
use crate::response::Response;
use crate::transport::{HeaderSink, Transport};

/// Headers captured from a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    /// `Last-Modified` as seconds since the epoch.
    pub time: Option<i64>,
    /// `Date` as seconds since the epoch.
    pub date: Option<i64>,
    /// `Content-Length`.
    pub size: Option<u64>,
    /// `Content-Type`.
    pub content_type: Option<String>,
    /// `ETag` without surrounding quotes.
    pub hash: Option<String>,
    /// `x-amz-meta-*` headers, keyed by the full lowercase header name.
    pub meta: BTreeMap<String, String>,
}

impl ResponseHeaders {
    /// Record one header, ignoring names that are not captured.
    pub fn capture(&mut self, name: &str, value: &str) {
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        match name.as_str() {
            "last-modified" => self.time = parse_http_date(value),
            "date" => self.date = parse_http_date(value),
            "content-length" => self.size = value.parse().ok(),
            "content-type" => self.content_type = Some(value.to_owned()),
            "etag" => {
                let unquoted = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                self.hash = Some(unquoted.to_owned());
            }
            _ if name.starts_with("x-amz-meta-") => {
                self.meta.insert(name, value.to_owned());
            }
            _ => {}
        }
    }
}

/// Parse an RFC 1123 date into epoch seconds.
fn parse_http_date(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc2822(value)
        .map(|dt| dt.timestamp())
        .ok()
}

/// Routes one response into headers, a sink or a memory buffer.
struct Collector<'a> {
    status: u16,
    headers: ResponseHeaders,
    body: Vec<u8>,
    sink: Option<&'a mut dyn Write>,
    sink_error: Option<io::Error>,
}

impl Collector<'_> {
    fn writes_to_sink(&self) -> bool {
        self.sink.is_some() && matches!(self.status, 200 | 206)
    }
}

impl HeaderSink for Collector<'_> {
    fn status(&mut self, status: u16) {
        self.status = status;
    }

    fn observe(&mut self, name: &str, value: &str) {
        self.headers.capture(name, value);
    }
}

impl Write for Collector<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.writes_to_sink() {
            self.body.extend_from_slice(buf);
            return Ok(buf.len());
        }
        let Some(sink) = self.sink.as_mut() else {
            return Ok(buf.len());
        };
        match sink.write_all(buf) {
            Ok(()) => Ok(buf.len()),
            Err(e) => {
                let copy = io::Error::new(e.kind(), e.to_string());
                self.sink_error = Some(e);
                Err(copy)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.writes_to_sink() {
            return Ok(());
        }
        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };
        sink.flush().map_err(|e| {
            let copy = io::Error::new(e.kind(), e.to_string());
            self.sink_error = Some(e);
            copy
        })
    }
}

/// Send `request` and capture the response.
///
/// With a `sink`, a 200 or 206 body is streamed into it and the returned
/// [`Response::body`] stays empty. Any other body is buffered, so error
/// documents can be interpreted.
///
/// # Errors
///
/// Returns [`ClientError::Transport`] when no response was received, or
/// [`ClientError::Io`] when the sink rejected the body.
pub fn execute<T: Transport + ?Sized>(
    transport: &T,
    request: PreparedRequest,
    sink: Option<&mut dyn Write>,
) -> ClientResult<Response> {
    let resource = request.resource.clone();
    let method = request.method.clone();
    let mut collector = Collector {
        status: 0,
        headers: ResponseHeaders::default(),
        body: Vec::new(),
        sink,
        sink_error: None,
    };

    let outcome = transport.send(request, &mut collector);
    if let Some(e) = collector.sink_error.take() {
        return Err(ClientError::io("writing response body", e));
    }
    if let Err(e) = outcome {
        return Err(ClientError::transport(&e, &resource));
    }

    debug!(%method, resource, status = collector.status, "Executed request");

    Ok(Response {
        status: collector.status,
        headers: collector.headers,
        body: collector.body,
    })
}
