//! HTTP transport.
//!
//! A [`Transport`] sends one [`PreparedRequest`] and streams the response into
//! a [`ResponseReceiver`]: the status first, then each header through
//! [`HeaderSink::observe`], then the body through [`std::io::Write`]. Failures
//! to obtain a response are reported as [`TransportError`], distinct from any
//! HTTP status.
//!
//! [`HttpTransport`] is the production implementation on top of the blocking
//! `reqwest` client.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use http::Method;
use reqwest::blocking::{Body, Client};
use s3compat_core::{EndpointConfig, TlsVersion};
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::input::BodySource;
use crate::request::PreparedRequest;

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = "S3/rust";

/// Receives response headers one at a time.
pub trait HeaderSink {
    /// Record the HTTP status code.
    fn status(&mut self, status: u16);

    /// Record one header.
    fn observe(&mut self, name: &str, value: &str);

    /// Record one raw header line.
    ///
    /// A status line (`HTTP/1.1 200 OK`) sets the status from the three
    /// digits at byte offset 9. Other lines are split at the first `:` and
    /// passed to [`HeaderSink::observe`]; lines without one are ignored.
    fn observe_line(&mut self, line: &str) {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.starts_with("HTTP") {
            if let Some(status) = line.get(9..12).and_then(|s| s.parse().ok()) {
                self.status(status);
            }
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            self.observe(name.trim(), value.trim());
        }
    }
}

/// Sink for a whole response: headers and body.
pub trait ResponseReceiver: HeaderSink + Write {}

impl<T: HeaderSink + Write> ResponseReceiver for T {}

/// Sends prepared requests.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Send `request` and stream the response into `receiver`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no complete response was received.
    fn send(
        &self,
        request: PreparedRequest,
        receiver: &mut dyn ResponseReceiver,
    ) -> Result<(), TransportError>;
}

/// Category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// DNS resolution, TCP connect or TLS handshake failed.
    Connect,
    /// The request timed out.
    Timeout,
    /// Sending the request failed.
    Request,
    /// Reading the response body or writing it to the sink failed.
    Body,
}

impl TransportErrorKind {
    /// Code used in error reports.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "ConnectError",
            Self::Timeout => "Timeout",
            Self::Request => "RequestError",
            Self::Body => "BodyError",
        }
    }
}

/// A request that produced no usable response.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
}

impl TransportError {
    /// Create a transport error.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The failure category.
    #[must_use]
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// The failure code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.kind.as_str()
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Request
        };
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self { kind, message }
    }
}

/// Blocking HTTP(S) transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport for the endpoint's TLS, proxy and timeout options.
    ///
    /// Redirects are followed. Without an explicit proxy, none is used.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the proxy URL is invalid or the
    /// HTTP client cannot be initialised.
    pub fn new(config: &EndpointConfig) -> ClientResult<Self> {
        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .danger_accept_invalid_certs(!config.ssl_verify)
            .min_tls_version(match config.ssl_version {
                TlsVersion::Tls12 => reqwest::tls::Version::TLS_1_2,
                TlsVersion::Tls13 => reqwest::tls::Version::TLS_1_3,
            });

        builder = match &config.proxy {
            Some(proxy) => {
                let mut p = reqwest::Proxy::all(&proxy.url).map_err(|e| {
                    ClientError::input(format!("invalid proxy URL {}: {e}", proxy.url))
                })?;
                if let Some(user) = &proxy.username {
                    p = p.basic_auth(user, proxy.password.as_deref().unwrap_or_default());
                }
                builder.proxy(p)
            }
            None => builder.no_proxy(),
        };

        let client = builder
            .build()
            .map_err(|e| ClientError::input(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        request: PreparedRequest,
        receiver: &mut dyn ResponseReceiver,
    ) -> Result<(), TransportError> {
        let is_head = request.method == Method::HEAD;
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);

        builder = match request.body {
            BodySource::Empty => builder,
            BodySource::Buffer(bytes) => builder.body(bytes),
            BodySource::File { file, size } => builder.body(Body::sized(file, size)),
            BodySource::Reader { reader, size } => builder.body(Body::sized(reader, size)),
        };

        let mut response = builder.send()?;
        let status = response.status().as_u16();
        debug!(status, url = %response.url(), "Received response");

        receiver.status(status);
        for (name, value) in response.headers() {
            receiver.observe(name.as_str(), &String::from_utf8_lossy(value.as_bytes()));
        }

        if !is_head {
            response.copy_to(receiver)?;
        }
        receiver
            .flush()
            .map_err(|e| TransportError::new(TransportErrorKind::Body, e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read};
    use std::net::TcpListener;
    use std::sync::mpsc;

    use chrono::Utc;

    use super::*;
    use crate::request::S3Request;

    #[derive(Debug, Default)]
    struct Recorder {
        status: Option<u16>,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    }

    impl HeaderSink for Recorder {
        fn status(&mut self, status: u16) {
            self.status = Some(status);
        }

        fn observe(&mut self, name: &str, value: &str) {
            self.headers.push((name.to_owned(), value.to_owned()));
        }
    }

    impl Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.body.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Serve one canned response and report the request head and body.
    fn serve_once(response: &'static str) -> (String, mpsc::Receiver<(String, Vec<u8>)>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap();
                }
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                head.push_str(&line);
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();
            let mut stream = stream;
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            tx.send((head, body)).unwrap();
        });
        (addr, rx)
    }

    #[test]
    fn test_should_parse_raw_header_lines() {
        let mut recorder = Recorder::default();
        recorder.observe_line("HTTP/1.1 404 Not Found\r\n");
        recorder.observe_line("ETag: \"abc\"\r\n");
        recorder.observe_line("garbage");
        assert_eq!(recorder.status, Some(404));
        assert_eq!(recorder.headers, vec![("ETag".to_owned(), "\"abc\"".to_owned())]);
    }

    #[test]
    fn test_should_exchange_request_over_loopback() {
        let (addr, rx) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\
             ETag: \"5d41402abc4b2a76b9719d911017c592\"\r\nx-amz-meta-color: blue\r\n\
             Connection: close\r\n\r\nhello",
        );
        let config = EndpointConfig::builder().host(addr).timeout_secs(10).build();
        let transport = HttpTransport::new(&config).unwrap();
        let prepared = S3Request::new(Method::PUT, "My_Bucket", "dir/a b.txt")
            .header("Content-Type", "text/plain")
            .body(BodySource::Buffer(bytes::Bytes::from_static(b"ping")))
            .prepare(&config, None, Utc::now())
            .unwrap();

        let mut recorder = Recorder::default();
        transport.send(prepared, &mut recorder).unwrap();

        assert_eq!(recorder.status, Some(200));
        assert_eq!(recorder.body, b"hello");
        assert!(recorder
            .headers
            .iter()
            .any(|(n, v)| n == "x-amz-meta-color" && v == "blue"));

        let (head, body) = rx.recv().unwrap();
        assert!(head.starts_with("PUT /My_Bucket/dir/a%20b.txt HTTP/1.1\r\n"));
        assert!(head.to_ascii_lowercase().contains("user-agent: s3/rust"));
        assert_eq!(body, b"ping");
    }

    #[test]
    fn test_should_report_connect_failure() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = EndpointConfig::builder()
            .host(format!("127.0.0.1:{port}"))
            .timeout_secs(5)
            .build();
        let transport = HttpTransport::new(&config).unwrap();
        let prepared = S3Request::new(Method::GET, "", "")
            .prepare(&config, None, Utc::now())
            .unwrap();

        let err = transport
            .send(prepared, &mut Recorder::default())
            .unwrap_err();
        assert_eq!(err.kind(), TransportErrorKind::Connect);
    }

    #[test]
    fn test_should_reject_invalid_proxy_url() {
        let config = EndpointConfig::builder()
            .proxy(s3compat_core::ProxyConfig::builder().url("not a url").build())
            .build();
        assert!(HttpTransport::new(&config).is_err());
    }
}
