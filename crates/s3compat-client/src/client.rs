//! Object operations.
//!
//! [`S3Client`] composes the request builder, the executor and the response
//! interpreter into `put_object`, `get_object`, `get_object_info` and
//! `delete_object`. Every public operation routes its failure through the
//! configured [`ErrorMode`](crate::ErrorMode) exactly once.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use http::Method;
use s3compat_core::{Acl, ServerSideEncryption, StorageClass};
use tracing::{debug, info};
use typed_builder::TypedBuilder;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::executor::{ResponseHeaders, execute};
use crate::input::{Md5Sum, PutInput};
use crate::request::S3Request;
use crate::response::Response;
use crate::transport::{HttpTransport, Transport};

/// Metadata of a stored object.
pub type ObjectInfo = ResponseHeaders;

/// Source of the current time.
pub type Clock = fn() -> DateTime<Utc>;

const META_PREFIX: &str = "x-amz-meta-";

/// Options for uploads.
///
/// # Examples
///
/// ```
/// use s3compat_client::PutOptions;
/// use s3compat_core::{Acl, StorageClass};
///
/// let options = PutOptions::builder()
///     .acl(Acl::PublicRead)
///     .storage_class(StorageClass::ReducedRedundancy)
///     .content_type("image/png")
///     .build();
/// assert_eq!(options.content_type.as_deref(), Some("image/png"));
/// ```
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct PutOptions {
    /// Canned ACL, always sent as `x-amz-acl`.
    #[builder(default)]
    pub acl: Acl,

    /// User metadata. Names are sent with an `x-amz-meta-` prefix unless they
    /// already carry one.
    #[builder(default)]
    pub meta: BTreeMap<String, String>,

    /// Extra request headers. Names starting with `x-amz-` are sent as amz
    /// headers.
    #[builder(default)]
    pub request_headers: BTreeMap<String, String>,

    /// Storage class, sent when not `STANDARD`.
    #[builder(default)]
    pub storage_class: StorageClass,

    /// Server-side encryption, sent when set.
    #[builder(default)]
    pub sse: ServerSideEncryption,

    /// Content type, used when no `Content-Type` request header is given.
    #[builder(default, setter(strip_option, into))]
    pub content_type: Option<String>,
}

/// Result of a successful upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutObjectOutput {
    /// Unquoted `ETag` of the stored object.
    pub etag: Option<String>,
}

/// Where `get_object` delivers the body.
pub enum GetTarget<'a> {
    /// Return the body in [`GetObjectOutput::body`].
    Memory,
    /// Stream the body into a writer.
    Writer(&'a mut dyn Write),
    /// Stream the body into a new file at this path.
    Path(PathBuf),
}

impl std::fmt::Debug for GetTarget<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => f.write_str("Memory"),
            Self::Writer(_) => f.write_str("Writer"),
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
        }
    }
}

/// Result of a successful download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetObjectOutput {
    /// Object metadata from the response headers.
    pub info: ObjectInfo,
    /// The body for [`GetTarget::Memory`], empty otherwise.
    pub body: Bytes,
}

/// Blocking client for an S3-compatible endpoint.
#[derive(Debug)]
pub struct S3Client<T: Transport = HttpTransport> {
    config: ClientConfig,
    transport: T,
    clock: Clock,
}

impl S3Client<HttpTransport> {
    /// Create a client that talks HTTP(S) to the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP transport cannot be built from the
    /// endpoint's TLS and proxy options.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let transport = HttpTransport::new(&config.endpoint)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> S3Client<T> {
    /// Create a client over an arbitrary transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            clock: Utc::now,
        }
    }

    /// Replace the clock used to stamp requests.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Set the clock correction in seconds.
    pub fn set_time_offset(&mut self, seconds: i64) {
        self.config.time_offset = seconds;
    }

    /// Upload an object.
    ///
    /// # Errors
    ///
    /// Returns an input error when the input has no body or size, otherwise
    /// any transport or protocol error. Expects status 200.
    #[track_caller]
    pub fn put_object(
        &self,
        input: PutInput,
        bucket: &str,
        key: &str,
        options: &PutOptions,
    ) -> ClientResult<PutObjectOutput> {
        match self.try_put_object(input, bucket, key, options) {
            Ok(output) => Ok(output),
            Err(e) => Err(self.config.error_mode.report("put_object", e)),
        }
    }

    /// Upload a local file. MD5 and SHA-256 are computed while reading it.
    ///
    /// # Errors
    ///
    /// As [`S3Client::put_object`], plus an input error when the file cannot
    /// be read.
    #[track_caller]
    pub fn put_object_file(
        &self,
        path: impl AsRef<Path>,
        bucket: &str,
        key: &str,
        options: &PutOptions,
    ) -> ClientResult<PutObjectOutput> {
        let result = PutInput::from_file(path, Md5Sum::Compute)
            .and_then(|input| self.try_put_object(input, bucket, key, options));
        match result {
            Ok(output) => Ok(output),
            Err(e) => Err(self.config.error_mode.report("put_object_file", e)),
        }
    }

    /// Upload a string, as `text/plain` unless the options say otherwise.
    ///
    /// # Errors
    ///
    /// As [`S3Client::put_object`].
    #[track_caller]
    pub fn put_object_string(
        &self,
        text: impl Into<String>,
        bucket: &str,
        key: &str,
        options: &PutOptions,
    ) -> ClientResult<PutObjectOutput> {
        let mut options = options.clone();
        options
            .content_type
            .get_or_insert_with(|| mime::TEXT_PLAIN.essence_str().to_owned());
        match self.try_put_object(PutInput::from_string(text), bucket, key, &options) {
            Ok(output) => Ok(output),
            Err(e) => Err(self.config.error_mode.report("put_object_string", e)),
        }
    }

    /// Download an object.
    ///
    /// For [`GetTarget::Path`] the file is created before any request is made,
    /// and removed again if the download fails.
    ///
    /// # Errors
    ///
    /// Returns an input error when the destination cannot be created,
    /// otherwise any transport, I/O or protocol error. Expects status 200.
    #[track_caller]
    pub fn get_object(
        &self,
        bucket: &str,
        key: &str,
        target: GetTarget<'_>,
    ) -> ClientResult<GetObjectOutput> {
        match self.try_get_object(bucket, key, target) {
            Ok(output) => Ok(output),
            Err(e) => Err(self.config.error_mode.report("get_object", e)),
        }
    }

    /// Fetch object metadata with a HEAD request.
    ///
    /// Returns `None` when the object does not exist.
    ///
    /// # Errors
    ///
    /// Returns any transport error, or a protocol error for statuses other
    /// than 200 and 404.
    #[track_caller]
    pub fn get_object_info(&self, bucket: &str, key: &str) -> ClientResult<Option<ObjectInfo>> {
        match self.try_get_object_info(bucket, key) {
            Ok(info) => Ok(info),
            Err(e) => Err(self.config.error_mode.report("get_object_info", e)),
        }
    }

    /// Whether an object exists.
    ///
    /// # Errors
    ///
    /// As [`S3Client::get_object_info`].
    #[track_caller]
    pub fn object_exists(&self, bucket: &str, key: &str) -> ClientResult<bool> {
        match self.try_get_object_info(bucket, key) {
            Ok(info) => Ok(info.is_some()),
            Err(e) => Err(self.config.error_mode.report("object_exists", e)),
        }
    }

    /// Delete an object.
    ///
    /// # Errors
    ///
    /// Returns any transport or protocol error. Expects status 204.
    #[track_caller]
    pub fn delete_object(&self, bucket: &str, key: &str) -> ClientResult<()> {
        match self.try_delete_object(bucket, key) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.config.error_mode.report("delete_object", e)),
        }
    }

    /// Measure the offset between the server clock and the local clock with a
    /// HEAD request against the bare endpoint, and apply it to later requests.
    ///
    /// Returns the new offset in seconds.
    ///
    /// # Errors
    ///
    /// Returns any transport error, or a protocol error when the response
    /// carries no `Date` header.
    #[track_caller]
    pub fn sync_clock(&mut self) -> ClientResult<i64> {
        match self.try_sync_clock() {
            Ok(offset) => {
                self.config.time_offset = offset;
                Ok(offset)
            }
            Err(e) => Err(self.config.error_mode.report("sync_clock", e)),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)() + TimeDelta::seconds(self.config.time_offset)
    }

    fn send(&self, request: S3Request, sink: Option<&mut dyn Write>) -> ClientResult<Response> {
        let prepared = request.prepare(
            &self.config.endpoint,
            self.config.signing_credentials(),
            self.now(),
        )?;
        execute(&self.transport, prepared, sink)
    }

    fn try_put_object(
        &self,
        mut input: PutInput,
        bucket: &str,
        key: &str,
        options: &PutOptions,
    ) -> ClientResult<PutObjectOutput> {
        if !input.is_complete() {
            return Err(ClientError::input("Missing input parameters"));
        }

        let mut request = S3Request::new(Method::PUT, bucket, key);
        let mut header_content_type = None;
        for (name, value) in &options.request_headers {
            if name.eq_ignore_ascii_case("content-type") {
                header_content_type = Some(value.clone());
            } else if name.to_ascii_lowercase().starts_with("x-amz-") {
                request = request.amz_header(name, value);
            } else {
                request = request.header(name, value);
            }
        }

        let content_type = header_content_type
            .or_else(|| options.content_type.clone())
            .or_else(|| input.path().and_then(|p| (self.config.mime_resolver)(p)))
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.essence_str().to_owned());
        request = request.header("Content-Type", content_type);

        if let Some(md5) = input.content_md5() {
            request = request.header("Content-MD5", md5);
        }
        if let Some(sha256) = input.content_sha256() {
            request = request.amz_header("x-amz-content-sha256", sha256);
        }
        if options.storage_class != StorageClass::Standard {
            request = request.amz_header("x-amz-storage-class", options.storage_class.as_str());
        }
        if let Some(sse) = options.sse.header_value() {
            request = request.amz_header("x-amz-server-side-encryption", sse);
        }
        request = request.amz_header("x-amz-acl", options.acl.as_str());
        for (name, value) in &options.meta {
            let name = if name.to_ascii_lowercase().starts_with(META_PREFIX) {
                name.clone()
            } else {
                format!("{META_PREFIX}{name}")
            };
            request = request.amz_header(name, value);
        }

        let size = input.size().unwrap_or_default();
        info!(bucket, key, size, "Uploading object");

        let response = self
            .send(request.body(input.take_body()), None)?
            .interpret(&[200])?;
        Ok(PutObjectOutput {
            etag: response.headers.hash,
        })
    }

    fn try_get_object(
        &self,
        bucket: &str,
        key: &str,
        target: GetTarget<'_>,
    ) -> ClientResult<GetObjectOutput> {
        let request = S3Request::new(Method::GET, bucket, key);
        debug!(bucket, key, target = ?target, "Downloading object");

        match target {
            GetTarget::Memory => {
                let response = self.send(request, None)?.interpret(&[200])?;
                Ok(GetObjectOutput {
                    info: response.headers,
                    body: Bytes::from(response.body),
                })
            }
            GetTarget::Writer(writer) => {
                let response = self.send(request, Some(writer))?.interpret(&[200])?;
                Ok(GetObjectOutput {
                    info: response.headers,
                    body: Bytes::new(),
                })
            }
            GetTarget::Path(path) => {
                let mut file = File::create(&path).map_err(|e| {
                    ClientError::input(format!(
                        "Unable to open save file for writing: {}: {e}",
                        path.display()
                    ))
                })?;
                let result = self
                    .send(request, Some(&mut file))
                    .and_then(|response| response.interpret(&[200]))
                    .and_then(|response| {
                        file.sync_all()
                            .map_err(|e| ClientError::io(format!("syncing {}", path.display()), e))?;
                        Ok(response)
                    });
                drop(file);
                match result {
                    Ok(response) => Ok(GetObjectOutput {
                        info: response.headers,
                        body: Bytes::new(),
                    }),
                    Err(e) => {
                        if let Err(rm) = std::fs::remove_file(&path) {
                            debug!(path = %path.display(), error = %rm, "Failed to remove partial download");
                        }
                        Err(e)
                    }
                }
            }
        }
    }

    fn try_get_object_info(&self, bucket: &str, key: &str) -> ClientResult<Option<ObjectInfo>> {
        let request = S3Request::new(Method::HEAD, bucket, key);
        let response = self.send(request, None)?.interpret(&[200, 404])?;
        debug!(bucket, key, status = response.status, "Fetched object info");
        Ok((response.status == 200).then_some(response.headers))
    }

    fn try_delete_object(&self, bucket: &str, key: &str) -> ClientResult<()> {
        let request = S3Request::new(Method::DELETE, bucket, key);
        self.send(request, None)?.interpret(&[204])?;
        info!(bucket, key, "Deleted object");
        Ok(())
    }

    fn try_sync_clock(&self) -> ClientResult<i64> {
        let request = S3Request::new(Method::HEAD, "", "");
        let response = self.send(request, None)?;
        let Some(server) = response.headers.date else {
            return Err(ClientError::Protocol {
                status: response.status,
                code: response.status.to_string(),
                message: "Response carried no Date header".to_owned(),
                resource: None,
            });
        };
        let offset = server - (self.clock)().timestamp();
        info!(offset, "Synchronised clock with server");
        Ok(offset)
    }
}
