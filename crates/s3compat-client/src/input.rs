//! Upload input descriptors.
//!
//! A [`PutInput`] pairs a [`BodySource`] with its declared size and the
//! checksums sent alongside it. Inputs are built per call and consumed by the
//! upload.

use std::fmt;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::checksums::{hash_reader, md5_base64, sha256_hex};
use crate::error::{ClientError, ClientResult};

/// The body of an outgoing request.
pub enum BodySource {
    /// No body.
    Empty,
    /// In-memory bytes.
    Buffer(Bytes),
    /// An open file, positioned at the start of the data.
    File {
        /// The file handle; closed when the source is dropped.
        file: File,
        /// Number of bytes to send.
        size: u64,
    },
    /// A caller-supplied stream.
    Reader {
        /// The stream.
        reader: Box<dyn Read + Send>,
        /// Number of bytes to send.
        size: u64,
    },
}

impl BodySource {
    /// Number of bytes the body carries.
    #[must_use]
    pub fn len(&self) -> u64 {
        match self {
            Self::Empty => 0,
            Self::Buffer(bytes) => bytes.len() as u64,
            Self::File { size, .. } | Self::Reader { size, .. } => *size,
        }
    }

    /// Whether the body is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The bytes of an in-memory body.
    #[must_use]
    pub fn as_buffer(&self) -> Option<&[u8]> {
        match self {
            Self::Buffer(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl fmt::Debug for BodySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Buffer(bytes) => f.debug_tuple("Buffer").field(&bytes.len()).finish(),
            Self::File { size, .. } => f.debug_struct("File").field("size", size).finish(),
            Self::Reader { size, .. } => f.debug_struct("Reader").field("size", size).finish(),
        }
    }
}

/// How `Content-MD5` is obtained for a file input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Md5Sum {
    /// Hash the file while reading it.
    #[default]
    Compute,
    /// Send no `Content-MD5`.
    Skip,
    /// Use a precomputed base64 digest.
    Provided(String),
}

/// Data to upload with `put_object`.
#[derive(Debug)]
pub struct PutInput {
    body: BodySource,
    size: Option<u64>,
    content_md5: Option<String>,
    content_sha256: Option<String>,
    path: Option<PathBuf>,
}

impl Default for PutInput {
    fn default() -> Self {
        Self {
            body: BodySource::Empty,
            size: None,
            content_md5: None,
            content_sha256: None,
            path: None,
        }
    }
}

impl PutInput {
    /// Upload in-memory bytes. Both digests are computed.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            size: Some(data.len() as u64),
            content_md5: Some(md5_base64(&data)),
            content_sha256: Some(sha256_hex(&data)),
            body: BodySource::Buffer(data),
            path: None,
        }
    }

    /// Upload a string.
    pub fn from_string(data: impl Into<String>) -> Self {
        Self::from_bytes(Bytes::from(data.into()))
    }

    /// Upload a local file.
    ///
    /// The file is hashed on read for `x-amz-content-sha256`, and for
    /// `Content-MD5` unless `md5` says otherwise, then rewound.
    ///
    /// # Errors
    ///
    /// Returns an input error when the path does not exist, is not a regular
    /// file, or cannot be read.
    pub fn from_file(path: impl AsRef<Path>, md5: Md5Sum) -> ClientResult<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| {
            ClientError::input(format!("Unable to open input file {}: {e}", path.display()))
        })?;
        if !metadata.is_file() {
            return Err(ClientError::input(format!(
                "Input {} is not a regular file",
                path.display()
            )));
        }

        let mut file = File::open(path).map_err(|e| {
            ClientError::input(format!("Unable to open input file {}: {e}", path.display()))
        })?;
        let digests = hash_reader(&mut file, md5 == Md5Sum::Compute)
            .map_err(|e| ClientError::io(format!("reading {}", path.display()), e))?;
        file.rewind()
            .map_err(|e| ClientError::io(format!("rewinding {}", path.display()), e))?;

        let content_md5 = match md5 {
            Md5Sum::Compute => digests.md5_base64,
            Md5Sum::Skip => None,
            Md5Sum::Provided(value) => Some(value),
        };

        Ok(Self {
            body: BodySource::File {
                file,
                size: digests.size,
            },
            size: Some(digests.size),
            content_md5,
            content_sha256: Some(digests.sha256_hex),
            path: Some(path.to_path_buf()),
        })
    }

    /// Upload from a caller-supplied stream of `size` bytes.
    ///
    /// No digests are computed; V4 signs such a body as `UNSIGNED-PAYLOAD`
    /// unless [`PutInput::with_content_sha256`] supplies one. A missing size
    /// is rejected by the upload before any request is made.
    pub fn from_reader(reader: impl Read + Send + 'static, size: Option<u64>) -> Self {
        Self {
            body: BodySource::Reader {
                reader: Box::new(reader),
                size: size.unwrap_or_default(),
            },
            size,
            ..Self::default()
        }
    }

    /// Supply the base64 `Content-MD5` value.
    #[must_use]
    pub fn with_content_md5(mut self, md5: impl Into<String>) -> Self {
        self.content_md5 = Some(md5.into());
        self
    }

    /// Supply the hex `x-amz-content-sha256` value.
    #[must_use]
    pub fn with_content_sha256(mut self, sha256: impl Into<String>) -> Self {
        self.content_sha256 = Some(sha256.into());
        self
    }

    /// Declared size, if known.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Base64 MD5, if any.
    #[must_use]
    pub fn content_md5(&self) -> Option<&str> {
        self.content_md5.as_deref()
    }

    /// Hex SHA-256, if any.
    #[must_use]
    pub fn content_sha256(&self) -> Option<&str> {
        self.content_sha256.as_deref()
    }

    /// Source path of a file input.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether the input carries a body and a size.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.size.is_some() && !matches!(self.body, BodySource::Empty)
    }

    /// Take the body, leaving the input empty.
    pub(crate) fn take_body(&mut self) -> BodySource {
        std::mem::replace(&mut self.body, BodySource::Empty)
    }
}

/// Content type guessed from a file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use s3compat_client::input::guess_mime;
///
/// assert_eq!(guess_mime(Path::new("index.html")).as_deref(), Some("text/html"));
/// assert_eq!(guess_mime(Path::new("noext")), None);
/// ```
#[must_use]
pub fn guess_mime(path: &Path) -> Option<String> {
    mime_guess::from_path(path).first().map(|m| m.essence_str().to_owned())
}
