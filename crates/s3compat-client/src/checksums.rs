//! Upload checksums.
//!
//! `Content-MD5` carries the base64 of the raw MD5 digest and
//! `x-amz-content-sha256` the hex SHA-256. File bodies are hashed on read with
//! [`StreamingHasher`] so they are never held in memory.

use std::io::{self, Read};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use digest::Digest;

/// Read buffer size used when hashing a stream.
const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Base64 of the raw MD5 digest of `data`, as sent in `Content-MD5`.
///
/// # Examples
///
/// ```
/// use s3compat_client::checksums::md5_base64;
///
/// assert_eq!(md5_base64(b""), "1B2M2Y8AsgTpgAmY7PhCfg==");
/// ```
#[must_use]
pub fn md5_base64(data: &[u8]) -> String {
    BASE64_STANDARD.encode(md5::Md5::digest(data))
}

/// Hex SHA-256 digest of `data`.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha2::Sha256::digest(data))
}

/// Digests produced by [`StreamingHasher::finish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasherResult {
    /// Base64 MD5, when requested.
    pub md5_base64: Option<String>,
    /// Hex SHA-256.
    pub sha256_hex: String,
    /// Number of bytes hashed.
    pub size: u64,
}

/// Incremental SHA-256 and optional MD5 over a stream of chunks.
///
/// # Examples
///
/// ```
/// use s3compat_client::checksums::{StreamingHasher, md5_base64};
///
/// let mut hasher = StreamingHasher::new(true);
/// hasher.update(b"hello ");
/// hasher.update(b"world");
/// let result = hasher.finish();
/// assert_eq!(result.size, 11);
/// assert_eq!(result.md5_base64, Some(md5_base64(b"hello world")));
/// ```
#[derive(Debug)]
pub struct StreamingHasher {
    md5: Option<md5::Md5>,
    sha256: sha2::Sha256,
    size: u64,
}

impl StreamingHasher {
    /// Create a hasher. SHA-256 is always computed, MD5 only when `with_md5`.
    #[must_use]
    pub fn new(with_md5: bool) -> Self {
        Self {
            md5: with_md5.then(<md5::Md5 as Digest>::new),
            sha256: <sha2::Sha256 as Digest>::new(),
            size: 0,
        }
    }

    /// Feed more data into the hasher.
    pub fn update(&mut self, data: &[u8]) {
        if let Some(ref mut h) = self.md5 {
            Digest::update(h, data);
        }
        Digest::update(&mut self.sha256, data);
        self.size += data.len() as u64;
    }

    /// Finalize and return the digests.
    #[must_use]
    pub fn finish(self) -> HasherResult {
        HasherResult {
            md5_base64: self.md5.map(|h| BASE64_STANDARD.encode(h.finalize())),
            sha256_hex: hex::encode(self.sha256.finalize()),
            size: self.size,
        }
    }
}

/// Hash everything `reader` yields.
///
/// # Errors
///
/// Returns any read error from `reader`.
pub fn hash_reader<R: Read>(mut reader: R, with_md5: bool) -> io::Result<HasherResult> {
    let mut hasher = StreamingHasher::new(with_md5);
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finish())
}
