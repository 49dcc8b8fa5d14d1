//! Blocking client for S3-compatible object storage.
//!
//! The client builds requests against any S3-API endpoint, signs them with
//! Signature Version 2 or 4, sends them over a pluggable [`Transport`] and
//! decodes the result into typed values or a single [`ClientError`].
//!
//! # Usage
//!
//! ```no_run
//! use s3compat_auth::Credentials;
//! use s3compat_client::{ClientConfig, GetTarget, PutOptions, S3Client};
//!
//! let config = ClientConfig::builder()
//!     .credentials(Credentials::new("AKID", "secret"))
//!     .build();
//! let client = S3Client::new(config)?;
//!
//! client.put_object_string("hello", "my-bucket", "greeting.txt", &PutOptions::default())?;
//! let object = client.get_object("my-bucket", "greeting.txt", GetTarget::Memory)?;
//! assert_eq!(object.body.as_ref(), b"hello");
//! client.delete_object("my-bucket", "greeting.txt")?;
//! # Ok::<(), s3compat_client::ClientError>(())
//! ```
//!
//! # Modules
//!
//! - [`addressing`] - Virtual-host vs path-style addressing and key encoding
//! - [`checksums`] - `Content-MD5` and SHA-256 digests
//! - [`client`] - Object operations
//! - [`config`] - Client configuration
//! - [`error`] - Error type and error reporting
//! - [`executor`] - Sending requests and capturing responses
//! - [`input`] - Upload inputs
//! - [`request`] - Request builder and signing
//! - [`response`] - Response interpretation
//! - [`transport`] - Transport trait and the reqwest implementation

pub mod addressing;
pub mod checksums;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod input;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{GetObjectOutput, GetTarget, ObjectInfo, PutObjectOutput, PutOptions, S3Client};
pub use config::{ClientConfig, MimeResolver};
pub use error::{ClientError, ClientResult, ErrorMode, S3Panic};
pub use input::{BodySource, Md5Sum, PutInput};
pub use transport::{HeaderSink, HttpTransport, ResponseReceiver, Transport, TransportError};
