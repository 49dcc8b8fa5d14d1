//! Core types and endpoint configuration for s3compat.
//!
//! This crate holds the pure-data layer shared by the signing engine and the
//! client: the endpoint description (host, region, TLS and proxy options,
//! signature version), region inference from well-known AWS host names, and
//! the canned values used in object uploads (ACLs, storage classes,
//! server-side encryption).

mod config;
mod error;
mod types;

pub use config::{DEFAULT_ENDPOINT, EndpointConfig, ProxyConfig, TlsVersion};
pub use error::{CoreError, CoreResult};
pub use types::{Acl, AwsRegion, ServerSideEncryption, SignatureVersion, StorageClass};
