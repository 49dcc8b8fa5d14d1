//! S3 XML handling for s3compat.
//!
//! S3-compatible services report failures as a flat `<Error>` document. This
//! crate parses those documents into [`ErrorDocument`].
//!
//! # Key components
//!
//! - [`S3Deserialize`] trait and [`from_xml`] function for parsing XML bodies into structs
//! - [`ErrorDocument`] for the `<Error><Code/><Message/><Resource/></Error>` shape
//! - [`XmlError`] for malformed or incomplete documents

pub mod deserialize;
pub mod error;

pub use deserialize::{ErrorDocument, S3Deserialize, from_xml};
pub use error::XmlError;
