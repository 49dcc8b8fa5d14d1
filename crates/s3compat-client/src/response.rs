//! Response interpretation.

use s3compat_xml::ErrorDocument;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::executor::ResponseHeaders;

/// Statuses whose body is never treated as an error document.
const SUCCESS_STATUSES: [u16; 3] = [200, 204, 206];

/// A received HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Captured headers.
    pub headers: ResponseHeaders,
    /// Buffered body. Empty when the body went to a sink.
    pub body: Vec<u8>,
}

impl Response {
    /// Classify the response against the statuses an operation accepts.
    ///
    /// An XML body on a non-success status that carries `Code` and `Message`
    /// becomes a protocol error with those values, and the body is dropped.
    /// Any other status outside `accepted` becomes an "Unexpected HTTP
    /// status" error.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Protocol`] as described above.
    pub fn interpret(self, accepted: &[u16]) -> ClientResult<Self> {
        if !SUCCESS_STATUSES.contains(&self.status) && self.is_xml() && !self.body.is_empty() {
            match ErrorDocument::parse(&self.body) {
                Ok(doc) => {
                    return Err(ClientError::Protocol {
                        status: self.status,
                        code: doc.code,
                        message: doc.message,
                        resource: doc.resource,
                    });
                }
                Err(e) => debug!(error = %e, status = self.status, "Error body is not an S3 error document"),
            }
        }
        if !accepted.contains(&self.status) {
            return Err(ClientError::unexpected_status(self.status));
        }
        Ok(self)
    }

    /// Whether the content type is XML.
    fn is_xml(&self) -> bool {
        self.headers
            .content_type
            .as_deref()
            .and_then(|ct| ct.parse::<mime::Mime>().ok())
            .is_some_and(|m| {
                m.subtype() == mime::XML && (m.type_() == mime::APPLICATION || m.type_() == mime::TEXT)
            })
    }
}
