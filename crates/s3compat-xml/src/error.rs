//! Error types for S3 XML parsing.

/// Errors that can occur while reading S3 XML.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// A required XML element was missing.
    #[error("missing required XML element: {0}")]
    MissingElement(String),

    /// An unexpected XML element was encountered.
    #[error("unexpected XML element: {0}")]
    UnexpectedElement(String),

    /// An error parsing a value from XML text content.
    #[error("failed to parse value: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_name_missing_element() {
        let err = XmlError::MissingElement("Code".to_owned());
        assert_eq!(err.to_string(), "missing required XML element: Code");
    }
}
