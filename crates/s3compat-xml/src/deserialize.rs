//! S3 XML deserialization.
//!
//! This module provides the [`S3Deserialize`] trait and the [`ErrorDocument`]
//! type returned by S3-compatible services when a request fails.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::XmlError;

/// Trait for deserializing S3 types from XML.
///
/// The root element has already been consumed by the caller; the implementation
/// reads child elements until the matching end tag.
pub trait S3Deserialize: Sized {
    /// Deserialize an instance from the given XML reader.
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if the XML is malformed or required fields are missing.
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError>;
}

/// Deserialize S3 XML into a typed value.
///
/// Finds the root element and delegates to the type's `S3Deserialize` implementation.
///
/// # Errors
///
/// Returns `XmlError` if the XML is malformed or deserialization fails.
pub fn from_xml<T: S3Deserialize>(xml: &[u8]) -> Result<T, XmlError> {
    let mut reader = Reader::from_reader(xml);

    loop {
        match reader.read_event()? {
            Event::Start(_) => {
                return T::deserialize_xml(&mut reader);
            }
            Event::Eof => {
                return Err(XmlError::MissingElement("root element".to_string()));
            }
            _ => {}
        }
    }
}

/// An S3 `<Error>` document.
///
/// ```xml
/// <Error>
///   <Code>NoSuchKey</Code>
///   <Message>The specified key does not exist.</Message>
///   <Resource>/mybucket/key</Resource>
///   <RequestId>4442587FB7D0A2F9</RequestId>
/// </Error>
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDocument {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// The resource the error refers to, when reported.
    pub resource: Option<String>,
    /// Server request id, when reported.
    pub request_id: Option<String>,
}

impl ErrorDocument {
    /// Parse an error document, requiring both `Code` and `Message`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::MissingElement`] when either element is absent, or
    /// any error from [`from_xml`].
    ///
    /// # Examples
    ///
    /// ```
    /// use s3compat_xml::ErrorDocument;
    ///
    /// let doc = ErrorDocument::parse(
    ///     b"<Error><Code>NoSuchKey</Code><Message>gone</Message></Error>",
    /// ).unwrap();
    /// assert_eq!(doc.code, "NoSuchKey");
    /// assert!(doc.resource.is_none());
    /// ```
    pub fn parse(xml: &[u8]) -> Result<Self, XmlError> {
        let doc: Self = from_xml(xml)?;
        if doc.code.is_empty() {
            return Err(XmlError::MissingElement("Code".to_string()));
        }
        if doc.message.is_empty() {
            return Err(XmlError::MissingElement("Message".to_string()));
        }
        Ok(doc)
    }
}

impl S3Deserialize for ErrorDocument {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut doc = Self::default();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "Code" => doc.code = read_text_content(reader)?,
                        "Message" => doc.message = read_text_content(reader)?,
                        "Resource" => doc.resource = Some(read_text_content(reader)?),
                        "RequestId" => doc.request_id = Some(read_text_content(reader)?),
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Error".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(doc)
    }
}

/// Read the text content of the current element and consume its end tag.
///
/// Expects the reader to be positioned right after a `Start` event. Text is
/// trimmed once assembled, so whitespace next to entity references survives.
fn read_text_content(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let decoded = e
                    .decode()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&decoded);
            }
            Event::CData(e) => {
                let raw = std::str::from_utf8(&e)
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(raw);
            }
            Event::GeneralRef(e) => {
                let name = std::str::from_utf8(&e)
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&resolve_reference(name)?);
            }
            Event::End(_) => {
                return Ok(text.trim().to_owned());
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while reading text content".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Resolve `&name;` into its replacement text.
fn resolve_reference(name: &str) -> Result<String, XmlError> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => num.parse::<u32>(),
        }
        .map_err(|e| XmlError::ParseError(format!("invalid character reference '&{name};': {e}")))?;
        return char::from_u32(code)
            .map(String::from)
            .ok_or_else(|| XmlError::ParseError(format!("invalid code point in '&{name};'")));
    }
    quick_xml::escape::resolve_predefined_entity(name)
        .map(ToOwned::to_owned)
        .ok_or_else(|| XmlError::ParseError(format!("unknown entity '&{name};'")))
}

/// Skip over an element and all its children.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while skipping element".to_string(),
                ));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_full_error_document() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
  <Code>NoSuchKey</Code>
  <Message>The specified key does not exist.</Message>
  <Resource>/mybucket/photo.jpg</Resource>
  <RequestId>4442587FB7D0A2F9</RequestId>
</Error>"#;
        let doc = ErrorDocument::parse(xml).unwrap();
        assert_eq!(doc.code, "NoSuchKey");
        assert_eq!(doc.message, "The specified key does not exist.");
        assert_eq!(doc.resource.as_deref(), Some("/mybucket/photo.jpg"));
        assert_eq!(doc.request_id.as_deref(), Some("4442587FB7D0A2F9"));
    }

    #[test]
    fn test_should_skip_unknown_elements() {
        let xml = b"<Error><Code>AccessDenied</Code><HostId><Nested>x</Nested></HostId>\
                    <Message>Access Denied</Message></Error>";
        let doc = ErrorDocument::parse(xml).unwrap();
        assert_eq!(doc.code, "AccessDenied");
        assert_eq!(doc.message, "Access Denied");
    }

    #[test]
    fn test_should_resolve_entities_in_text() {
        let xml = b"<Error><Code>InvalidArgument</Code><Message>a &lt; b &amp;&#x20;c&#33;</Message></Error>";
        let doc = ErrorDocument::parse(xml).unwrap();
        assert_eq!(doc.message, "a < b & c!");
    }

    #[test]
    fn test_should_require_code_and_message() {
        let missing_message = b"<Error><Code>Oops</Code></Error>";
        assert!(matches!(
            ErrorDocument::parse(missing_message),
            Err(XmlError::MissingElement(_))
        ));
        let missing_code = b"<Error><Message>Oops</Message></Error>";
        assert!(matches!(
            ErrorDocument::parse(missing_code),
            Err(XmlError::MissingElement(_))
        ));
    }

    #[test]
    fn test_should_fail_on_empty_input() {
        assert!(matches!(
            from_xml::<ErrorDocument>(b""),
            Err(XmlError::MissingElement(_))
        ));
    }

    #[test]
    fn test_should_fail_on_truncated_document() {
        assert!(ErrorDocument::parse(b"<Error><Code>X</Code>").is_err());
    }

    #[test]
    fn test_should_read_request_id_without_resource() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>SlowDown</Code><Message>Reduce your request rate</Message><RequestId>req-1</RequestId></Error>"#;
        let doc = ErrorDocument::parse(xml).unwrap();
        assert_eq!(doc.code, "SlowDown");
        assert_eq!(doc.request_id.as_deref(), Some("req-1"));
        assert!(doc.resource.is_none());
    }
}
