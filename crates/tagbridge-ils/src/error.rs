//! Errors raised while reading the ILS XML dialect.

/// Result type alias for protocol parsing.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Protocol parsing errors.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Request body is not well-formed XML.
    #[error("Malformed XML: {0}")]
    MalformedXml(#[from] roxmltree::Error),

    /// Request body is not UTF-8.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),

    /// A required field is absent or empty.
    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

impl ProtocolError {
    /// Message sent back to the ILS in the error envelope.
    pub fn client_message(&self) -> String {
        match self {
            Self::MalformedXml(_) | Self::InvalidEncoding(_) => {
                "Malformed XML payload".to_string()
            }
            Self::MissingField(field) => format!("Missing {field}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message() {
        let error = ProtocolError::MissingField("barcode");
        assert_eq!(error.to_string(), "Missing field: barcode");
        assert_eq!(error.client_message(), "Missing barcode");
    }

    #[test]
    fn test_malformed_xml_from_parser() {
        let error: ProtocolError = roxmltree::Document::parse("<rfid>").unwrap_err().into();
        assert!(matches!(error, ProtocolError::MalformedXml(_)));
        assert_eq!(error.client_message(), "Malformed XML payload");
    }

    #[test]
    fn test_invalid_encoding_reads_as_malformed() {
        let bytes = [b'<', b'r', 0xFF, 0xFE, b'>'];
        let error: ProtocolError = std::str::from_utf8(&bytes).unwrap_err().into();
        assert!(matches!(error, ProtocolError::InvalidEncoding(_)));
        assert_eq!(error.client_message(), "Malformed XML payload");
    }
}
