use thiserror::Error;

/// Top-level error type for the Contoso assistant.
///
/// Subsystem crates define their own error types and implement
/// `From<ContosoError>` so that the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContosoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ContosoError {
    fn from(err: toml::de::Error) -> Self {
        ContosoError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ContosoError {
    fn from(err: toml::ser::Error) -> Self {
        ContosoError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ContosoError {
    fn from(err: serde_json::Error) -> Self {
        ContosoError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Contoso operations.
pub type Result<T> = std::result::Result<T, ContosoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ContosoError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = ContosoError::Storage("disk full".to_string());
        assert_eq!(err.to_string(), "Storage error: disk full");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ContosoError = io_err.into();
        assert!(matches!(err, ContosoError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let parse_err = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let err: ContosoError = parse_err.into();
        assert!(matches!(err, ContosoError::Config(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ContosoError = json_err.into();
        assert!(matches!(err, ContosoError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error:"));
    }
}
