use thiserror::Error;

/// Main error type for DLMS operations
#[derive(Error, Debug)]
pub enum DlmsError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Type error: {0}")]
    Type(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Association error: {0}")]
    Association(String),

    #[error("Timeout")]
    Timeout,

    #[error("Security error: {0}")]
    Security(String),

    #[error("Range error: {0}")]
    Range(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Target unavailable: {0}")]
    Unavailable(String),
}

impl DlmsError {
    /// Whether a fresh attempt against the same meter may succeed.
    ///
    /// Link, framing and association failures are transient. Codec,
    /// security and configuration errors repeat deterministically.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DlmsError::Connection(_)
                | DlmsError::Connect(_)
                | DlmsError::Protocol(_)
                | DlmsError::Association(_)
                | DlmsError::Timeout
        )
    }
}

/// Result type alias for DLMS operations
pub type DlmsResult<T> = Result<T, DlmsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(DlmsError::Timeout.is_retryable());
        assert!(DlmsError::Connect("refused".into()).is_retryable());
        assert!(!DlmsError::Config("bad key".into()).is_retryable());
        assert!(!DlmsError::Security("tag".into()).is_retryable());
        assert!(!DlmsError::Unavailable("open".into()).is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let err: DlmsError = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(err, DlmsError::Connection(_)));
        assert!(err.to_string().starts_with("Connection error"));
    }
}
