//! Error types for vercel-deploy-core

/// Result type alias for vercel-deploy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vercel-deploy operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed action input
    #[error("Configuration error: {0}")]
    Config(String),

    /// External process failed to spawn or exited non-zero
    #[error("{0}")]
    Process(String),

    /// Output of an external tool could not be understood
    #[error("{0}")]
    Parse(String),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// API answered with an error status or error body
    #[error("{0}")]
    Api(String),

    /// API rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Operation invoked in a state that does not allow it
    #[error("{0}")]
    Precondition(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

/// Fieldless error category for cheap pattern matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    /// Configuration error
    Config,
    /// External process error
    Process,
    /// Tool output parse error
    Parse,
    /// Transport error
    Http,
    /// API error
    Api,
    /// API rate limit exceeded
    RateLimitExceeded,
    /// Precondition error
    Precondition,
    /// I/O operation error
    Io,
    /// JSON error
    Json,
}

impl Error {
    /// Get the error kind without allocating.
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::Process(_) => ErrorKind::Process,
            Error::Parse(_) => ErrorKind::Parse,
            Error::Http(_) => ErrorKind::Http,
            Error::Api(_) => ErrorKind::Api,
            Error::RateLimitExceeded(_) => ErrorKind::RateLimitExceeded,
            Error::Precondition(_) => ErrorKind::Precondition,
            Error::Io(_) => ErrorKind::Io,
            Error::Json(_) => ErrorKind::Json,
        }
    }

    /// Borrow the error message.
    #[inline]
    pub fn message(&self) -> &str {
        match self {
            Error::Config(msg)
            | Error::Process(msg)
            | Error::Parse(msg)
            | Error::Http(msg)
            | Error::Api(msg)
            | Error::RateLimitExceeded(msg)
            | Error::Precondition(msg)
            | Error::Json(msg) => msg,
            Error::Io(_) => "I/O error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_is_copy() {
        let err = Error::Process("boom".to_string());
        let k = err.kind();
        let k2 = k;
        assert_eq!(k, k2);
        assert_eq!(std::mem::size_of::<ErrorKind>(), 1);
    }

    #[test]
    fn test_error_message_borrows() {
        let err = Error::Config("bad config".to_string());
        assert_eq!(err.message(), "bad config");
        assert_eq!(err.to_string(), "Configuration error: bad config");
    }

    #[test]
    fn test_process_and_parse_display_verbatim() {
        // Failure reasons surface to the job summary unchanged
        let err = Error::Process("Error: Project not found".into());
        assert_eq!(err.to_string(), "Error: Project not found");

        let err = Error::Parse("Could not parse deployment URL".into());
        assert_eq!(err.to_string(), "Could not parse deployment URL");
    }

    #[test]
    fn test_all_error_variants_have_kind() {
        let cases: Vec<(Error, ErrorKind)> = vec![
            (Error::Config("c".into()), ErrorKind::Config),
            (Error::Process("p".into()), ErrorKind::Process),
            (Error::Parse("pa".into()), ErrorKind::Parse),
            (Error::Http("h".into()), ErrorKind::Http),
            (Error::Api("a".into()), ErrorKind::Api),
            (
                Error::RateLimitExceeded("rl".into()),
                ErrorKind::RateLimitExceeded,
            ),
            (Error::Precondition("pr".into()), ErrorKind::Precondition),
            (Error::Io(std::io::Error::other("io")), ErrorKind::Io),
            (Error::Json("j".into()), ErrorKind::Json),
        ];

        for (err, expected_kind) in cases {
            assert_eq!(err.kind(), expected_kind, "Mismatch for {:?}", err);
        }
    }

    #[test]
    fn test_serde_json_error_converts() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Json);
    }
}
