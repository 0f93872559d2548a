//! Error types for mc-auth.
//!
//! Error messages are designed to avoid exposing credential data.

/// Result type alias for mc-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for mc-auth operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if the authorization service rejected the credentials.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication(_))
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The token request was answered with a non-200 status.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network failure or malformed reply from the token or discovery service.
    #[error("API request error: {0}")]
    ApiRequest(String),

    /// The token reply was well-formed JSON but lacked a required field.
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    /// Invalid credentials configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<busbar_mc_client::Error> for Error {
    fn from(err: busbar_mc_client::Error) -> Self {
        Error::with_source(ErrorKind::ApiRequest(err.kind.to_string()), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::ApiRequest(err.to_string()), err)
    }
}
