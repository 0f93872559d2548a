//! Error types for mc-soap.

/// Result type alias for mc-soap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for mc-soap operations.
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

    /// Returns true if the caller built an invalid request.
    ///
    /// Everything else is a transport-side failure.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::InvalidFilter(_) | ErrorKind::InvalidPayload(_)
        )
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// HTTP transport failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with no body where one was required.
    #[error("{0}")]
    EmptyResponse(String),

    /// The reply could not be decoded.
    #[error("Invalid SOAP response: {0}")]
    InvalidResponse(String),

    /// WSDL cache file access failed.
    #[error("IO error: {0}")]
    Io(String),

    /// The factory or client is missing something it needs.
    #[error("SOAP client not configured: {0}")]
    NotConfigured(String),

    /// A filter expression was combined incorrectly.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// An object or option payload cannot be written as XML.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl From<busbar_mc_client::Error> for Error {
    fn from(err: busbar_mc_client::Error) -> Self {
        Error::with_source(ErrorKind::Transport(err.kind.to_string()), err)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::with_source(ErrorKind::InvalidResponse(err.to_string()), err)
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::with_source(ErrorKind::InvalidResponse(err.to_string()), err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}
