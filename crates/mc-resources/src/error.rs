//! Error types for mc-resources.
//!
//! This is the taxonomy callers see. Errors from the HTTP, auth and SOAP
//! layers are converted on the way up.

/// Result type alias for mc-resources operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for mc-resources operations.
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

    pub(crate) fn handler(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResourceHandler(message.into()))
    }

    /// Returns true for network, discovery and SOAP transport failures.
    pub fn is_api_request_error(&self) -> bool {
        matches!(self.kind, ErrorKind::ApiRequest(_) | ErrorKind::SoapRequest(_))
    }

    /// Returns true for misuse of a handler operation, including missing
    /// properties.
    pub fn is_handler_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ResourceHandler(_) | ErrorKind::MissingProperty(_)
        )
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Missing or invalid client setup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The authorization service rejected the credentials.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network or endpoint discovery failure.
    #[error("API request error: {0}")]
    ApiRequest(String),

    /// SOAP transport failure.
    #[error("SOAP request error: {0}")]
    SoapRequest(String),

    /// A handler operation was misused or the service reply was unusable.
    #[error("Resource handler error: {0}")]
    ResourceHandler(String),

    /// A named schema or entity property is absent.
    #[error("Missing property: {0}")]
    MissingProperty(String),

    /// A plain entity field is absent.
    #[error("No such attribute: {0}")]
    MissingAttribute(String),

    /// The result set has no further pages.
    #[error("{0}")]
    NoMoreData(String),

    /// No handler is bound to the requested resource name.
    #[error("Missing handler for resource {0}")]
    UnknownResource(String),
}

impl From<busbar_mc_client::Error> for Error {
    fn from(err: busbar_mc_client::Error) -> Self {
        Error::with_source(ErrorKind::ApiRequest(err.kind.to_string()), err)
    }
}

impl From<busbar_mc_auth::Error> for Error {
    fn from(err: busbar_mc_auth::Error) -> Self {
        use busbar_mc_auth::ErrorKind as Auth;

        let kind = match &err.kind {
            Auth::Authentication(msg) => ErrorKind::Authentication(msg.clone()),
            Auth::Config(msg) => ErrorKind::Configuration(msg.clone()),
            Auth::ApiRequest(_) | Auth::InvalidResponse(_) => {
                ErrorKind::ApiRequest(err.kind.to_string())
            }
        };
        Error::with_source(kind, err)
    }
}

impl From<busbar_mc_soap::Error> for Error {
    fn from(err: busbar_mc_soap::Error) -> Self {
        let kind = if err.is_usage_error() {
            ErrorKind::ResourceHandler(err.kind.to_string())
        } else {
            ErrorKind::SoapRequest(err.kind.to_string())
        };
        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::ApiRequest(err.to_string()), err)
    }
}
