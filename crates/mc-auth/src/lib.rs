//! # mc-auth
//!
//! Marketing Cloud credential management.
//!
//! ## Security
//!
//! - Tokens and the client secret are redacted in Debug output
//! - Tracing skips credential parameters
//! - Error messages never carry token values
//!
//! ## Token lifecycle
//!
//! A [`Credential`] is usable only while both guards hold:
//! - the access token expires more than [`EXPIRY_MARGIN_SECS`] from now
//! - less than [`REFRESH_INTERVAL_SECS`] have passed since the last refresh
//!
//! [`Authenticator::refresh`] requests a new token when either guard fails and
//! discovers the SOAP endpoint when none is known.
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_mc_auth::{AuthConfig, Authenticator};
//! use busbar_mc_client::McHttpClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), busbar_mc_auth::Error> {
//!     let config = AuthConfig::new("client-id", "client-secret");
//!     let mut auth = Authenticator::new(config, McHttpClient::default_client()?);
//!
//!     auth.refresh(false).await?;
//!     println!("endpoint: {:?}", auth.credential().endpoint());
//!     Ok(())
//! }
//! ```

mod authenticator;
mod credential;
mod error;

pub use authenticator::{AuthConfig, Authenticator, EndpointResponse, TokenRequest, TokenResponse};
pub use credential::{Credential, PresetToken};
pub use error::{Error, ErrorKind, Result};

/// Default token request URL. `legacy=1` asks for the legacy token used by SOAP headers.
pub const DEFAULT_AUTH_URL: &str = "https://auth.exacttargetapis.com/v1/requestToken?legacy=1";

/// Default SOAP endpoint discovery URL.
pub const DEFAULT_ENDPOINTS_URL: &str = "https://www.exacttargetapis.com/platform/v1/endpoints/soap";

/// A token is treated as expired this many seconds before its real expiry.
pub const EXPIRY_MARGIN_SECS: i64 = 300;

/// Tokens are re-requested once this many seconds have passed since the last refresh.
pub const REFRESH_INTERVAL_SECS: i64 = 600;
