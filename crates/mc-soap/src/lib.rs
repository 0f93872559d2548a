//! # mc-soap
//!
//! SOAP transport for the Marketing Cloud partner API.
//!
//! - [`SoapClientFactory`] caches the WSDL on disk and hands out a
//!   [`SoapClient`] bound to the current endpoint and legacy token
//! - [`SoapClient`] issues `Describe`, `Retrieve`, `Create`, `Update` and
//!   `Delete` calls and returns the raw `(code, body)` pair as a [`SoapReply`]
//! - [`FilterExpression`] builds retrieve filters
//!
//! Reply bodies are decoded into `serde_json::Value` trees: elements with
//! children become objects, repeated siblings become arrays, text becomes
//! strings and empty elements become `null`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_mc_soap::{FilterExpression, RetrieveRequest, SoapClientFactory};
//!
//! let mut factory = SoapClientFactory::new("/tmp/etframework.wsdl", http);
//! factory.init().await?;
//!
//! let soap = factory.make(authenticator.credential())?;
//! let request = RetrieveRequest::new("Subscriber")
//!     .with_properties(vec!["EmailAddress".into(), "Status".into()])
//!     .with_filter(FilterExpression::equals("Status", "Active"));
//! let reply = soap.retrieve(&request).await?;
//! ```

mod client;
mod error;
pub mod filter;
mod wsdl;
pub mod xml;

pub use client::{RetrieveOptions, RetrieveRequest, SoapClient, SoapReply};
pub use error::{Error, ErrorKind, Result};
pub use filter::{FilterExpression, FilterValue, LogicalOperator, SimpleFilter, SimpleOperator};
pub use wsdl::{ServiceDescription, SoapClientFactory};

/// Default WSDL location.
pub const DEFAULT_WSDL_URL: &str = "https://webservice.exacttarget.com/etframework.wsdl";

/// Default lifetime of the cached WSDL file, in seconds.
pub const DEFAULT_WSDL_EXPIRE_SECS: u64 = 24 * 60 * 60;

/// Namespace of partner API payloads when the WSDL does not declare one.
pub const DEFAULT_TARGET_NAMESPACE: &str = "http://exacttarget.com/wsdl/partnerAPI";

/// Tracing target for full request/response envelopes in debug mode.
pub const WIRE_LOG_TARGET: &str = "busbar_mc_soap::wire";
