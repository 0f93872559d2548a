//! # busbar-mc-api
//!
//! A Salesforce Marketing Cloud (ExactTarget) API client library for Rust.
//!
//! ## Security
//!
//! - Tokens and client secrets are redacted in Debug output
//! - Tracing skips credential parameters
//! - Error messages never carry token values
//!
//! ## Crates
//!
//! - **busbar-mc-client** - HTTP plumbing and XML/URL escaping
//! - **busbar-mc-auth** - Token requests, endpoint discovery and the refresh guards
//! - **busbar-mc-soap** - WSDL cache, SOAP envelopes, reply decoding and search filters
//! - **busbar-mc-resources** - Resource handlers, result sets and the client factory
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use busbar_mc_api::{ClientFactory, ClientSettings, FilterExpression, GetRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut factory = ClientFactory::new(ClientSettings::from_env()?)?;
//!     let mut client = factory.make().await?;
//!
//!     let mut subscribers = client.resource("Subscriber")?;
//!     let filter = FilterExpression::equals("Status", "Active");
//!     let result = subscribers.get(GetRequest::from(filter)).await?;
//!
//!     for subscriber in subscribers.iter(result).collect_all().await? {
//!         println!("{}", subscriber.get_str("EmailAddress")?);
//!     }
//!     Ok(())
//! }
//! ```

#[cfg(feature = "auth")]
pub use busbar_mc_auth as auth;
#[cfg(feature = "client")]
pub use busbar_mc_client as client;
#[cfg(feature = "resources")]
pub use busbar_mc_resources as resources;
#[cfg(feature = "soap")]
pub use busbar_mc_soap as soap;

#[cfg(feature = "resources")]
pub use busbar_mc_resources::{
    Client, ClientFactory, ClientSettings, Entity, Error, ErrorKind, FilterExpression,
    GetRequest, ObjectDefinition, Records, Resource, ResultSet,
};
