//! # mc-resources
//!
//! Resource handlers and the caller-facing client for the Marketing Cloud
//! partner API.
//!
//! A [`ClientFactory`] validates [`ClientSettings`], caches the WSDL and
//! produces [`Client`]s. A client resolves resource names (`"Subscriber"`,
//! `"DataExtensionRow"`, ...) through a [`ResourceRegistry`] to handlers that
//! describe, read, write and page through their object type.
//!
//! ## Reading
//!
//! ```rust,ignore
//! use busbar_mc_resources::{ClientFactory, ClientSettings, FilterExpression, GetRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), busbar_mc_resources::Error> {
//!     let mut factory = ClientFactory::new(ClientSettings::from_env()?)?;
//!     let mut client = factory.make().await?;
//!
//!     let mut sends = client.resource("Send")?;
//!     let result = sends
//!         .get(GetRequest::new().with_filter(FilterExpression::equals("EmailName", "Welcome")))
//!         .await?;
//!     let mut cursor = sends.iter(result);
//!     while let Some(send) = cursor.next().await? {
//!         println!("{}", send.get_str("ID")?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Data extension rows
//!
//! ```rust,ignore
//! use busbar_mc_resources::{DataExtensionRowHandler, GetRequest, Records};
//!
//! let mut rows = client.resource("DataExtensionRow")?;
//! rows.handler_mut::<DataExtensionRowHandler>()?
//!     .set_customer_key("subscribers-de")
//!     .set_name("Subscribers");
//! rows.add(Records::try_from(serde_json::json!({"Email": "a@example.com"}))?).await?;
//! ```
//!
//! ## Errors
//!
//! Every operation returns [`Error`]. Use
//! [`Error::is_api_request_error`] and [`Error::is_handler_error`] to branch
//! on the broad category, or match [`ErrorKind`] for detail.

mod client;
mod config;
mod entity;
mod envelope;
mod error;
mod factory;
mod handler;
pub mod handlers;
mod registry;
mod result_set;
mod session;

pub use client::{Client, Resource};
pub use config::{ClientSettings, DEFAULT_REST_URL};
pub use entity::{
    Entity, EntityProperty, ObjectDefinition, PropertyDescriptor, DEFAULT_ENTITY_TYPE,
    UNDECLARED_PLATFORM_PROPERTY,
};
pub use envelope::{Envelope, RawReply, MORE_DATA_AVAILABLE};
pub use error::{Error, ErrorKind, Result};
pub use factory::ClientFactory;
pub use handler::{GetRequest, ObjectHandler, Records, ResourceHandler};
pub use handlers::{
    DataExtensionFieldHandler, DataExtensionHandler, DataExtensionRowHandler, RowProtocol,
};
pub use registry::{ResourceBinding, ResourceRegistry, STANDARD_OBJECT_TYPES};
pub use result_set::{EntityCursor, ResultSet};
pub use session::Session;

pub use busbar_mc_client::RequestMethod;
pub use busbar_mc_soap::{FilterExpression, FilterValue};
