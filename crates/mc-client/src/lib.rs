//! # mc-client
//!
//! Core HTTP client infrastructure for the Marketing Cloud APIs.
//!
//! This crate provides the HTTP layer every other crate builds on:
//! - A `reqwest` backed client with configurable timeouts and pooling
//! - Request building for JSON and SOAP (XML) bodies
//! - Response wrapping that keeps the status code visible to callers
//! - Request/response tracing
//!
//! The client performs exactly one round trip per request. It does not retry
//! and it does not turn non-2xx status codes into errors: the SOAP layer needs
//! the raw status code, and the token endpoint treats anything but 200 as an
//! authentication failure.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │           (mc-auth, mc-soap, mc-resources)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    McHttpClient                             │
//! │  - Single round trip, status code preserved                 │
//! │  - Request building (JSON, XML, query, bearer)              │
//! │  - Response handling                                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_mc_client::{ClientConfig, McHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), busbar_mc_client::Error> {
//!     let client = McHttpClient::new(ClientConfig::default())?;
//!
//!     let response = client
//!         .execute(client.get("https://www.exacttargetapis.com/platform/v1/endpoints/soap"))
//!         .await?;
//!
//!     println!("status: {}", response.status());
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
pub mod security;

pub use client::McHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use request::{RequestBody, RequestBuilder, RequestMethod};
pub use response::Response;

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("busbar-mc-api/", env!("CARGO_PKG_VERSION"));
