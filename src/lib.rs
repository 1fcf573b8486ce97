//! # influxdb2-orgs
//!
//! Async client for the InfluxDB 2.x HTTP API.
//!
//! The client authenticates every request with an API token, decodes replies
//! into typed records and reports failures through a small error taxonomy:
//!
//! - [`Error::Network`]: no response was obtained (DNS, refused, TLS, timeout)
//! - [`InfluxError::AuthenticationDenied`]: the server answered 401
//! - [`InfluxError::Http`]: any other non-2xx answer, with the decoded body
//! - [`InfluxError::Other`]: a reply that could not be mapped to a record
//!
//! Match `Error::Influx(_)` to handle every server-side failure at once.
//!
//! ## Quick Start
//!
//! ```ignore
//! use influxdb2_orgs::OrgFilter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = influxdb2_orgs::connect("http://localhost:8086", "my-token")?;
//!
//!     // Pages are fetched on demand as the walk advances.
//!     let mut orgs = client.orgs().iterate(OrgFilter::new().org("my-org"));
//!     while let Some(org) = orgs.next().await? {
//!         println!("{} {} active={}", org.id, org.name, org.is_active());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! The library emits `tracing` events (requests at `debug`, failures at
//! `warn`) and never logs the token.

pub mod client;
pub mod config;
pub mod error;
pub mod orgs;
pub mod response;
pub mod transport;
pub mod types;

// Re-export main types at crate root
pub use client::Influx;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{ApiErrorBody, Error, ErrorKind, InfluxError, Result};
pub use orgs::{OrgIter, Organizations};
pub use response::{Body, Response, classify};
pub use transport::{HttpTransport, Request, Transport};
pub use types::{ListOptions, OrgFilter, OrgPage, OrgStatus, Organization, PageLinks, Secret};

/// Create a client for the InfluxDB server at `url`, authenticating with
/// `token`.
///
/// No network call is made. Fails with [`Error::InvalidArgument`] if `url`
/// is not a valid `http`/`https` URL.
pub fn connect(url: impl Into<String>, token: impl Into<String>) -> Result<Influx> {
    Influx::new(ClientConfig::builder(url, token).build()?)
}
