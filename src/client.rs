//! InfluxDB client handle.
//!
//! This module provides [`Influx`], the root handle returned by
//! [`connect`](crate::connect). It owns the transport and hands out typed
//! resource accessors such as [`Influx::orgs`].

use std::sync::Arc;

use crate::config::{ClientConfig, MAX_PAGE_SIZE, parse_base_url};
use crate::error::Result;
use crate::orgs::Organizations;
use crate::response::Response;
use crate::transport::{HttpTransport, Request, Transport};

/// InfluxDB 2.x client.
///
/// Creating a client makes no network call. Cloning is cheap and clones share
/// the same transport, so one client can drive any number of independent
/// iterations, including from several tasks at once.
///
/// # Example
///
/// ```ignore
/// use influxdb2_orgs::OrgFilter;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let token = std::env::var("INFLUX_TOKEN")?;
///     let client = influxdb2_orgs::connect("http://localhost:8086", token)?;
///
///     let mut orgs = client.orgs().iterate(OrgFilter::new());
///     while let Some(org) = orgs.next().await? {
///         println!("{}: {}", org.id, org.name);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Influx<T = HttpTransport> {
    transport: Arc<T>,
    page_size: u32,
}

impl<T> Clone for Influx<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            page_size: self.page_size,
        }
    }
}

impl Influx<HttpTransport> {
    /// Create a client from a configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self {
            transport: Arc::new(transport),
            page_size: config.page_size,
        })
    }

    /// Create a client with a custom reqwest client.
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_http_client(
        http: reqwest::Client,
        url: impl AsRef<str>,
        token: impl AsRef<str>,
    ) -> Result<Self> {
        let base_url = parse_base_url(url.as_ref())?;
        Ok(Self::with_transport(HttpTransport::with_http_client(
            http,
            base_url,
            token.as_ref(),
        )?))
    }

    /// Get the base URL.
    pub fn url(&self) -> &reqwest::Url {
        self.transport.url()
    }
}

impl<T: Transport> Influx<T> {
    /// Create a client over any [`Transport`].
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Get the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Organizations API.
    pub fn orgs(&self) -> Organizations<T> {
        Organizations::new(Arc::clone(&self.transport), self.page_size)
    }

    /// Send a raw request.
    ///
    /// The response is returned for every HTTP status; pass it through
    /// [`classify`](crate::classify) to turn failures into errors.
    pub async fn request(&self, request: Request) -> Result<Response> {
        self.transport.send(request).await
    }
}
