//! Client configuration and builder.

use std::fmt;
use std::time::Duration;

use reqwest::Url;

use crate::error::{Error, Result};

/// Largest page the organizations endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Configuration for an [`Influx`](crate::Influx) client.
///
/// The `Debug` implementation masks the token.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the InfluxDB server, e.g. `http://localhost:8086`.
    pub base_url: String,
    /// API token sent as `Authorization: Token <token>`.
    pub token: String,
    /// Overall timeout applied to every request (default: none).
    pub timeout: Option<Duration>,
    /// User-Agent header value.
    pub user_agent: String,
    /// Number of records requested per page while iterating (default: 100).
    pub page_size: u32,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"***REDACTED***")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder(base_url: impl Into<String>, token: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url, token)
    }

    /// Validate the configuration and return the parsed base URL.
    pub fn validate(&self) -> Result<Url> {
        let url = parse_base_url(&self.base_url)?;

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::InvalidArgument(format!(
                "page_size must be within 1..={MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }

        Ok(url)
    }
}

/// Parse and check an InfluxDB base URL.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| Error::InvalidArgument(format!("Invalid InfluxDB URL '{raw}': {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(Error::InvalidArgument(format!(
                "Invalid InfluxDB URL '{raw}': unsupported scheme '{other}'"
            )));
        }
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(Error::InvalidArgument(format!(
            "Invalid InfluxDB URL '{raw}': missing host"
        )));
    }

    Ok(url)
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            config: ClientConfig {
                base_url: base_url.into(),
                token: token.into(),
                timeout: None,
                user_agent: format!("influxdb2-orgs/{}", env!("CARGO_PKG_VERSION")),
                page_size: MAX_PAGE_SIZE,
            },
        }
    }

    /// Set a timeout for every request made by the client.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set how many organizations are requested per page.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
