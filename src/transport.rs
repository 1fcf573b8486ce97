//! Authenticated HTTP requests against an InfluxDB server.
//!
//! [`Transport`] is the seam between the typed resources and the wire. The
//! production implementation is [`HttpTransport`], built on `reqwest`; tests
//! can plug in anything that turns a [`Request`] into a [`Response`].

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, Url};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::response::Response;

/// A single API request, relative to the server's base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// API path, e.g. `/api/v2/orgs`.
    pub path: String,
    /// Query string parameters, sent in order.
    pub query: Vec<(String, String)>,
    /// Optional JSON body.
    pub body: Option<serde_json::Value>,
    /// Per-request deadline, on top of any client-wide timeout.
    pub timeout: Option<Duration>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append several query parameters.
    pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set a deadline for this request only.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Look up the first value of a query parameter.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Something that can execute a [`Request`].
///
/// Implementations return a [`Response`] for every HTTP status, and fail
/// only with [`Error::Network`] when no response was obtained. Errors are
/// never retried here.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;
}

/// `reqwest`-backed transport that attaches the API token to every call.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
    auth: HeaderValue,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"***REDACTED***")
            .finish()
    }
}

impl HttpTransport {
    /// Build a transport from a validated configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = config.validate()?;

        let auth = auth_header(&config.token)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| Error::InvalidArgument(format!("Invalid user agent: {e}")))?;
        headers.insert(USER_AGENT, user_agent);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::InvalidArgument(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            auth,
        })
    }

    /// Build a transport around an existing `reqwest` client.
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_http_client(http: reqwest::Client, base_url: Url, token: &str) -> Result<Self> {
        Ok(Self {
            http,
            base_url,
            auth: auth_header(token)?,
        })
    }

    /// Get the base URL.
    pub fn url(&self) -> &Url {
        &self.base_url
    }

    /// Build the full URL for an API path, keeping any path prefix of the
    /// base URL (e.g. a reverse proxy mount point).
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn execute(&self, request: Request) -> Result<Response> {
        let endpoint = self.endpoint(&request.path);
        let start = Instant::now();

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            "Sending request"
        );

        let mut builder = self
            .http
            .request(request.method.clone(), &endpoint)
            .header(AUTHORIZATION, self.auth.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let reply = builder.send().await?;
        let code = reply.status().as_u16();
        let bytes = reply.bytes().await?;

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = code,
            duration_ms = %start.elapsed().as_millis(),
            "Received response"
        );

        Ok(Response::from_parts(code, &bytes))
    }
}

/// Build the `Authorization` header for a token. The value is marked
/// sensitive so it never shows up in `Debug` output.
fn auth_header(token: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Token {token}"))
        .map_err(|_| Error::InvalidArgument("Token is not a valid header value".to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

impl Transport for HttpTransport {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        self.execute(request)
    }
}
