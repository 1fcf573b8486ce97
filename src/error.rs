//! Error types for influxdb2-orgs.
//!
//! Server-reported failures are grouped under [`InfluxError`], so callers can
//! match `Error::Influx(_)` to catch all of them, or match a specific
//! [`InfluxError`] variant for targeted handling. [`Error::Network`] is kept
//! apart: it means no HTTP response was ever obtained.

use serde::Deserialize;
use thiserror::Error;

use crate::response::Body;

/// Error type for influxdb2-orgs operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection, DNS, TLS or timeout failure before any response arrived.
    #[error("Network error: {message}")]
    Network {
        /// Description of the transport failure.
        message: String,
    },

    /// The server answered, but the answer is a failure.
    #[error(transparent)]
    Influx(#[from] InfluxError),

    /// A caller-supplied argument was rejected before any request was sent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Failures reported by (or decoded from) an InfluxDB server.
#[derive(Error, Debug)]
pub enum InfluxError {
    /// The server rejected the token (HTTP 401).
    #[error("Authentication denied: {message}")]
    AuthenticationDenied {
        /// Message from the server, or a generic one.
        message: String,
    },

    /// Any other non-2xx response.
    #[error("HTTP error {code}: {}", .data.summary())]
    Http {
        /// HTTP status code.
        code: u16,
        /// Decoded error body.
        data: Body,
    },

    /// Anything else, e.g. a payload that does not fit the expected record.
    #[error("{message}")]
    Other {
        /// Description of what went wrong.
        message: String,
    },
}

/// Flat tag for an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    AuthenticationDenied,
    Http,
    Influx,
    InvalidArgument,
}

impl ErrorKind {
    /// Whether this kind refines the general InfluxDB error.
    pub fn is_influx(self) -> bool {
        matches!(self, Self::AuthenticationDenied | Self::Http | Self::Influx)
    }
}

/// Standard error payload returned by the InfluxDB 2.x API.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ApiErrorBody {
    /// InfluxDB error code, e.g. `"not found"` or `"invalid"`.
    pub code: String,
    /// Human readable message.
    #[serde(default)]
    pub message: String,
    /// Logical operation that failed.
    #[serde(default)]
    pub op: Option<String>,
    /// Nested error description.
    #[serde(default)]
    pub err: Option<String>,
}

impl Error {
    /// Create a network error from anything printable.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a general InfluxDB error.
    pub fn influx(message: impl Into<String>) -> Self {
        Self::Influx(InfluxError::Other {
            message: message.into(),
        })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::Influx(InfluxError::AuthenticationDenied { .. }) => {
                ErrorKind::AuthenticationDenied
            }
            Self::Influx(InfluxError::Http { .. }) => ErrorKind::Http,
            Self::Influx(InfluxError::Other { .. }) => ErrorKind::Influx,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    /// Whether the error came from a server response (or its decoding).
    pub fn is_influx(&self) -> bool {
        self.kind().is_influx()
    }

    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Influx(err) => err.status(),
            _ => None,
        }
    }
}

impl InfluxError {
    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationDenied { .. } => Some(401),
            Self::Http { code, .. } => Some(*code),
            Self::Other { .. } => None,
        }
    }

    /// Decode the body of an HTTP error into InfluxDB's standard error
    /// payload. Returns `None` when the body has some other shape.
    pub fn api_error(&self) -> Option<ApiErrorBody> {
        match self {
            Self::Http {
                data: Body::Json(value),
                ..
            } => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Strip the URL; it is already in the debug log and may be long.
        let err = err.without_url();
        if err.is_builder() {
            // The request could not even be built; nothing went on the wire.
            Self::InvalidArgument(format!("Invalid request: {err}"))
        } else {
            Self::network(err.to_string())
        }
    }
}

/// Result type alias for influxdb2-orgs operations.
pub type Result<T> = std::result::Result<T, Error>;
