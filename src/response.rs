//! Normalized HTTP replies.
//!
//! Every transport call produces one [`Response`]: the status code, passed
//! through untouched, and a best-effort decoded [`Body`]. [`classify`] then
//! turns the response into either a success or a typed error.

use serde::de::DeserializeOwned;

use crate::error::{Error, InfluxError, Result};

/// Decoded body of an HTTP reply.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// The body was valid JSON.
    Json(serde_json::Value),
    /// The body was not JSON; raw bytes are kept as-is.
    Raw(Vec<u8>),
    /// The body was empty.
    Empty,
}

impl Body {
    /// Decode raw body bytes. Never fails: non-JSON stays raw.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::Empty;
        }
        match serde_json::from_slice(bytes) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Raw(bytes.to_vec()),
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Short human readable form, used in error messages.
    pub(crate) fn summary(&self) -> String {
        match self {
            Self::Json(value) => match value.get("message").and_then(|m| m.as_str()) {
                Some(message) => message.to_string(),
                None => value.to_string(),
            },
            Self::Raw(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Self::Empty => "<empty body>".to_string(),
        }
    }
}

/// A normalized HTTP reply.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    /// HTTP status code.
    pub code: u16,
    /// Decoded body.
    pub data: Body,
}

impl Response {
    /// Build a response from a raw status code and body bytes.
    pub fn from_parts(code: u16, bytes: &[u8]) -> Self {
        Self {
            code,
            data: Body::from_bytes(bytes),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// Decode the JSON body into `T`.
    ///
    /// A body that is not JSON, or JSON of the wrong shape, is reported as
    /// [`InfluxError::Other`].
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.data {
            Body::Json(value) => T::deserialize(value).map_err(|e| {
                Error::influx(format!("Unexpected response payload: {e}"))
            }),
            Body::Raw(_) => Err(Error::influx("Response body is not JSON")),
            Body::Empty => Err(Error::influx("Response body is empty")),
        }
    }
}

/// Map a response onto the error taxonomy.
///
/// 2xx responses pass through unchanged. 401 becomes
/// [`InfluxError::AuthenticationDenied`]; every other code becomes
/// [`InfluxError::Http`] carrying the decoded body.
pub fn classify(response: Response) -> Result<Response> {
    if response.is_success() {
        return Ok(response);
    }

    let err = if response.code == 401 {
        let message = response
            .data
            .as_json()
            .and_then(|v| v.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or("Authentication Denied")
            .to_string();
        InfluxError::AuthenticationDenied { message }
    } else {
        InfluxError::Http {
            code: response.code,
            data: response.data,
        }
    };

    Err(err.into())
}
