//! Typed records decoded from InfluxDB API responses.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Lifecycle status of an organization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OrgStatus {
    /// Organization is active (the server's default).
    #[default]
    Active,
    /// Organization is inactive.
    Inactive,
    /// A status this client does not know about.
    Other(String),
}

impl OrgStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrgStatus::Active => "active",
            OrgStatus::Inactive => "inactive",
            OrgStatus::Other(s) => s,
        }
    }
}

impl From<String> for OrgStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "active" => Self::Active,
            "inactive" => Self::Inactive,
            _ => Self::Other(value),
        }
    }
}

impl<'de> Deserialize<'de> for OrgStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

impl Serialize for OrgStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for OrgStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An InfluxDB organization.
///
/// Decoded from JSON such as:
///
/// ```json
/// {
///     "links": {
///         "self": "/api/v2/orgs/1",
///         "members": "/api/v2/orgs/1/members",
///         "buckets": "/api/v2/buckets?org=myorg"
///     },
///     "id": "abcdef0123456789",
///     "name": "example.com",
///     "description": "Example Company",
///     "createdAt": "2019-08-24T14:15:22Z",
///     "updatedAt": "2019-08-24T14:15:22Z",
///     "status": "active"
/// }
/// ```
///
/// Fields missing from older servers decode to `None` or an empty value.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    /// Organization ID (16 hex characters).
    #[serde(deserialize_with = "id_syntax")]
    pub id: String,
    /// Organization name.
    #[serde(deserialize_with = "non_empty")]
    pub name: String,
    /// Longer description. An empty string decodes to `None`.
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: OrgStatus,
    /// Relation name to URL, e.g. `"buckets"` to `/api/v2/buckets?org=myorg`.
    #[serde(default)]
    pub links: BTreeMap<String, String>,
    /// Any other fields (owners, labels, ...) passed through as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Organization {
    /// Whether the organization is active.
    pub fn is_active(&self) -> bool {
        self.status == OrgStatus::Active
    }

    /// Get a link by relation name.
    pub fn link(&self, relation: &str) -> Option<&str> {
        self.links.get(relation).map(String::as_str)
    }
}

fn id_syntax<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let value = String::deserialize(deserializer)?;
    if is_id(&value) {
        Ok(value)
    } else {
        Err(D::Error::custom(format!(
            "id does not match ID syntax (16 digit hex): {value:?}"
        )))
    }
}

fn non_empty<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let value = String::deserialize(deserializer)?;
    if value.is_empty() {
        return Err(D::Error::custom("name must not be empty"));
    }
    Ok(value)
}

fn empty_as_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Pagination links attached to a list response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PageLinks {
    #[serde(rename = "self", default)]
    pub self_link: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
}

/// One page of the organizations list endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OrgPage {
    #[serde(default)]
    pub links: PageLinks,
    #[serde(default)]
    pub orgs: Vec<Organization>,
}

/// Secret key name stored for an organization.
///
/// The server only ever returns key names, but they are still treated as
/// sensitive: `Debug` does not show them.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key value.
    pub fn value(&self) -> &str {
        &self.0
    }

    /// Key returned as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(XXX)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SecretKeys {
    pub secrets: Vec<Secret>,
}

/// Filters for listing organizations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrgFilter {
    /// Only the organization with this name.
    pub org: Option<String>,
    /// Only the organization with this ID.
    pub org_id: Option<String>,
    /// Only organizations visible to this user ID.
    pub user_id: Option<String>,
    /// Sort by name descending instead of ascending.
    pub descending: bool,
}

impl OrgFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by organization name.
    pub fn org(mut self, name: impl Into<String>) -> Self {
        self.org = Some(name.into());
        self
    }

    /// Filter by organization ID.
    pub fn org_id(mut self, id: impl Into<String>) -> Self {
        self.org_id = Some(id.into());
        self
    }

    /// Filter by user ID.
    pub fn user_id(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }

    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    /// Query parameters for this filter. Unset fields are omitted.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if self.descending {
            query.push(("descending".to_string(), "true".to_string()));
        }
        if let Some(org) = &self.org {
            query.push(("org".to_string(), org.clone()));
        }
        if let Some(id) = &self.org_id {
            query.push(("orgID".to_string(), id.clone()));
        }
        if let Some(id) = &self.user_id {
            query.push(("userID".to_string(), id.clone()));
        }
        query
    }
}

/// Options for fetching a single page with
/// [`Organizations::list`](crate::Organizations::list).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListOptions {
    pub filter: OrgFilter,
    /// Page size, 1 to 100 (default 20).
    pub limit: u32,
    /// Number of records to skip.
    pub offset: u64,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            filter: OrgFilter::default(),
            limit: 20,
            offset: 0,
        }
    }
}

/// Check that `value` is a syntactically valid InfluxDB ID (16 lowercase hex
/// digits).
pub fn ensure_id(name: &str, value: &str) -> Result<()> {
    if is_id(value) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "'{name}' does not match ID syntax (16 digit hex): {value:?}"
        )))
    }
}

fn is_id(value: &str) -> bool {
    value.len() == 16
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
