//! Organizations API.
//!
//! Query and manage the administrative organizations in InfluxDB. The main
//! entry point is [`Organizations::iterate`], which walks every page of the
//! list endpoint lazily: a page is requested only once the records already
//! fetched have been consumed.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use futures::Stream;
use reqwest::Url;
use serde_json::json;

use crate::config::MAX_PAGE_SIZE;
use crate::error::{Error, Result};
use crate::response::{Response, classify};
use crate::transport::{Request, Transport};
use crate::types::{ListOptions, OrgFilter, OrgPage, Organization, Secret, SecretKeys, ensure_id};

const ORGS_PATH: &str = "/api/v2/orgs";

/// Interface to the InfluxDB organizations API.
///
/// Obtained from [`Influx::orgs`](crate::Influx::orgs). Cheap to clone; all
/// clones share the client's transport.
pub struct Organizations<T> {
    transport: Arc<T>,
    page_size: u32,
}

impl<T> Clone for Organizations<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            page_size: self.page_size,
        }
    }
}

impl<T: Transport> Organizations<T> {
    pub(crate) fn new(transport: Arc<T>, page_size: u32) -> Self {
        Self {
            transport,
            page_size,
        }
    }

    /// Records requested per page while iterating.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    #[cfg(test)]
    pub(crate) fn shares_transport(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.transport, &other.transport)
    }

    /// Send a request and classify its response.
    async fn call(&self, request: Request) -> Result<Response> {
        let method = request.method.clone();
        let path = request.path.clone();
        let response = self.transport.send(request).await?;
        classify(response).inspect_err(|e| {
            tracing::warn!(method = %method, path = %path, error = %e, "Request failed");
        })
    }

    /// Iterate over every organization visible to the token.
    ///
    /// No request is made until the first call to [`OrgIter::next`]. Each
    /// call to `iterate` starts a new, independent walk.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut orgs = client.orgs().iterate(OrgFilter::new());
    /// while let Some(org) = orgs.next().await? {
    ///     println!("{} {}", org.id, org.name);
    /// }
    /// ```
    pub fn iterate(&self, filter: OrgFilter) -> OrgIter<T> {
        OrgIter::new(self.clone(), filter)
    }

    /// Iterate over every organization as an async stream.
    ///
    /// The stream ends after yielding the first error.
    pub fn stream(&self, filter: OrgFilter) -> Pin<Box<dyn Stream<Item = Result<Organization>> + Send>>
    where
        T: 'static,
    {
        let mut iter = self.iterate(filter);

        let s = stream! {
            loop {
                match iter.next().await {
                    Ok(Some(org)) => yield Ok(org),
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        };

        Box::pin(s)
    }

    /// Collect every organization into a Vec.
    pub async fn all(&self, filter: OrgFilter) -> Result<Vec<Organization>> {
        let mut iter = self.iterate(filter);
        let mut results = Vec::new();

        while let Some(org) = iter.next().await? {
            results.push(org);
        }

        Ok(results)
    }

    /// Fetch a single page of organizations.
    pub async fn list(&self, options: &ListOptions) -> Result<Vec<Organization>> {
        if options.limit == 0 || options.limit > MAX_PAGE_SIZE {
            return Err(Error::InvalidArgument(format!(
                "Limit must be within the bounds of 1 to {MAX_PAGE_SIZE} not {}",
                options.limit
            )));
        }

        let request = Request::get(ORGS_PATH)
            .query_pairs(options.filter.to_query())
            .query("limit", options.limit.to_string())
            .query("offset", options.offset.to_string());

        let page: OrgPage = self.call(request).await?.json()?;
        Ok(page.orgs)
    }

    /// Get an organization by ID.
    pub async fn get(&self, org_id: &str) -> Result<Organization> {
        ensure_id("org_id", org_id)?;
        self.call(Request::get(format!("{ORGS_PATH}/{org_id}")))
            .await?
            .json()
    }

    /// Create a new organization.
    pub async fn create(&self, name: &str, description: Option<&str>) -> Result<Organization> {
        if name.is_empty() {
            return Err(Error::InvalidArgument("'name' must not be empty".to_string()));
        }

        let mut payload = json!({ "name": name });
        if let Some(description) = description.filter(|d| !d.is_empty()) {
            payload["description"] = json!(description);
        }

        self.call(Request::post(ORGS_PATH).json(payload))
            .await?
            .json()
    }

    /// Update an organization's name and description.
    pub async fn update(
        &self,
        org_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Organization> {
        ensure_id("org_id", org_id)?;
        if name.is_empty() {
            return Err(Error::InvalidArgument("'name' must not be empty".to_string()));
        }

        let payload = json!({ "name": name, "description": description });
        self.call(Request::patch(format!("{ORGS_PATH}/{org_id}")).json(payload))
            .await?
            .json()
    }

    /// Delete an organization.
    pub async fn delete(&self, org_id: &str) -> Result<()> {
        ensure_id("org_id", org_id)?;
        self.call(Request::delete(format!("{ORGS_PATH}/{org_id}")))
            .await?;
        Ok(())
    }

    /// List the secret keys stored for an organization.
    pub async fn secrets(&self, org_id: &str) -> Result<Vec<Secret>> {
        ensure_id("org_id", org_id)?;
        let response = self
            .call(Request::get(format!("{ORGS_PATH}/{org_id}/secrets")))
            .await?;

        let keys: SecretKeys = response
            .json()
            .map_err(|_| Error::influx("Invalid server response"))?;
        Ok(keys.secrets)
    }
}

/// Where an [`OrgIter`] is in its walk.
enum IterState {
    /// Nothing requested yet.
    Start,
    /// More pages are available from this cursor.
    Next(Vec<(String, String)>),
    /// Pagination broke; the error is returned once the buffer drains.
    Failed(Error),
    /// The last page has been fetched, or an error was returned.
    Done,
}

/// Lazy, paginated walk over organizations.
///
/// Holds the pagination cursor and the records of the current page. A new
/// page is requested only when the buffered records are exhausted and the
/// previous page carried a `next` link.
pub struct OrgIter<T> {
    orgs: Organizations<T>,
    filter: OrgFilter,
    state: IterState,
    buffer: VecDeque<Organization>,
    pages: usize,
}

impl<T: Transport> OrgIter<T> {
    fn new(orgs: Organizations<T>, filter: OrgFilter) -> Self {
        Self {
            orgs,
            filter,
            state: IterState::Start,
            buffer: VecDeque::new(),
            pages: 0,
        }
    }

    /// Number of page requests issued so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    /// Return the next organization, fetching a page if needed.
    ///
    /// Returns `Ok(None)` once every page has been consumed. After an error
    /// the walk is over and further calls return `Ok(None)`.
    pub async fn next(&mut self) -> Result<Option<Organization>> {
        loop {
            if let Some(org) = self.buffer.pop_front() {
                return Ok(Some(org));
            }

            let cursor = match std::mem::replace(&mut self.state, IterState::Done) {
                IterState::Done => return Ok(None),
                IterState::Failed(e) => return Err(e),
                IterState::Start => None,
                IterState::Next(cursor) => Some(cursor),
            };

            let query = self.page_query(cursor.as_deref());
            let page = self.fetch_page(query.clone()).await?;
            self.buffer.extend(page.orgs);

            if let Some(next) = page.links.next {
                self.state = match cursor_from_link(&next) {
                    Ok(next_cursor)
                        if same_query(&self.page_query(Some(next_cursor.as_slice())), &query) =>
                    {
                        IterState::Failed(Error::influx(format!(
                            "Pagination did not advance past '{next}'"
                        )))
                    }
                    Ok(next_cursor) => {
                        tracing::trace!(next = %next, "More organizations available");
                        IterState::Next(next_cursor)
                    }
                    Err(e) => IterState::Failed(e),
                };
            }
        }
    }

    /// Query parameters for the page at `cursor` (`None` for the first page).
    fn page_query(&self, cursor: Option<&[(String, String)]>) -> Vec<(String, String)> {
        let mut query = self.filter.to_query();
        query.push(("limit".to_string(), self.orgs.page_size.to_string()));
        for (key, value) in cursor.unwrap_or_default() {
            match query.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => slot.1 = value.clone(),
                None => query.push((key.clone(), value.clone())),
            }
        }
        // Filters always win over whatever the server echoed back.
        for (key, value) in self.filter.to_query() {
            if let Some(slot) = query.iter_mut().find(|(k, _)| *k == key) {
                slot.1 = value;
            }
        }
        query
    }

    async fn fetch_page(&mut self, query: Vec<(String, String)>) -> Result<OrgPage> {
        self.pages += 1;
        tracing::trace!(page = self.pages, "Fetching organizations page");

        let request = Request::get(ORGS_PATH).query_pairs(query);
        self.orgs.call(request).await?.json()
    }
}

/// Whether two page queries ask for the same thing, ignoring order.
fn same_query(a: &[(String, String)], b: &[(String, String)]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}

/// Extract the cursor (query pairs) from a `next` link. Links may be
/// absolute or relative to the server root.
fn cursor_from_link(link: &str) -> Result<Vec<(String, String)>> {
    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(_) => Url::parse("http://influxdb.invalid")
            .and_then(|base| base.join(link))
            .map_err(|e| Error::influx(format!("Invalid pagination link '{link}': {e}")))?,
    };

    Ok(url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect())
}
