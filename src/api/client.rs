use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use super::auth::{request_token, AccessToken};
use super::custom_reports::CustomReports;
use super::error::{ApiError, Result};
use super::models::{Page, Pagination};
use super::reports::Reports;
use super::resources::{AdGroups, Campaigns, Keywords, NegativeScope, Negatives};
use crate::core::config::Settings;

/// Page size used when walking every page of a list endpoint
pub(crate) const PAGE_SIZE: u32 = 1000;

const WAIT_ATTEMPTS: u32 = 10;
const WAIT_DELAY: Duration = Duration::from_millis(500);

/// Response envelope shared by every endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    data: Option<T>,
    pagination: Option<Pagination>,
}

impl<T> Envelope<T> {
    pub fn into_data(self, path: &str) -> Result<T> {
        self.data.ok_or_else(|| ApiError::EmptyResponse {
            path: path.to_string(),
        })
    }
}

impl<T> Envelope<Vec<T>> {
    pub fn into_page(self) -> Page<T> {
        Page {
            data: self.data.unwrap_or_default(),
            pagination: self.pagination,
        }
    }
}

/// Blocking client for the Search Ads API
///
/// The access token is obtained on first use and reused until it is about
/// to expire.
pub struct Client {
    http: HttpClient,
    settings: Settings,
    token: RefCell<Option<AccessToken>>,
}

impl Client {
    pub fn new(settings: Settings) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(settings.timeout)
            .user_agent(user_agent())
            .build()?;
        Ok(Self {
            http,
            settings,
            token: RefCell::new(None),
        })
    }

    pub fn org_id(&self) -> u64 {
        self.settings.org_id
    }

    pub fn campaigns(&self) -> Campaigns<'_> {
        Campaigns::new(self)
    }

    pub fn ad_groups(&self, campaign_id: i64) -> AdGroups<'_> {
        AdGroups::new(self, campaign_id)
    }

    pub fn keywords(&self, campaign_id: i64, ad_group_id: i64) -> Keywords<'_> {
        Keywords::new(self, campaign_id, ad_group_id)
    }

    pub fn negatives(&self, scope: NegativeScope) -> Negatives<'_> {
        Negatives::new(self, scope)
    }

    pub fn reports(&self) -> Reports<'_> {
        Reports::new(self)
    }

    pub fn custom_reports(&self) -> CustomReports<'_> {
        CustomReports::new(self)
    }

    fn bearer(&self) -> Result<String> {
        let mut slot = self.token.borrow_mut();
        if let Some(token) = slot.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }
        let token = request_token(&self.http, &self.settings)?;
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.api_base_url.trim_end_matches('/'), path)
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder, method: &str, path: &str) -> Result<Envelope<T>> {
        let token = self.bearer()?;
        let response = request
            .bearer_auth(token)
            .header("X-AP-Context", format!("orgId={}", self.settings.org_id))
            .send()?;

        let status = response.status();
        let body = response.text()?;
        debug!(method, path, status = status.as_u16(), "api request");

        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body));
        }
        if body.trim().is_empty() {
            return Ok(Envelope {
                data: None,
                pagination: None,
            });
        }
        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }

    pub(crate) fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Envelope<T>> {
        self.send(self.http.get(self.url(path)).query(query), "GET", path)
    }

    pub(crate) fn post<B, T>(&self, path: &str, body: &B) -> Result<Envelope<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.http.post(self.url(path)).json(body), "POST", path)
    }

    pub(crate) fn put<B, T>(&self, path: &str, body: &B) -> Result<Envelope<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.http.put(self.url(path)).json(body), "PUT", path)
    }

    pub(crate) fn delete(&self, path: &str) -> Result<()> {
        self.send::<serde_json::Value>(self.http.delete(self.url(path)), "DELETE", path)?;
        Ok(())
    }

    /// One page of a list endpoint
    pub(crate) fn get_page<T: DeserializeOwned>(&self, path: &str, limit: u32, offset: usize) -> Result<Page<T>> {
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
        Ok(self.get::<Vec<T>>(path, &query)?.into_page())
    }

    /// Every item of a list endpoint, walking pages until the total is reached
    pub(crate) fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        collect_pages(|offset| self.get_page::<T>(path, PAGE_SIZE, offset))
    }

    /// Fetch a downloadable artifact (report CSV) as text
    ///
    /// Credentials are only attached when the URL points at the API host.
    pub(crate) fn download(&self, url: &str) -> Result<String> {
        let mut request = self.http.get(url);
        if url.starts_with(&self.settings.api_base_url) {
            request = request
                .bearer_auth(self.bearer()?)
                .header("X-AP-Context", format!("orgId={}", self.settings.org_id));
        }
        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;
        debug!(status = status.as_u16(), "downloaded report");
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body));
        }
        Ok(body)
    }
}

fn user_agent() -> String {
    format!("asa/{}", env!("CARGO_PKG_VERSION"))
}

/// Walk pages from offset 0 until the reported total is read
///
/// `fetch` receives the offset of the next page. An empty page stops the
/// walk even when the server reported more results.
pub(crate) fn collect_pages<T, F>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(usize) -> Result<Page<T>>,
{
    let mut items: Vec<T> = Vec::new();
    loop {
        let page = fetch(items.len())?;
        let total = page.total() as usize;
        let fetched = page.data.len();
        items.extend(page.data);
        if fetched == 0 || items.len() >= total {
            return Ok(items);
        }
    }
}

/// Poll a lookup until the resource exists
///
/// Newly created resources can take a moment to become readable. `NotFound`
/// is retried every 0.5s, up to 10 attempts; any other error is returned
/// immediately.
pub fn wait_for<T, F>(mut lookup: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 1;
    loop {
        match lookup() {
            Err(e) if e.is_not_found() && attempt < WAIT_ATTEMPTS => {
                warn!(attempt, "resource not available yet, retrying");
                thread::sleep(WAIT_DELAY);
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> ApiError {
        ApiError::from_status(404, "")
    }

    /// Serve `total` numbered rows, `per_page` at a time, reporting `reported` as the total
    fn pages(total: usize, per_page: usize, reported: u64) -> impl FnMut(usize) -> Result<Page<usize>> {
        move |offset| {
            let end = total.min(offset + per_page);
            Ok(Page {
                data: (offset..end).collect(),
                pagination: Some(Pagination {
                    total_results: reported,
                    start_index: offset as u64,
                    items_per_page: per_page as u64,
                }),
            })
        }
    }

    #[test]
    fn test_collect_pages_empty() {
        let mut calls = 0;
        let mut fetch = pages(0, 1000, 0);
        let items = collect_pages(|offset| {
            calls += 1;
            fetch(offset)
        })
        .unwrap();
        assert!(items.is_empty());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_collect_pages_exactly_one_page() {
        let mut offsets = Vec::new();
        let mut fetch = pages(1000, 1000, 1000);
        let items = collect_pages(|offset| {
            offsets.push(offset);
            fetch(offset)
        })
        .unwrap();
        assert_eq!(items.len(), 1000);
        assert_eq!(offsets, vec![0]);
    }

    #[test]
    fn test_collect_pages_steps_offset_across_pages() {
        let mut offsets = Vec::new();
        let mut fetch = pages(2500, PAGE_SIZE as usize, 2500);
        let items = collect_pages(|offset| {
            offsets.push(offset);
            fetch(offset)
        })
        .unwrap();
        assert_eq!(offsets, vec![0, 1000, 2000]);
        assert_eq!(items.len(), 2500);
        assert_eq!(items[0], 0);
        assert_eq!(items[2499], 2499);
    }

    #[test]
    fn test_collect_pages_stops_when_server_runs_dry() {
        let mut calls = 0;
        let mut fetch = pages(1200, 1000, 5000);
        let items = collect_pages(|offset| {
            calls += 1;
            fetch(offset)
        })
        .unwrap();
        assert_eq!(items.len(), 1200);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_collect_pages_propagates_errors() {
        let result: Result<Vec<usize>> = collect_pages(|_| Err(ApiError::from_status(500, "")));
        assert!(matches!(result, Err(ApiError::Status { status: 500, .. })));
    }

    #[test]
    fn test_wait_for_retries_not_found() {
        let mut calls = 0;
        let result = wait_for(|| {
            calls += 1;
            if calls < 3 {
                Err(not_found())
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_wait_for_propagates_other_errors() {
        let mut calls = 0;
        let result: Result<()> = wait_for(|| {
            calls += 1;
            Err(ApiError::from_status(500, ""))
        });
        assert!(matches!(result, Err(ApiError::Status { status: 500, .. })));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_envelope_decoding() {
        let env: Envelope<Vec<serde_json::Value>> = serde_json::from_str(
            r#"{"data":[{"id":1}],"pagination":{"totalResults":5,"startIndex":0,"itemsPerPage":1},"error":null}"#,
        )
        .unwrap();
        let page = env.into_page();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.total(), 5);

        let empty: Envelope<serde_json::Value> = serde_json::from_str(r#"{"data":null}"#).unwrap();
        assert!(matches!(
            empty.into_data("/campaigns/1"),
            Err(ApiError::EmptyResponse { .. })
        ));
    }
}
