//! Blob store reached over its REST API.
//!
//! Objects are written with `PUT {api}/{pathname}` and located with
//! `GET {api}?prefix=...`; contents are then fetched from the public URL the
//! store reports.

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Client as HttpClient;
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use super::{BackendKind, DocumentStore};
use crate::errors::PortfolioError;

const API_VERSION: &str = "7";

/// Smallest CDN max-age the blob API accepts, in seconds.
pub const MIN_CACHE_MAX_AGE: u32 = 60;

const PATHNAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'.')
    .remove(b'-')
    .remove(b'_');

/// Object metadata returned by put and list calls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobObject {
    pub url: String,
    pub pathname: String,
    #[serde(default)]
    pub download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub blobs: Vec<BlobObject>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutOptions<'a> {
    pub content_type: &'a str,
    pub add_random_suffix: bool,
    pub allow_overwrite: bool,
    /// `None` keeps the store's default CDN caching.
    pub cache_max_age: Option<u32>,
}

#[derive(Clone)]
pub struct BlobClient {
    http: HttpClient,
    api_url: String,
    token: String,
}

impl BlobClient {
    pub fn new(http: HttpClient, api_url: &str, token: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    #[must_use]
    pub fn object_url(&self, pathname: &str) -> String {
        let encoded = utf8_percent_encode(pathname.trim_start_matches('/'), PATHNAME);
        format!("{}/{encoded}", self.api_url)
    }

    /// # Errors
    ///
    /// Returns a storage error if the API URL is invalid.
    pub fn list_url(&self, prefix: &str) -> Result<Url, PortfolioError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| blob_error(format!("invalid API URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("prefix", prefix)
            .append_pair("limit", "1000");
        Ok(url)
    }

    /// # Errors
    ///
    /// Returns a storage error if the upload is rejected or the reply cannot
    /// be parsed.
    pub async fn put(
        &self,
        pathname: &str,
        body: Vec<u8>,
        options: PutOptions<'_>,
    ) -> Result<BlobObject, PortfolioError> {
        let mut request = self
            .http
            .put(self.object_url(pathname))
            .bearer_auth(&self.token)
            .header("x-api-version", API_VERSION)
            .header("x-content-type", options.content_type)
            .header("x-add-random-suffix", flag(options.add_random_suffix))
            .header("x-allow-overwrite", flag(options.allow_overwrite));
        if let Some(max_age) = options.cache_max_age {
            request = request.header("x-cache-control-max-age", max_age.to_string());
        }

        let resp = request
            .body(body)
            .send()
            .await
            .map_err(|e| blob_error(format!("put {pathname}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(blob_error(format!("put {pathname}: status {status}: {text}")));
        }

        resp.json::<BlobObject>()
            .await
            .map_err(|e| blob_error(format!("put {pathname}: response parse: {e}")))
    }

    /// Finds the object stored at exactly `pathname`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the listing fails.
    pub async fn find(&self, pathname: &str) -> Result<Option<BlobObject>, PortfolioError> {
        let resp = self
            .http
            .get(self.list_url(pathname)?)
            .bearer_auth(&self.token)
            .header("x-api-version", API_VERSION)
            .send()
            .await
            .map_err(|e| blob_error(format!("list {pathname}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(blob_error(format!("list {pathname}: status {status}")));
        }

        let listing: ListResponse = resp
            .json()
            .await
            .map_err(|e| blob_error(format!("list {pathname}: response parse: {e}")))?;
        Ok(find_exact(listing, pathname))
    }

    /// # Errors
    ///
    /// Returns a storage error if the object cannot be downloaded.
    pub async fn fetch_text(&self, object: &BlobObject) -> Result<String, PortfolioError> {
        let resp = self
            .http
            .get(fresh_url(&object.url)?)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| blob_error(format!("fetch {}: {e}", object.pathname)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(blob_error(format!(
                "fetch {}: status {status}",
                object.pathname
            )));
        }
        resp.text()
            .await
            .map_err(|e| blob_error(format!("fetch {}: {e}", object.pathname)))
    }
}

/// Listing is prefix-based; only an exact pathname match counts.
#[must_use]
pub fn find_exact(listing: ListResponse, pathname: &str) -> Option<BlobObject> {
    listing.blobs.into_iter().find(|b| b.pathname == pathname)
}

/// Appends a unique query parameter so the CDN cannot serve a copy cached
/// before the latest write.
///
/// # Errors
///
/// Returns a storage error if `object_url` is not a valid URL.
pub fn fresh_url(object_url: &str) -> Result<Url, PortfolioError> {
    let mut url = Url::parse(object_url)
        .map_err(|e| blob_error(format!("invalid object URL {object_url}: {e}")))?;
    url.query_pairs_mut()
        .append_pair("v", &Uuid::new_v4().simple().to_string());
    Ok(url)
}

fn flag(on: bool) -> &'static str {
    if on { "1" } else { "0" }
}

fn blob_error(message: String) -> PortfolioError {
    PortfolioError::storage(BackendKind::Blob, message)
}

pub struct BlobStore {
    client: BlobClient,
    pathname: String,
}

impl BlobStore {
    pub fn new(client: BlobClient, pathname: impl Into<String>) -> Self {
        Self {
            client,
            pathname: pathname.into(),
        }
    }
}

#[async_trait]
impl DocumentStore for BlobStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Blob
    }

    async fn load(&self) -> Result<Option<String>, PortfolioError> {
        match self.client.find(&self.pathname).await? {
            Some(object) => self.client.fetch_text(&object).await.map(Some),
            None => Ok(None),
        }
    }

    async fn store(&self, contents: &str) -> Result<(), PortfolioError> {
        self.client
            .put(
                &self.pathname,
                contents.as_bytes().to_vec(),
                PutOptions {
                    content_type: "application/json",
                    add_random_suffix: false,
                    allow_overwrite: true,
                    cache_max_age: Some(MIN_CACHE_MAX_AGE),
                },
            )
            .await?;
        Ok(())
    }
}
