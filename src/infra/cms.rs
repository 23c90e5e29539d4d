//! HTTP client for the headless CMS.
//!
//! Reads are either *tagged* (served from the [`TagCache`] until a carried
//! tag is purged, then repopulated) or *live* (search, always a fresh
//! request). Failures are explicit [`CmsError`]s; deciding whether to
//! degrade to empty results is the caller's job.

use std::sync::Arc;

use metrics::counter;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use crate::cache::{CacheTag, TagCache};

const TARGET: &str = "brezza::cms";

#[derive(Debug, Error)]
pub enum CmsError {
    #[error("invalid CMS URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("CMS returned {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[error("failed to decode CMS response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },
}

/// Tagged, cached reader for the CMS REST API.
#[derive(Clone)]
pub struct CmsClient {
    http: Client,
    base: Url,
    origin: String,
    cache: Arc<TagCache>,
}

impl CmsClient {
    pub fn new(base: Url, cache: Arc<TagCache>) -> Result<Self, CmsError> {
        let http = Client::builder().user_agent(Self::user_agent()).build()?;
        let origin = base.as_str().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base,
            origin,
            cache,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("brezza/", env!("CARGO_PKG_VERSION"))
    }

    /// The CMS base URL without a trailing slash, for absolutizing
    /// root-relative asset URLs.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn cache(&self) -> &Arc<TagCache> {
        &self.cache
    }

    /// Cached GET: serve from the tag cache when present, otherwise fetch
    /// and store the decoded body under `tags`. Entries persist until one of
    /// their tags is purged.
    pub async fn fetch_tagged<T: DeserializeOwned>(
        &self,
        path: &str,
        tags: &[CacheTag],
    ) -> Result<T, CmsError> {
        if let Some(body) = self.cache.get(path) {
            debug!(target: TARGET, path, "Serving CMS read from cache");
            return decode(body, path);
        }

        let body = self.get_json(path).await?;
        self.cache.put(path, tags, body.clone());
        decode(body, path)
    }

    /// Uncached GET, used for search where results are query-specific.
    pub async fn fetch_live<T: DeserializeOwned>(&self, path: &str) -> Result<T, CmsError> {
        let body = self.get_json(path).await?;
        decode(body, path)
    }

    async fn get_json(&self, path: &str) -> Result<Value, CmsError> {
        let url = self.base.join(path)?;
        let response = self.http.get(url.clone()).send().await.map_err(|err| {
            counter!("brezza_cms_fetch_failure_total").increment(1);
            error!(target: TARGET, url = %url, error = %err, "CMS connection error");
            CmsError::from(err)
        })?;

        let status = response.status();
        if !status.is_success() {
            counter!("brezza_cms_fetch_failure_total").increment(1);
            error!(target: TARGET, url = %url, status = %status, "CMS fetch failed");
            return Err(CmsError::Status {
                status,
                url: url.to_string(),
            });
        }

        response.json().await.map_err(|err| {
            counter!("brezza_cms_fetch_failure_total").increment(1);
            error!(target: TARGET, url = %url, error = %err, "CMS body read failed");
            CmsError::from(err)
        })
    }
}

fn decode<T: DeserializeOwned>(body: Value, path: &str) -> Result<T, CmsError> {
    serde_json::from_value(body).map_err(|source| CmsError::Decode {
        url: path.to_string(),
        source,
    })
}
