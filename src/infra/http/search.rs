//! Keyword search endpoint.
//!
//! Always a live CMS read; blank queries answer immediately without touching
//! the backend, and a CMS failure is the one deliberate 500 in the service.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::application::content::DEFAULT_PAGE_SIZE;
use crate::domain::posts::{BlogPost, PaginationMeta};

use super::AppState;

const TARGET: &str = "brezza::http::search";

const DEFAULT_PAGE: u32 = 1;
const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    q: Option<String>,
    page: Option<String>,
    #[serde(rename = "pageSize")]
    page_size: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    results: Vec<BlogPost>,
    pagination: PaginationMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
}

pub async fn search(State(state): State<AppState>, Query(query): Query<SearchQuery>) -> Response {
    let page = clamp_page(query.page.as_deref());
    let page_size = clamp_page_size(query.page_size.as_deref(), DEFAULT_PAGE_SIZE);
    let q = query.q.unwrap_or_default();

    if q.trim().is_empty() {
        return Json(SearchResponse {
            results: Vec::new(),
            pagination: PaginationMeta::zeroed(page, page_size),
            error: None,
        })
        .into_response();
    }

    match state.content.search_posts(&q, page, page_size).await {
        Ok(result) => Json(SearchResponse {
            results: result.data,
            pagination: result.pagination,
            error: None,
        })
        .into_response(),
        Err(err) => {
            error!(target: TARGET, error = %err, "Search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SearchResponse {
                    results: Vec::new(),
                    pagination: PaginationMeta::zeroed(page, page_size),
                    error: Some("Search failed"),
                }),
            )
                .into_response()
        }
    }
}

/// `page` defaults to 1 and is floored at 1; non-numeric input falls back to
/// the default.
pub(crate) fn clamp_page(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .map(|value| value.max(1).min(u32::MAX as i64) as u32)
        .unwrap_or(DEFAULT_PAGE)
}

/// `pageSize` falls back to the caller's default and is clamped to `[1, 50]`.
pub(crate) fn clamp_page_size(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .map(|value| value.clamp(1, MAX_PAGE_SIZE as i64) as u32)
        .unwrap_or(default)
}
