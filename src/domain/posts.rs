//! Normalized, UI-facing content types.
//!
//! Everything here is read-only and rebuilt per request from the CMS; field
//! names on the wire stay camelCase to match the consuming front end.

use serde::Serialize;

/// A blog post after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub document_id: String,
    /// URL-safe slug derived from the title; falls back to the document id.
    pub slug: String,
    pub title: String,
    /// Plain-text summary, at most 160 characters.
    pub excerpt: String,
    pub content: String,
    /// Absolute image URL, or the placeholder sentinel when no image exists.
    pub cover_image: String,
    pub category: String,
    pub category_slug: String,
    pub tags: Vec<String>,
    pub published_at: String,
    /// Human-readable estimate, e.g. `"4 min read"`.
    pub reading_time: String,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
}

/// A content category, passed through from the CMS unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub document_id: String,
    pub name: String,
    pub slug: String,
}

/// Pagination envelope mirroring the CMS (`pageCount = ceil(total/pageSize)`,
/// enforced upstream and trusted here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
    pub total: u64,
}

impl PaginationMeta {
    /// The zeroed pagination used for degraded or empty results.
    pub fn zeroed(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            page_count: 0,
            total: 0,
        }
    }
}

/// One page of results plus its pagination envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResult<T> {
    /// The degraded-empty result every listing falls back to on CMS failure.
    pub fn empty(page: u32, page_size: u32) -> Self {
        Self {
            data: Vec::new(),
            pagination: PaginationMeta::zeroed(page, page_size),
        }
    }
}
