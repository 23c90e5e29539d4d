//! Raw CMS wire shapes.
//!
//! These mirror the Strapi REST response format (`{ data, meta.pagination }`
//! with populated relations) and never leave the fetch boundary; everything
//! user-facing goes through [`crate::domain::normalize`] first.

use serde::Deserialize;

/// Generic CMS response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct CmsEnvelope<T> {
    pub data: T,
    #[serde(default)]
    pub meta: CmsMeta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CmsMeta {
    #[serde(default)]
    pub pagination: Option<RawPagination>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPagination {
    pub page: u32,
    #[serde(rename = "pageSize")]
    pub page_size: u32,
    #[serde(rename = "pageCount")]
    pub page_count: u32,
    pub total: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPost {
    pub id: i64,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "publishedAt", default)]
    pub published_at: String,
    #[serde(default)]
    pub category: Option<RawCategory>,
    #[serde(default)]
    pub tags: Vec<RawTag>,
    #[serde(default)]
    pub image: Vec<RawImage>,
    #[serde(default)]
    pub user: Option<RawUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCategory {
    pub id: i64,
    #[serde(rename = "documentId")]
    pub document_id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTag {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawImage {
    pub id: i64,
    pub url: String,
    #[serde(default)]
    pub formats: Option<RawImageFormats>,
}

/// Pre-scaled variants the CMS attaches to an upload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawImageFormats {
    #[serde(default)]
    pub large: Option<RawImageFormat>,
    #[serde(default)]
    pub medium: Option<RawImageFormat>,
    #[serde(default)]
    pub small: Option<RawImageFormat>,
    #[serde(default)]
    pub thumbnail: Option<RawImageFormat>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawImageFormat {
    pub url: String,
}
