//! Query façade over the CMS.
//!
//! Typed accessors for everything the presentation layer needs. Listing
//! calls are tagged cache reads; search is always live. Every listing fails
//! soft: a CMS error degrades to an empty page rather than propagating, and
//! only [`ContentService::search_posts`] surfaces the error so the search
//! route can answer with its deliberate 500.

use tracing::warn;

use crate::cache::CacheTag;
use crate::domain::normalize::{normalize_category, normalize_post};
use crate::domain::posts::{BlogPost, Category, PaginatedResult, PaginationMeta};
use crate::domain::raw::{CmsEnvelope, RawCategory, RawPost};
use crate::infra::cms::{CmsClient, CmsError};

const TARGET: &str = "brezza::content";

pub const DEFAULT_PAGE_SIZE: u32 = 25;
pub const CATEGORY_PAGE_SIZE: u32 = 9;
pub const FEATURED_COUNT: u32 = 3;
pub const RELATED_LIMIT: usize = 3;

/// Pseudo-slug the category filter uses for the unfiltered listing.
const ALL_CATEGORIES: &str = "all";

/// Typed accessors over the CMS, built on the tagged fetch client.
#[derive(Clone)]
pub struct ContentService {
    cms: CmsClient,
    /// Upper bound on the page scanned by slug lookup. Slugs are derived
    /// client-side and not stored upstream, so lookup is a bounded scan;
    /// posts beyond the bound are simply not found.
    slug_scan_limit: u32,
}

impl ContentService {
    pub fn new(cms: CmsClient, slug_scan_limit: u32) -> Self {
        Self {
            cms,
            slug_scan_limit,
        }
    }

    pub fn cms(&self) -> &CmsClient {
        &self.cms
    }

    /// Latest posts, newest first.
    pub async fn all_posts(&self, page: u32, page_size: u32) -> PaginatedResult<BlogPost> {
        let path = listing_path(page, page_size);
        self.posts_listing(&path, &[CacheTag::Global, CacheTag::Posts], page, page_size)
            .await
    }

    /// Look up a post by its CMS document id.
    pub async fn post_by_document_id(&self, document_id: &str) -> Option<BlogPost> {
        let path = format!(
            "/api/posts?populate=*&filters[documentId][$eq]={}",
            encode(document_id)
        );
        let tags = [
            CacheTag::Global,
            CacheTag::Posts,
            CacheTag::Post(document_id.to_string()),
        ];
        match self
            .cms
            .fetch_tagged::<CmsEnvelope<Vec<RawPost>>>(&path, &tags)
            .await
        {
            Ok(envelope) => envelope
                .data
                .first()
                .map(|raw| normalize_post(raw, self.cms.origin())),
            Err(err) => {
                warn!(target: TARGET, document_id, error = %err, "Post lookup degraded to not-found");
                None
            }
        }
    }

    /// Look up a post by its derived slug.
    ///
    /// The slug exists only client-side, so this scans one bounded page of
    /// the default listing and returns the first match in published order.
    pub async fn post_by_slug(&self, slug: &str) -> Option<BlogPost> {
        let listing = self.all_posts(1, self.slug_scan_limit).await;
        listing.data.into_iter().find(|post| post.slug == slug)
    }

    /// Posts in one category, newest first. The `all` pseudo-slug yields the
    /// unfiltered listing.
    pub async fn posts_by_category(
        &self,
        category_slug: &str,
        page: u32,
        page_size: u32,
    ) -> PaginatedResult<BlogPost> {
        if category_slug == ALL_CATEGORIES {
            return self.all_posts(page, page_size).await;
        }
        let path = category_path(category_slug, page, page_size);
        let tags = [
            CacheTag::Global,
            CacheTag::Posts,
            CacheTag::Category(category_slug.to_string()),
        ];
        self.posts_listing(&path, &tags, page, page_size).await
    }

    /// The first three posts of the default listing. No independent
    /// "featured" flag exists upstream.
    pub async fn featured_posts(&self) -> Vec<BlogPost> {
        self.all_posts(1, FEATURED_COUNT).await.data
    }

    /// Up to `limit` other posts from the same category.
    ///
    /// Fetches `limit + 1` so the current post can be dropped without
    /// shorting the result; categories with too few posts return fewer.
    pub async fn related_posts(
        &self,
        exclude_document_id: &str,
        category_slug: &str,
        limit: usize,
    ) -> Vec<BlogPost> {
        let over_fetch = (limit + 1).min(u32::MAX as usize) as u32;
        let listing = self.posts_by_category(category_slug, 1, over_fetch).await;
        listing
            .data
            .into_iter()
            .filter(|post| post.document_id != exclude_document_id)
            .take(limit)
            .collect()
    }

    /// All categories, passthrough shape.
    pub async fn all_categories(&self) -> Vec<Category> {
        let tags = [CacheTag::Global, CacheTag::Categories];
        match self
            .cms
            .fetch_tagged::<CmsEnvelope<Vec<RawCategory>>>("/api/categories", &tags)
            .await
        {
            Ok(envelope) => envelope.data.iter().map(normalize_category).collect(),
            Err(err) => {
                warn!(target: TARGET, error = %err, "Category listing degraded to empty");
                Vec::new()
            }
        }
    }

    /// Case-insensitive substring search over title or content.
    ///
    /// Always a live read: results are query-specific and not worth caching
    /// at this layer. Blank queries short-circuit without contacting the CMS.
    pub async fn search_posts(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<BlogPost>, CmsError> {
        if query.trim().is_empty() {
            return Ok(PaginatedResult::empty(page, page_size));
        }
        let path = search_path(query, page, page_size);
        let envelope = self
            .cms
            .fetch_live::<CmsEnvelope<Vec<RawPost>>>(&path)
            .await?;
        Ok(self.to_page(envelope, page, page_size))
    }

    async fn posts_listing(
        &self,
        path: &str,
        tags: &[CacheTag],
        page: u32,
        page_size: u32,
    ) -> PaginatedResult<BlogPost> {
        match self
            .cms
            .fetch_tagged::<CmsEnvelope<Vec<RawPost>>>(path, tags)
            .await
        {
            Ok(envelope) => self.to_page(envelope, page, page_size),
            Err(err) => {
                warn!(target: TARGET, path, error = %err, "Post listing degraded to empty");
                PaginatedResult::empty(page, page_size)
            }
        }
    }

    fn to_page(
        &self,
        envelope: CmsEnvelope<Vec<RawPost>>,
        page: u32,
        page_size: u32,
    ) -> PaginatedResult<BlogPost> {
        let pagination = envelope
            .meta
            .pagination
            .map(|raw| PaginationMeta {
                page: raw.page,
                page_size: raw.page_size,
                page_count: raw.page_count,
                total: raw.total,
            })
            .unwrap_or_else(|| PaginationMeta::zeroed(page, page_size));
        PaginatedResult {
            data: envelope
                .data
                .iter()
                .map(|raw| normalize_post(raw, self.cms.origin()))
                .collect(),
            pagination,
        }
    }
}

fn listing_path(page: u32, page_size: u32) -> String {
    format!(
        "/api/posts?populate=*&sort=publishedAt:desc&pagination[page]={page}&pagination[pageSize]={page_size}"
    )
}

fn category_path(category_slug: &str, page: u32, page_size: u32) -> String {
    format!(
        "/api/posts?populate=*&filters[category][slug][$eq]={}&sort=publishedAt:desc&pagination[page]={page}&pagination[pageSize]={page_size}",
        encode(category_slug)
    )
}

fn search_path(query: &str, page: u32, page_size: u32) -> String {
    let encoded = encode(query);
    format!(
        "/api/posts?populate=*&filters[$or][0][title][$containsi]={encoded}&filters[$or][1][content][$containsi]={encoded}&sort=publishedAt:desc&pagination[page]={page}&pagination[pageSize]={page_size}"
    )
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
