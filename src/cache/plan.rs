//! Purge-plan derivation for the revalidation webhook.
//!
//! The webhook payload is classified into an explicit [`ContentChange`] kind,
//! and a pure function derives the full set of tags and paths to purge from
//! that kind plus any explicitly requested tags/paths. Keeping the inference
//! separate from transport makes it testable without an HTTP request.

use super::keys::CacheTag;

/// What the webhook payload says changed upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentChange {
    /// A post was published, updated, or deleted.
    Post {
        slug: Option<String>,
        document_id: Option<String>,
        category_slug: Option<String>,
    },
    /// A category was published, updated, or deleted.
    Category,
    /// Payload did not identify a known model; fall back to broad purge.
    Unknown,
}

impl ContentChange {
    /// Classify a webhook `model` field.
    ///
    /// CMS webhook payloads use free-text model names (`post`, `api::post.post`,
    /// ...), so matching is case-insensitive substring. Category wins when a
    /// name somehow mentions both, keeping classification single-valued.
    pub fn classify(
        model: Option<&str>,
        slug: Option<&str>,
        document_id: Option<&str>,
        category_slug: Option<&str>,
    ) -> Self {
        let model = model.map(str::to_ascii_lowercase).unwrap_or_default();
        if model.contains("category") {
            Self::Category
        } else if model.contains("post") {
            Self::Post {
                slug: non_blank(slug),
                document_id: non_blank(document_id),
                category_slug: non_blank(category_slug),
            }
        } else {
            Self::Unknown
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// The ordered, de-duplicated set of tags and paths a webhook request purges.
///
/// Tags are kept as strings because the webhook may pass through tags this
/// service does not recognize; the executor parses each into a [`CacheTag`]
/// and skips unknowns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgePlan {
    pub tags: Vec<String>,
    pub paths: Vec<String>,
}

impl PurgePlan {
    /// Derive the purge plan for a content change.
    ///
    /// Explicitly requested tags come first, then the inferred ones; the
    /// global tag is always inferred. Paths always start with the home and
    /// blog-listing routes; requested paths must be root-relative or they
    /// are dropped.
    pub fn derive(change: &ContentChange, requested_tags: &[String], requested_paths: &[String]) -> Self {
        let mut tags: Vec<String> = Vec::new();
        for tag in requested_tags {
            push_unique(&mut tags, tag.clone());
        }

        push_unique(&mut tags, CacheTag::Global.to_string());
        let mut inferred_paths: Vec<String> = Vec::new();
        match change {
            ContentChange::Category => {
                push_unique(&mut tags, CacheTag::Categories.to_string());
            }
            ContentChange::Post {
                slug,
                document_id,
                category_slug,
            } => {
                push_unique(&mut tags, CacheTag::Posts.to_string());
                if let Some(slug) = slug {
                    inferred_paths.push(format!("/blog/{slug}"));
                }
                if let Some(category_slug) = category_slug {
                    push_unique(&mut tags, CacheTag::Category(category_slug.clone()).to_string());
                }
                if let Some(document_id) = document_id {
                    push_unique(&mut tags, CacheTag::Post(document_id.clone()).to_string());
                }
            }
            ContentChange::Unknown => {}
        }

        let mut paths = vec!["/".to_string(), "/blog".to_string()];
        for path in requested_paths {
            if path.starts_with('/') {
                push_unique(&mut paths, path.clone());
            }
        }
        for path in inferred_paths {
            push_unique(&mut paths, path);
        }

        Self { tags, paths }
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
