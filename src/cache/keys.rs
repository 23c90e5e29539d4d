//! Cache tag definitions.
//!
//! Every cached CMS read is stored under a set of tags; the revalidation
//! webhook purges by tag. The string renderings here are the wire contract
//! shared with the CMS webhook configuration.

use std::fmt;

/// Identifies a slice of CMS content for cache invalidation.
///
/// When content changes upstream, every cache entry stored under an affected
/// tag must be purged so the next read repopulates from the CMS.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheTag {
    /// Every CMS read carries this tag; purging it empties the cache.
    Global,
    /// Any post listing or lookup.
    Posts,
    /// The category listing.
    Categories,
    /// Posts filtered to one category, by category slug.
    Category(String),
    /// A single post, by its CMS document id.
    Post(String),
}

impl CacheTag {
    /// Parse a webhook-supplied tag string back into a tag.
    ///
    /// Unknown strings return `None`; the webhook treats those as no-ops
    /// rather than errors so CMS-side configuration drift stays harmless.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "strapi" => Some(Self::Global),
            "posts" => Some(Self::Posts),
            "categories" => Some(Self::Categories),
            _ => {
                if let Some(slug) = raw.strip_prefix("category:") {
                    (!slug.is_empty()).then(|| Self::Category(slug.to_string()))
                } else if let Some(id) = raw.strip_prefix("post:") {
                    (!id.is_empty()).then(|| Self::Post(id.to_string()))
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("strapi"),
            Self::Posts => f.write_str("posts"),
            Self::Categories => f.write_str("categories"),
            Self::Category(slug) => write!(f, "category:{slug}"),
            Self::Post(id) => write!(f, "post:{id}"),
        }
    }
}
