//! Brezza cache system.
//!
//! A read-through cache over the CMS with explicit tag-based purge:
//!
//! - [`TagCache`] stores decoded CMS responses keyed by request path, each
//!   entry carrying the tags it was fetched under.
//! - [`CacheTag`] names the slices of content the revalidation webhook can
//!   purge.
//! - [`PurgePlan`] derives which tags and paths a webhook payload affects.
//!
//! Entries have no time-based expiry; they persist until a tag they carry is
//! purged or LRU capacity evicts them.

mod keys;
mod lock;
mod plan;
mod store;

pub use keys::CacheTag;
pub use plan::{ContentChange, PurgePlan};
pub use store::TagCache;
