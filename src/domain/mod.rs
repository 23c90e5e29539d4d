//! Content types: raw CMS wire shapes and their normalized, UI-facing forms.

pub mod normalize;
pub mod posts;
pub mod raw;
