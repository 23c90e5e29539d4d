//! Application services: the content query façade and search-session logic.

pub mod content;
pub mod error;
pub mod search;
