//! Brezza: a presentation-layer service for a headless-CMS blog.
//!
//! Brezza sits between a Strapi-style content API and whatever renders the
//! blog. It fetches posts and categories through a tagged read-through
//! cache, normalizes them into stable UI-facing shapes, serves JSON read and
//! search endpoints, and exposes a webhook that purges cache tags when
//! content is published upstream.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
