mod content;
mod revalidate;
mod search;

use std::sync::Arc;

use axum::{Router, routing::get, routing::post};

use crate::application::content::ContentService;

/// Shared state for every route.
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ContentService>,
    /// Shared secret for the revalidation webhook; `None` rejects all
    /// revalidation requests.
    pub revalidate_secret: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/posts", get(content::list_posts))
        .route("/api/posts/{slug}", get(content::post_detail))
        .route("/api/posts/{slug}/related", get(content::related_posts))
        .route("/api/categories", get(content::list_categories))
        .route("/api/featured", get(content::featured_posts))
        .route("/api/search", get(search::search))
        .route("/api/revalidate", post(revalidate::revalidate))
        .with_state(state)
}
