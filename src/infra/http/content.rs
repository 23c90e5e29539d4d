//! JSON read endpoints over the query façade.
//!
//! These serve the normalized shapes directly; listings fail soft to empty
//! pages, only an unknown slug produces an error status (404).

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::application::content::{CATEGORY_PAGE_SIZE, DEFAULT_PAGE_SIZE, RELATED_LIMIT};

use super::AppState;
use super::search::{clamp_page, clamp_page_size};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    page: Option<String>,
    #[serde(rename = "pageSize")]
    page_size: Option<String>,
    /// Optional category slug filter; `all` means unfiltered.
    category: Option<String>,
}

#[derive(Debug, Serialize)]
struct NotFound {
    error: &'static str,
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(NotFound { error: "Not found" })).into_response()
}

pub async fn list_posts(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let page = clamp_page(query.page.as_deref());

    // Category pages use a smaller grid than the main listing.
    let result = match query.category.as_deref() {
        Some(category) => {
            let page_size = clamp_page_size(query.page_size.as_deref(), CATEGORY_PAGE_SIZE);
            state
                .content
                .posts_by_category(category, page, page_size)
                .await
        }
        None => {
            let page_size = clamp_page_size(query.page_size.as_deref(), DEFAULT_PAGE_SIZE);
            state.content.all_posts(page, page_size).await
        }
    };
    Json(result).into_response()
}

pub async fn post_detail(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    match state.content.post_by_slug(&slug).await {
        Some(post) => Json(post).into_response(),
        None => not_found(),
    }
}

pub async fn related_posts(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let Some(post) = state.content.post_by_slug(&slug).await else {
        return not_found();
    };
    let related = state
        .content
        .related_posts(&post.document_id, &post.category_slug, RELATED_LIMIT)
        .await;
    Json(related).into_response()
}

pub async fn list_categories(State(state): State<AppState>) -> Response {
    Json(state.content.all_categories().await).into_response()
}

pub async fn featured_posts(State(state): State<AppState>) -> Response {
    Json(state.content.featured_posts().await).into_response()
}
