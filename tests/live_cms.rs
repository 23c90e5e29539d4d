//! End-to-end tests against a fake CMS served over loopback.
//!
//! The fake implements just enough of the Strapi REST surface (envelope,
//! populate, filters, pagination) to exercise the full path: fetch,
//! normalize, cache, purge via the webhook, refetch.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::{
    Arc, RwLock,
    atomic::{AtomicUsize, Ordering},
};

use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::{RawQuery, State},
    http::{Request, StatusCode},
    routing::get,
};
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;

use brezza::application::content::ContentService;
use brezza::cache::TagCache;
use brezza::infra::cms::CmsClient;
use brezza::infra::http::{AppState, build_router};

const SECRET: &str = "hook-secret";

struct FakeCms {
    posts: RwLock<Vec<Value>>,
    categories: Vec<Value>,
    hits: AtomicUsize,
}

impl FakeCms {
    fn new(posts: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            posts: RwLock::new(posts),
            categories: vec![
                json!({"id": 10, "documentId": "cat-1", "name": "Rust", "slug": "rust"}),
                json!({"id": 11, "documentId": "cat-2", "name": "Go", "slug": "go"}),
            ],
            hits: AtomicUsize::new(0),
        })
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn set_title(&self, document_id: &str, title: &str) {
        let mut posts = self.posts.write().expect("posts lock");
        for post in posts.iter_mut() {
            if post["documentId"].as_str() == Some(document_id) {
                post["title"] = json!(title);
            }
        }
    }
}

async fn posts_handler(
    State(cms): State<Arc<FakeCms>>,
    RawQuery(query): RawQuery,
) -> Json<Value> {
    cms.hits.fetch_add(1, Ordering::SeqCst);
    let query = query.unwrap_or_default();
    let pairs: HashMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    let mut posts: Vec<Value> = cms.posts.read().expect("posts lock").clone();
    if let Some(slug) = pairs.get("filters[category][slug][$eq]") {
        posts.retain(|post| post["category"]["slug"].as_str() == Some(slug.as_str()));
    }
    if let Some(needle) = pairs.get("filters[$or][0][title][$containsi]") {
        let needle = needle.to_lowercase();
        posts.retain(|post| {
            let title = post["title"].as_str().unwrap_or_default().to_lowercase();
            let content = post["content"].as_str().unwrap_or_default().to_lowercase();
            title.contains(&needle) || content.contains(&needle)
        });
    }

    let page_size = pairs
        .get("pagination[pageSize]")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(25);
    let total = posts.len();
    posts.truncate(page_size);

    Json(json!({
        "data": posts,
        "meta": {"pagination": {
            "page": 1,
            "pageSize": page_size,
            "pageCount": if total == 0 { 0 } else { 1 },
            "total": total
        }}
    }))
}

async fn categories_handler(State(cms): State<Arc<FakeCms>>) -> Json<Value> {
    Json(json!({"data": cms.categories, "meta": {}}))
}

async fn spawn_fake_cms(cms: Arc<FakeCms>) -> SocketAddr {
    let router = Router::new()
        .route("/api/posts", get(posts_handler))
        .route("/api/categories", get(categories_handler))
        .with_state(cms);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake cms");
    let addr = listener.local_addr().expect("fake cms addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router.into_make_service()).await;
    });
    addr
}

fn sample_posts() -> Vec<Value> {
    let rust = json!({"id": 10, "documentId": "cat-1", "name": "Rust", "slug": "rust"});
    let go = json!({"id": 11, "documentId": "cat-2", "name": "Go", "slug": "go"});
    vec![
        json!({
            "id": 1,
            "documentId": "doc-1",
            "title": "Getting Started With Brezza",
            "content": "Hello world from the first post.",
            "publishedAt": "2026-01-04T00:00:00.000Z",
            "category": rust,
            "tags": [{"id": 1, "name": "intro"}],
            "image": [{
                "id": 1,
                "url": "/uploads/cover.png",
                "formats": {"medium": {"url": "/uploads/medium_cover.png"}}
            }],
            "user": {"id": 1, "username": "Ada", "email": "ada@example.com"}
        }),
        json!({
            "id": 2,
            "documentId": "doc-2",
            "title": "Second Post",
            "content": "More rust content.",
            "publishedAt": "2026-01-03T00:00:00.000Z",
            "category": rust
        }),
        json!({
            "id": 3,
            "documentId": "doc-3",
            "title": "Other Topic",
            "content": "Something about go.",
            "publishedAt": "2026-01-02T00:00:00.000Z",
            "category": go
        }),
        json!({
            "id": 4,
            "documentId": "doc-4",
            "title": "Uncategorized Musings",
            "content": "No category here.",
            "publishedAt": "2026-01-01T00:00:00.000Z"
        }),
    ]
}

fn app_for(addr: SocketAddr) -> (Router, String) {
    app_with_scan_limit(addr, 100)
}

fn app_with_scan_limit(addr: SocketAddr, slug_scan_limit: u32) -> (Router, String) {
    let base = Url::parse(&format!("http://{addr}")).expect("base url");
    let origin = base.as_str().trim_end_matches('/').to_string();
    let cache = Arc::new(TagCache::new(NonZeroUsize::new(64).expect("capacity")));
    let cms = CmsClient::new(base, cache).expect("cms client");
    let content = Arc::new(ContentService::new(cms, slug_scan_limit));
    let state = AppState {
        content,
        revalidate_secret: Some(SECRET.to_string()),
    };
    (build_router(state), origin)
}

async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::get(uri).body(Body::empty()).expect("request");
    let response = router.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    let body = serde_json::from_slice(&bytes).expect("json body");
    (status, body)
}

async fn post_webhook(router: Router, body: Value) -> StatusCode {
    let request = Request::post("/api/revalidate")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    let response = router.oneshot(request).await.expect("response");
    response.status()
}

#[tokio::test]
async fn listing_normalizes_posts_and_serves_repeats_from_cache() {
    let cms = FakeCms::new(sample_posts());
    let addr = spawn_fake_cms(cms.clone()).await;
    let (router, origin) = app_for(addr);

    let (status, body) = get_json(router.clone(), "/api/posts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 4);
    assert_eq!(body["pagination"]["pageSize"], 25);

    let first = &body["data"][0];
    assert_eq!(first["slug"], "getting-started-with-brezza");
    assert_eq!(first["category"], "Rust");
    assert_eq!(first["categorySlug"], "rust");
    assert_eq!(first["excerpt"], "Hello world from the first post.");
    assert_eq!(first["readingTime"], "1 min read");
    assert_eq!(
        first["coverImage"],
        format!("{origin}/uploads/medium_cover.png")
    );
    assert_eq!(first["tags"], json!(["intro"]));
    assert_eq!(first["authorName"], "Ada");

    let fourth = &body["data"][3];
    assert_eq!(fourth["category"], "Uncategorized");
    assert_eq!(fourth["categorySlug"], "uncategorized");
    assert_eq!(fourth["coverImage"], "/placeholder.svg");

    assert_eq!(cms.hits(), 1);
    let (status, _) = get_json(router, "/api/posts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cms.hits(), 1);
}

#[tokio::test]
async fn webhook_purge_forces_a_fresh_fetch() {
    let cms = FakeCms::new(sample_posts());
    let addr = spawn_fake_cms(cms.clone()).await;
    let (router, _) = app_for(addr);

    let (_, body) = get_json(router.clone(), "/api/posts").await;
    assert_eq!(body["data"][0]["title"], "Getting Started With Brezza");
    assert_eq!(cms.hits(), 1);

    // Upstream edits the post; the cached listing keeps serving stale data.
    cms.set_title("doc-1", "Refreshed Title");
    let (_, body) = get_json(router.clone(), "/api/posts").await;
    assert_eq!(body["data"][0]["title"], "Getting Started With Brezza");
    assert_eq!(cms.hits(), 1);

    let status = post_webhook(
        router.clone(),
        json!({
            "secret": SECRET,
            "model": "post",
            "entry": {"documentId": "doc-1", "slug": "getting-started-with-brezza"}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get_json(router, "/api/posts").await;
    assert_eq!(body["data"][0]["title"], "Refreshed Title");
    assert_eq!(cms.hits(), 2);
}

#[tokio::test]
async fn post_detail_resolves_by_derived_slug() {
    let cms = FakeCms::new(sample_posts());
    let addr = spawn_fake_cms(cms).await;
    let (router, _) = app_for(addr);

    let (status, body) = get_json(router.clone(), "/api/posts/getting-started-with-brezza").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documentId"], "doc-1");
    assert_eq!(body["title"], "Getting Started With Brezza");

    let (status, body) = get_json(router, "/api/posts/no-such-slug").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn slug_lookup_misses_posts_beyond_the_scan_bound() {
    let cms = FakeCms::new(sample_posts());
    let addr = spawn_fake_cms(cms).await;
    // Slug lookup scans a single page of at most `slug_scan_limit` posts;
    // anything past the bound is deliberately not found.
    let (router, _) = app_with_scan_limit(addr, 2);

    let (status, body) = get_json(router.clone(), "/api/posts/second-post").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documentId"], "doc-2");

    let (status, body) = get_json(router, "/api/posts/other-topic").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn related_posts_share_the_category_and_exclude_the_current_post() {
    let cms = FakeCms::new(sample_posts());
    let addr = spawn_fake_cms(cms).await;
    let (router, _) = app_for(addr);

    let (status, body) = get_json(router, "/api/posts/getting-started-with-brezza/related").await;
    assert_eq!(status, StatusCode::OK);

    let related = body.as_array().expect("related array");
    assert_eq!(related.len(), 1);
    assert_eq!(related[0]["documentId"], "doc-2");
    assert_eq!(related[0]["categorySlug"], "rust");
}

#[tokio::test]
async fn featured_returns_the_three_newest_posts() {
    let cms = FakeCms::new(sample_posts());
    let addr = spawn_fake_cms(cms).await;
    let (router, _) = app_for(addr);

    let (status, body) = get_json(router, "/api/featured").await;
    assert_eq!(status, StatusCode::OK);

    let featured = body.as_array().expect("featured array");
    assert_eq!(featured.len(), 3);
    assert_eq!(featured[0]["documentId"], "doc-1");
}

#[tokio::test]
async fn category_filter_narrows_the_listing() {
    let cms = FakeCms::new(sample_posts());
    let addr = spawn_fake_cms(cms).await;
    let (router, _) = app_for(addr);

    let (status, body) = get_json(router.clone(), "/api/posts?category=rust").await;
    assert_eq!(status, StatusCode::OK);
    // Category pages default to the 9-post grid rather than the listing's 25.
    assert_eq!(body["pagination"]["pageSize"], 9);
    let slugs: Vec<&str> = body["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|post| post["categorySlug"].as_str().expect("slug"))
        .collect();
    assert_eq!(slugs, ["rust", "rust"]);

    // The `all` pseudo-slug is the unfiltered listing.
    let (_, body) = get_json(router, "/api/posts?category=all").await;
    assert_eq!(body["data"].as_array().expect("data array").len(), 4);
}

#[tokio::test]
async fn categories_pass_through_unchanged() {
    let cms = FakeCms::new(sample_posts());
    let addr = spawn_fake_cms(cms).await;
    let (router, _) = app_for(addr);

    let (status, body) = get_json(router, "/api/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"id": 10, "documentId": "cat-1", "name": "Rust", "slug": "rust"},
            {"id": 11, "documentId": "cat-2", "name": "Go", "slug": "go"}
        ])
    );
}

#[tokio::test]
async fn search_queries_hit_the_cms_live() {
    let cms = FakeCms::new(sample_posts());
    let addr = spawn_fake_cms(cms.clone()).await;
    let (router, _) = app_for(addr);

    let (status, body) = get_json(router.clone(), "/api/search?q=rust").await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().expect("results array");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["documentId"], "doc-2");

    // Search bypasses the cache; the same query fetches again.
    let hits = cms.hits();
    let (_, _) = get_json(router, "/api/search?q=rust").await;
    assert_eq!(cms.hits(), hits + 1);
}
