//! Webhook endpoint that purges cached content when the CMS publishes.
//!
//! Authorization compares a shared secret (body field, header, or query
//! parameter, in that order) in constant time. An unauthorized request
//! performs zero purges. The response lists exactly which tags and paths
//! were purged; that listing is the observable contract, since a purge's
//! only other effect is that the next read misses the cache.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use crate::cache::{CacheTag, ContentChange, PurgePlan};

use super::AppState;

const TARGET: &str = "brezza::http::revalidate";
const SECRET_HEADER: &str = "x-revalidate-secret";

/// Webhook payload. Every field is optional; CMS webhook shapes vary and a
/// malformed body is treated as empty rather than rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RevalidateBody {
    secret: Option<String>,
    path: Option<String>,
    paths: Option<Vec<String>>,
    tag: Option<String>,
    tags: Option<Vec<String>>,
    #[allow(dead_code)]
    event: Option<String>,
    model: Option<String>,
    entry: Option<RevalidateEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RevalidateEntry {
    slug: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
    category: Option<EntryCategory>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EntryCategory {
    slug: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RevalidateQuery {
    secret: Option<String>,
}

#[derive(Debug, Serialize)]
struct RevalidateResponse {
    ok: bool,
    revalidated: bool,
    tags: Vec<String>,
    paths: Vec<String>,
}

#[derive(Debug, Serialize)]
struct UnauthorizedResponse {
    ok: bool,
    error: &'static str,
}

pub async fn revalidate(
    State(state): State<AppState>,
    Query(query): Query<RevalidateQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: RevalidateBody = serde_json::from_slice(&body).unwrap_or_default();

    let header_secret = headers
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let candidate = body.secret.clone().or(header_secret).or(query.secret);

    if !secret_allowed(state.revalidate_secret.as_deref(), candidate.as_deref()) {
        counter!("brezza_revalidate_unauthorized_total").increment(1);
        warn!(target: TARGET, "Rejected revalidation request with bad or missing secret");
        return (
            StatusCode::UNAUTHORIZED,
            Json(UnauthorizedResponse {
                ok: false,
                error: "Unauthorized",
            }),
        )
            .into_response();
    }

    let mut requested_tags: Vec<String> = Vec::new();
    if let Some(tag) = body.tag {
        requested_tags.push(tag);
    }
    requested_tags.extend(body.tags.unwrap_or_default());

    let mut requested_paths: Vec<String> = Vec::new();
    if let Some(path) = body.path {
        requested_paths.push(path);
    }
    requested_paths.extend(body.paths.unwrap_or_default());

    let entry = body.entry.unwrap_or_default();
    let change = ContentChange::classify(
        body.model.as_deref(),
        entry.slug.as_deref(),
        entry.document_id.as_deref(),
        entry.category.and_then(|c| c.slug).as_deref(),
    );

    let plan = PurgePlan::derive(&change, &requested_tags, &requested_paths);

    let cache = state.content.cms().cache();
    let mut removed = 0;
    for tag in &plan.tags {
        match CacheTag::parse(tag) {
            Some(tag) => removed += cache.purge_tag(&tag),
            // Pass-through tags this service never stores under are no-ops.
            None => debug!(target: TARGET, tag, "Ignoring unknown purge tag"),
        }
    }

    info!(
        target: TARGET,
        change = ?change,
        tags = ?plan.tags,
        paths = ?plan.paths,
        removed,
        "Purged cached content"
    );

    Json(RevalidateResponse {
        ok: true,
        revalidated: true,
        tags: plan.tags,
        paths: plan.paths,
    })
    .into_response()
}

/// Constant-time secret check. A missing configured secret rejects
/// everything; a missing candidate never matches.
fn secret_allowed(expected: Option<&str>, candidate: Option<&str>) -> bool {
    match (expected, candidate) {
        (Some(expected), Some(candidate)) => {
            expected.as_bytes().ct_eq(candidate.as_bytes()).unwrap_u8() == 1
        }
        _ => false,
    }
}
