//! Search-widget session logic.
//!
//! Models the client-side search overlay as cooperative single-owner state:
//! keystrokes are debounced, each dispatched request carries a monotonically
//! increasing sequence number, and a response is applied only while its
//! sequence is still the latest and the session is still alive. A bounded
//! memo keyed by normalized query avoids redundant round-trips within one
//! session and is torn down with it.
//!
//! Closing the session cancels the pending debounce timer; an already
//! in-flight request is not aborted, its eventual response is just ignored.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::AbortHandle;
use tracing::warn;

use crate::application::content::ContentService;
use crate::domain::posts::{BlogPost, PaginatedResult};
use crate::infra::cms::CmsError;

const TARGET: &str = "brezza::search";

/// Delay between the last keystroke and the dispatched request.
pub const DEBOUNCE: Duration = Duration::from_millis(300);
/// Maximum number of memoized query results per session.
pub const MEMO_CAPACITY: usize = 50;
/// Page size the overlay requests.
const SESSION_PAGE_SIZE: u32 = 25;

/// Seam between the session and whatever serves search results.
#[async_trait]
pub trait SearchBackend: Send + Sync + 'static {
    async fn search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<BlogPost>, CmsError>;
}

#[async_trait]
impl SearchBackend for ContentService {
    async fn search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<BlogPost>, CmsError> {
        self.search_posts(query, page, page_size).await
    }
}

/// Fixed-capacity map with insertion-order eviction.
///
/// Not an LRU: lookups do not refresh an entry's position, the oldest
/// inserted key is always the eviction victim.
#[derive(Debug, Default)]
pub struct QueryMemo {
    capacity: usize,
    order: VecDeque<String>,
    entries: HashMap<String, PaginatedResult<BlogPost>>,
}

impl QueryMemo {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&PaginatedResult<BlogPost>> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, value: PaginatedResult<BlogPost>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key.clone(), value).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }
}

#[derive(Debug, Default)]
struct SessionState {
    memo: QueryMemo,
    results: Option<PaginatedResult<BlogPost>>,
}

struct Shared<B> {
    backend: B,
    debounce: Duration,
    alive: AtomicBool,
    seq: AtomicU64,
    state: Mutex<SessionState>,
    pending: Mutex<Option<AbortHandle>>,
}

/// One open search overlay: debounced input, sequenced responses, memoized
/// queries. Cheap to clone; all clones share the same session.
pub struct SearchSession<B: SearchBackend> {
    shared: Arc<Shared<B>>,
}

impl<B: SearchBackend> Clone for SearchSession<B> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<B: SearchBackend> SearchSession<B> {
    pub fn new(backend: B) -> Self {
        Self::with_debounce(backend, DEBOUNCE)
    }

    pub fn with_debounce(backend: B, debounce: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                backend,
                debounce,
                alive: AtomicBool::new(true),
                seq: AtomicU64::new(0),
                state: Mutex::new(SessionState {
                    memo: QueryMemo::new(MEMO_CAPACITY),
                    results: None,
                }),
                pending: Mutex::new(None),
            }),
        }
    }

    /// Record a keystroke: cancel any pending timer and schedule a dispatch
    /// after the debounce delay. Only the last keystroke in a burst reaches
    /// the network.
    pub fn keystroke(&self, query: &str) {
        self.cancel_pending();
        if !self.shared.alive.load(Ordering::SeqCst) {
            return;
        }
        let shared = self.shared.clone();
        let query = query.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(shared.debounce).await;
            dispatch(&shared, &query).await;
        });
        *lock(&self.shared.pending) = Some(handle.abort_handle());
    }

    /// Dispatch a query immediately, bypassing the debounce timer.
    pub async fn submit(&self, query: &str) {
        dispatch(&self.shared, query).await;
    }

    /// Close the overlay: cancel the pending timer, mark the session dead so
    /// in-flight responses are ignored, and drop the memo.
    pub fn close(&self) {
        self.shared.alive.store(false, Ordering::SeqCst);
        self.cancel_pending();
        let mut state = lock(&self.shared.state);
        state.memo.clear();
        state.results = None;
    }

    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::SeqCst)
    }

    /// Snapshot of the currently displayed results.
    pub fn results(&self) -> Option<PaginatedResult<BlogPost>> {
        lock(&self.shared.state).results.clone()
    }

    pub fn memo_len(&self) -> usize {
        lock(&self.shared.state).memo.len()
    }

    fn cancel_pending(&self) {
        if let Some(handle) = lock(&self.shared.pending).take() {
            handle.abort();
        }
    }
}

async fn dispatch<B: SearchBackend>(shared: &Arc<Shared<B>>, query: &str) {
    if !shared.alive.load(Ordering::SeqCst) {
        return;
    }
    let seq = shared.seq.fetch_add(1, Ordering::SeqCst) + 1;

    let trimmed = query.trim();
    if trimmed.is_empty() {
        apply(shared, seq, PaginatedResult::empty(1, SESSION_PAGE_SIZE));
        return;
    }

    let key = trimmed.to_lowercase();
    let memoized = lock(&shared.state).memo.get(&key).cloned();
    if let Some(hit) = memoized {
        apply(shared, seq, hit);
        return;
    }

    let outcome = shared.backend.search(trimmed, 1, SESSION_PAGE_SIZE).await;
    // Liveness is checked again after the await: the overlay may have closed
    // while the request was in flight.
    if !shared.alive.load(Ordering::SeqCst) {
        return;
    }
    match outcome {
        Ok(page) => {
            lock(&shared.state).memo.insert(key, page.clone());
            apply(shared, seq, page);
        }
        Err(err) => {
            // Transient failure renders as "no results", same as a genuine
            // empty match.
            warn!(target: TARGET, query = trimmed, error = %err, "Search request failed");
            apply(shared, seq, PaginatedResult::empty(1, SESSION_PAGE_SIZE));
        }
    }
}

fn apply<B: SearchBackend>(shared: &Arc<Shared<B>>, seq: u64, page: PaginatedResult<BlogPost>) {
    if !shared.alive.load(Ordering::SeqCst) {
        return;
    }
    if shared.seq.load(Ordering::SeqCst) != seq {
        return;
    }
    lock(&shared.state).results = Some(page);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
