// browser/paginator.rs - Paginated, filtered collection browser
//
// A CollectionBrowser shows one page of a QuerySpec at a time and keeps a
// stack of cursors, one per page boundary, so it can go back without
// re-reading from the start.
//
// How a fetch works:
// - every page read asks for page_size + 1 rows; the extra row only tells
//   us whether a next page exists and is never displayed
// - pages after the first start after the cursor on top of the stack
// - the total count is a separate aggregate query, refreshed only when the
//   predicates change
//
// Ordering: next/prev/set_query_spec can be called while an earlier fetch
// is still in flight. Every fetch carries a request token and its result is
// committed only if that token is still the latest one, so a slow response
// for an old page or an old spec can never overwrite newer state.
//
// Nothing here returns an error: failures become state (`Error`) plus a
// notification, and the last good page stays visible.

use futures_util::future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::api::DocumentStore;
use super::model::{BrowserStatus, CountQueryResponse, Cursor, Document, PageResult, QuerySpec};
use super::notify::{Notifier, TracingNotifier};

/// Mutable browser state, guarded by one mutex that is never held across an await
struct BrowserState {
    spec: QuerySpec,
    /// Committed stack; its length is the current 0-based page index
    cursors: Vec<Cursor>,
    /// Target stack of the latest in-flight page request
    pending: Option<Vec<Cursor>>,
    data: Vec<Document>,
    has_more: bool,
    status: BrowserStatus,
    count: Option<u64>,
    issued: u64,
    latest_page: u64,
    latest_count: u64,
    disposed: bool,
}

impl BrowserState {
    fn new(spec: QuerySpec) -> Self {
        Self {
            spec,
            cursors: Vec::new(),
            pending: None,
            data: Vec::new(),
            has_more: false,
            status: BrowserStatus::Idle,
            count: None,
            issued: 0,
            latest_page: 0,
            latest_count: 0,
            disposed: false,
        }
    }

    fn issue_token(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn begin_page(&mut self, cursors: Vec<Cursor>) -> PageRequest {
        let token = self.issue_token();
        self.latest_page = token;
        self.status = BrowserStatus::Loading {
            target_page: cursors.len(),
        };
        self.pending = Some(cursors.clone());
        PageRequest {
            token,
            spec: self.spec.clone(),
            cursors,
        }
    }

    fn begin_count(&mut self) -> CountRequest {
        let token = self.issue_token();
        self.latest_count = token;
        CountRequest {
            token,
            spec: self.spec.clone(),
        }
    }

    /// Stack that backward navigation starts from: the in-flight target if any
    fn navigation_base(&self) -> &[Cursor] {
        self.pending.as_deref().unwrap_or(&self.cursors)
    }
}

struct PageRequest {
    token: u64,
    spec: QuerySpec,
    cursors: Vec<Cursor>,
}

struct CountRequest {
    token: u64,
    spec: QuerySpec,
}

/// Page-at-a-time view over a document collection
pub struct CollectionBrowser<S, N = TracingNotifier> {
    store: Arc<S>,
    notifier: Arc<N>,
    state: Mutex<BrowserState>,
}

impl<S, N> CollectionBrowser<S, N>
where
    S: DocumentStore,
    N: Notifier,
{
    /// Browser bound to `spec` that has not fetched anything yet
    pub fn new(store: Arc<S>, notifier: Arc<N>, spec: QuerySpec) -> Self {
        Self {
            store,
            notifier,
            state: Mutex::new(BrowserState::new(spec)),
        }
    }

    /// Create a browser and load its first page (and count, when requested)
    pub async fn initialize(store: Arc<S>, notifier: Arc<N>, spec: QuerySpec) -> Self {
        let browser = Self::new(store, notifier, spec);
        browser.load_first_page().await;
        browser
    }

    /// Idle -> Loading(0). Also usable to start over on the current spec.
    pub async fn load_first_page(&self) {
        let (page, count) = {
            let mut state = self.lock();
            if state.disposed {
                return;
            }
            state.cursors.clear();
            state.has_more = false;
            let page = state.begin_page(Vec::new());
            let count = state.spec.get_total_count().then(|| state.begin_count());
            (page, count)
        };

        tracing::debug!(
            "Loading first page of '{}' from {} store",
            page.spec.collection(),
            self.store.backend_tag()
        );
        self.run(page, count).await;
    }

    /// Advance one page. No-op when no further page is known to exist.
    ///
    /// While a `prev()` is in flight, advances from its target, i.e. back to
    /// a page already visited. Any other in-flight request makes this a no-op.
    pub async fn next(&self) {
        let request = {
            let mut state = self.lock();
            if state.disposed {
                return;
            }

            let cursors = match state.pending.as_deref() {
                Some(pending) if pending.len() < state.cursors.len() && state.cursors.starts_with(pending) => {
                    state.cursors[..=pending.len()].to_vec()
                }
                Some(_) => {
                    tracing::debug!("next() ignored: a forward or reset request is in flight");
                    return;
                }
                None => {
                    if !state.has_more {
                        tracing::debug!("next() ignored: no further page");
                        return;
                    }
                    let Some(last) = state.data.last() else {
                        return;
                    };
                    let cursor = Cursor::from_document(last, &state.spec.order_by().field);
                    let mut cursors = state.cursors.clone();
                    cursors.push(cursor);
                    cursors
                }
            };
            state.begin_page(cursors)
        };

        self.run_page(request).await;
    }

    /// Go back one page. No-op on the first page.
    pub async fn prev(&self) {
        let request = {
            let mut state = self.lock();
            if state.disposed || state.navigation_base().is_empty() {
                tracing::debug!("prev() ignored: already on the first page");
                return;
            }
            let mut cursors = state.navigation_base().to_vec();
            cursors.pop();
            state.begin_page(cursors)
        };

        self.run_page(request).await;
    }

    /// Replace the query: clears the cursor stack, returns to page 1 and
    /// re-fetches. Results still in flight for the previous spec are dropped.
    pub async fn set_query_spec(&self, spec: QuerySpec) {
        let (page, count) = {
            let mut state = self.lock();
            if state.disposed {
                return;
            }

            let refresh_count = spec.get_total_count()
                && (!state.spec.same_filter_set(&spec)
                    || !state.spec.get_total_count()
                    || state.count.is_none());

            if !spec.get_total_count() {
                // drop any count still in flight for the old spec
                state.count = None;
                let token = state.issue_token();
                state.latest_count = token;
            } else if refresh_count {
                state.count = None;
            }

            tracing::info!(
                "Query changed on '{}': {} predicate(s), order {} {}, page size {}",
                spec.collection(),
                spec.filters().len(),
                spec.order_by().field,
                spec.order_by().direction,
                spec.page_size()
            );

            state.spec = spec;
            state.cursors.clear();
            state.has_more = false;
            let page = state.begin_page(Vec::new());
            let count = refresh_count.then(|| state.begin_count());
            (page, count)
        };

        self.run(page, count).await;
    }

    /// Apply a new page size. Invalid sizes are logged and ignored.
    pub async fn set_page_size(&self, page_size: usize) {
        let spec = self.query_spec();
        match spec.with_page_size(page_size) {
            Ok(spec) => self.set_query_spec(spec).await,
            Err(e) => tracing::warn!("Ignoring page size {}: {}", page_size, e),
        }
    }

    /// Re-fetch the current page, e.g. after an error
    pub async fn refresh(&self) {
        let request = {
            let mut state = self.lock();
            if state.disposed {
                return;
            }
            let cursors = state.cursors.clone();
            state.begin_page(cursors)
        };

        self.run_page(request).await;
    }

    /// Abandon all in-flight requests; later calls do nothing
    pub fn dispose(&self) {
        let mut state = self.lock();
        state.disposed = true;
        state.pending = None;
        let page_token = state.issue_token();
        let count_token = state.issue_token();
        state.latest_page = page_token;
        state.latest_count = count_token;
        if matches!(state.status, BrowserStatus::Loading { .. }) {
            state.status = BrowserStatus::Idle;
        }
        tracing::debug!("Browser on '{}' disposed", state.spec.collection());
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    /// Everything a view needs to render, in one consistent read
    pub fn snapshot(&self) -> PageResult {
        let state = self.lock();
        PageResult {
            data: state.data.clone(),
            page: state.cursors.len() + 1,
            loading: matches!(state.status, BrowserStatus::Loading { .. }),
            next_disabled: !state.has_more || state.disposed,
            count_query_response: CountQueryResponse { count: state.count },
            status: state.status,
        }
    }

    pub fn data(&self) -> Vec<Document> {
        self.lock().data.clone()
    }

    /// Current page, 1-indexed
    pub fn page(&self) -> usize {
        self.lock().cursors.len() + 1
    }

    pub fn loading(&self) -> bool {
        matches!(self.lock().status, BrowserStatus::Loading { .. })
    }

    pub fn next_disabled(&self) -> bool {
        let state = self.lock();
        !state.has_more || state.disposed
    }

    pub fn count_query_response(&self) -> CountQueryResponse {
        CountQueryResponse {
            count: self.lock().count,
        }
    }

    pub fn status(&self) -> BrowserStatus {
        self.lock().status
    }

    /// Number of cursors on the stack (equals `page() - 1`)
    pub fn cursor_depth(&self) -> usize {
        self.lock().cursors.len()
    }

    pub fn query_spec(&self) -> QuerySpec {
        self.lock().spec.clone()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn notifier(&self) -> &Arc<N> {
        &self.notifier
    }

    fn lock(&self) -> MutexGuard<'_, BrowserState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(&self, page: PageRequest, count: Option<CountRequest>) {
        match count {
            Some(count) => {
                future::join(self.run_page(page), self.run_count(count)).await;
            }
            None => self.run_page(page).await,
        }
    }

    async fn run_page(&self, request: PageRequest) {
        let page_size = request.spec.page_size();
        let query = request.spec.page_query(request.cursors.last());
        let result = self.store.fetch_page(&query).await;

        let failure = {
            let mut state = self.lock();
            if state.disposed || state.latest_page != request.token {
                tracing::debug!("Discarding stale page response #{}", request.token);
                return;
            }
            state.pending = None;

            match result {
                Ok(mut documents) => {
                    let has_more = documents.len() > page_size;
                    documents.truncate(page_size);

                    state.cursors = request.cursors;
                    state.data = documents;
                    state.has_more = has_more;
                    let page = state.cursors.len();
                    state.status = BrowserStatus::Loaded { page, has_more };
                    tracing::debug!(
                        "Loaded page {} of '{}' ({} rows, more: {})",
                        state.cursors.len() + 1,
                        request.spec.collection(),
                        state.data.len(),
                        has_more
                    );
                    None
                }
                Err(e) => {
                    let page = state.cursors.len();
                    state.status = BrowserStatus::Error { page };
                    tracing::error!(
                        "Page fetch #{} on '{}' failed: {}",
                        request.token,
                        request.spec.collection(),
                        e
                    );
                    Some(format!(
                        "Could not load page {} of {}: {}",
                        request.cursors.len() + 1,
                        request.spec.collection(),
                        e
                    ))
                }
            }
        };

        if let Some(message) = failure {
            self.notifier.error_notification(&message);
        }
    }

    async fn run_count(&self, request: CountRequest) {
        let result = self.store.count(&request.spec.count_query()).await;

        let mut state = self.lock();
        if state.disposed || state.latest_count != request.token {
            tracing::debug!("Discarding stale count response #{}", request.token);
            return;
        }

        match result {
            Ok(count) => state.count = Some(count),
            Err(e) => {
                // pagination keeps working without a total
                state.count = None;
                tracing::warn!("Count on '{}' failed: {}", request.spec.collection(), e);
            }
        }
    }
}
