// browser/api/memory.rs - In-memory document store
//
// Evaluates the same queries the PostgreSQL store does, against documents
// held in a map of collections. It backs the test suites and the demo
// binary when no DATABASE_URL is configured.
//
// Fault injection (`fail_next_fetches`, `fail_counts`) and call counters
// let tests drive the browser's failure paths.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use super::store::DocumentStore;
use crate::browser::model::{CountQuery, Document, PageQuery, DOCUMENT_ID_FIELD};
use crate::error::StoreError;

#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    failing_fetches: AtomicUsize,
    failing_counts: AtomicBool,
    fetch_calls: AtomicU64,
    count_calls: AtomicU64,
    last_page_query: Mutex<Option<PageQuery>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with one collection
    pub fn with_documents(collection: &str, documents: impl IntoIterator<Item = Document>) -> Self {
        let store = Self::new();
        store.insert_many(collection, documents);
        store
    }

    /// Insert or replace (by id) one document
    pub fn insert(&self, collection: &str, document: Document) {
        let mut collections = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        let documents = collections.entry(collection.to_string()).or_default();
        match documents.iter_mut().find(|existing| existing.id == document.id) {
            Some(existing) => *existing = document,
            None => documents.push(document),
        }
    }

    pub fn insert_many(&self, collection: &str, documents: impl IntoIterator<Item = Document>) {
        for document in documents {
            self.insert(collection, document);
        }
    }

    /// Remove a document, returning whether it existed
    pub fn remove(&self, collection: &str, id: &str) -> bool {
        let mut collections = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        let Some(documents) = collections.get_mut(collection) else {
            return false;
        };
        let before = documents.len();
        documents.retain(|document| document.id != id);
        documents.len() != before
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// The next `n` page fetches fail with `StoreError::Unavailable`
    pub fn fail_next_fetches(&self, n: usize) {
        self.failing_fetches.store(n, Ordering::SeqCst);
    }

    /// Every count fails while enabled
    pub fn fail_counts(&self, enabled: bool) {
        self.failing_counts.store(enabled, Ordering::SeqCst);
    }

    pub fn fetch_calls(&self) -> u64 {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn count_calls(&self) -> u64 {
        self.count_calls.load(Ordering::SeqCst)
    }

    /// The most recent page query received
    pub fn last_page_query(&self) -> Option<PageQuery> {
        self.last_page_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn take_fetch_failure(&self) -> bool {
        self.failing_fetches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Run a page query synchronously
    pub fn evaluate(&self, query: &PageQuery) -> Vec<Document> {
        let collections = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        let Some(documents) = collections.get(&query.collection) else {
            return Vec::new();
        };

        let order_field = query.order_by.field.as_str();
        let mut matching: Vec<&Document> = documents
            .iter()
            // documents without the sort field never appear in ordered results
            .filter(|document| order_field == DOCUMENT_ID_FIELD || document.get(order_field).is_some())
            .filter(|document| query.matches(document))
            .filter(|document| match &query.start_after {
                Some(cursor) => query.order_by.is_after(document, cursor),
                None => true,
            })
            .collect();

        matching.sort_by(|a, b| query.order_by.compare(a, b));
        matching.into_iter().take(query.limit).cloned().collect()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<Document>, StoreError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_page_query.lock().unwrap_or_else(PoisonError::into_inner) = Some(query.clone());

        if self.take_fetch_failure() {
            return Err(StoreError::Unavailable(format!(
                "injected failure reading '{}'",
                query.collection
            )));
        }

        Ok(self.evaluate(query))
    }

    async fn count(&self, query: &CountQuery) -> Result<u64, StoreError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_counts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "injected failure counting '{}'",
                query.collection
            )));
        }

        let collections = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        let count = collections
            .get(&query.collection)
            .map_or(0, |documents| documents.iter().filter(|d| query.matches(d)).count());
        Ok(count as u64)
    }
}
