// common/mod.rs - Shared test utilities
//
// This module provides reusable fixtures and helpers so every suite:
// 1. Starts from the same seeded registrations collection
// 2. Can hold store responses back and release them in any order
// 3. Can assert on the notifications a browser or table emitted
//
// PostgreSQL helpers live in `postgres.rs` and need the `db-tools` feature.

#![allow(dead_code)]

#[cfg(feature = "db-tools")]
pub mod postgres;

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use collection_browser::browser::model::{CountQuery, Direction, PageQuery};
use collection_browser::browser::{DocumentStore, InMemoryStore, Notifier};
use collection_browser::error::StoreError;
use collection_browser::fixtures::collections::registrations::COLLECTION;
use collection_browser::fixtures::collections::RegistrationsCollection;
use collection_browser::fixtures::TestCollection;
use collection_browser::{Document, QuerySpec};

/// The 25-document registrations fixture in a fresh in-memory store
pub fn registrations_store() -> Arc<InMemoryStore> {
    Arc::new(RegistrationsCollection::memory_store())
}

/// Registrations in generation order (`registeredAt` ascending)
pub fn registrations_spec(page_size: usize) -> QuerySpec {
    QuerySpec::builder(COLLECTION)
        .order_by("registeredAt", Direction::Asc)
        .page_size(page_size)
        .build()
        .expect("valid spec")
}

/// Same as `registrations_spec` with the total count enabled
pub fn counted_spec(page_size: usize) -> QuerySpec {
    registrations_spec(page_size)
        .to_builder()
        .total_count(true)
        .build()
        .expect("valid spec")
}

/// `n` documents `d000..` with an increasing `rank` in collection `items`
pub fn numbered_store(n: usize) -> Arc<InMemoryStore> {
    let documents = (0..n).map(|i| Document::from_value(format!("d{:03}", i), json!({ "rank": i, "even": i % 2 == 0 })));
    Arc::new(InMemoryStore::with_documents("items", documents))
}

pub fn ids(documents: &[Document]) -> Vec<String> {
    documents.iter().map(|d| d.id.clone()).collect()
}

/// Expected ids `reg-{from}..reg-{to}` (exclusive)
pub fn registration_ids(from: usize, to: usize) -> Vec<String> {
    (from..to).map(|i| format!("reg-{:03}", i)).collect()
}

/// Notifier that remembers every message
#[derive(Default)]
pub struct RecordingNotifier {
    errors: Mutex<Vec<String>>,
    successes: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn error_notification(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn success_notification(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }
}

/// In-memory store whose responses can be held back
///
/// Each call takes the oldest gate of its queue and waits for it to open
/// before reading. Calls pass straight through while the queue is empty.
#[derive(Default)]
pub struct GatedStore {
    inner: InMemoryStore,
    fetch_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    count_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
}

impl GatedStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn registrations() -> Arc<Self> {
        Arc::new(Self::new(RegistrationsCollection::memory_store()))
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    /// Hold the next page fetch until the returned sender fires
    pub fn gate_next_fetch(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.fetch_gates.lock().unwrap().push_back(rx);
        tx
    }

    /// Hold the next count until the returned sender fires
    pub fn gate_next_count(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.count_gates.lock().unwrap().push_back(rx);
        tx
    }
}

#[async_trait]
impl DocumentStore for GatedStore {
    fn backend_tag(&self) -> &'static str {
        "gated"
    }

    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<Document>, StoreError> {
        let gate = self.fetch_gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.inner.fetch_page(query).await
    }

    async fn count(&self, query: &CountQuery) -> Result<u64, StoreError> {
        let gate = self.count_gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.inner.count(query).await
    }
}

/// Let other futures in the same `join` make progress
pub async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}
