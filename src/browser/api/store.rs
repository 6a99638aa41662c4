// browser/api/store.rs - The document database seam
//
// A store answers two questions: "give me up to `limit` documents matching
// these predicates, in this order, after this cursor" and "how many
// documents match these predicates". Retries and backoff, if any, belong
// to the store, never to the browser.

use async_trait::async_trait;
use std::sync::Arc;

use crate::browser::model::{CountQuery, Document, PageQuery};
use crate::error::StoreError;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs
    fn backend_tag(&self) -> &'static str;

    /// Bounded, ordered read starting after `query.start_after`
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<Document>, StoreError>;

    /// Aggregate count under `query.filters`
    async fn count(&self, query: &CountQuery) -> Result<u64, StoreError>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn backend_tag(&self) -> &'static str {
        (**self).backend_tag()
    }

    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<Document>, StoreError> {
        (**self).fetch_page(query).await
    }

    async fn count(&self, query: &CountQuery) -> Result<u64, StoreError> {
        (**self).count(query).await
    }
}
