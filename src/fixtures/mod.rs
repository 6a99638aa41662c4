// fixtures/mod.rs - Test fixtures module
//
// A fixture is reusable setup: instead of building documents by hand in
// every test, a collection fixture describes its documents once and any
// store (in-memory or PostgreSQL) can be seeded from it.

pub mod collections;

use crate::browser::model::Document;
use crate::browser::InMemoryStore;

/// A document collection used by tests and the demo binaries
pub trait TestCollection {
    /// Collection name the documents live under
    fn name() -> &'static str;

    /// The documents, in insertion order
    fn documents() -> Vec<Document>;

    /// In-memory store holding just this collection
    fn memory_store() -> InMemoryStore {
        InMemoryStore::with_documents(Self::name(), Self::documents())
    }
}
