// browser/api/mod.rs - Document store backends
//
// The browser only talks to the `DocumentStore` trait. The in-memory store
// is always available; the PostgreSQL store and its pool helpers need the
// `db-tools` feature.

pub mod memory;
pub mod store;

#[cfg(feature = "db-tools")]
pub mod db;

#[cfg(feature = "db-tools")]
pub mod queries;

pub use memory::InMemoryStore;
pub use store::DocumentStore;

#[cfg(feature = "db-tools")]
pub use queries::PgDocumentStore;
