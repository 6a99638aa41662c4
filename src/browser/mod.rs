// browser/mod.rs - Root module of the collection browser
//
// Architecture:
// - model/: documents, cursors, query specifications, table rows
// - api/: the DocumentStore trait and its backends (memory, PostgreSQL)
// - paginator.rs: the cursor-stack browser itself
// - filters.rs: filter selections -> predicates
// - table.rs: the registrant table facade around one browser
// - export.rs: bulk reads over the full query
// - notify.rs: user-visible notifications

pub mod api;
pub mod export;
pub mod filters;
pub mod model;
pub mod notify;
pub mod paginator;
pub mod table;

pub use api::{DocumentStore, InMemoryStore};
pub use filters::{FilterFields, FilterState};
pub use model::{BrowserStatus, CountQueryResponse, Cursor, Document, PageResult, QuerySpec};
pub use notify::{Notifier, TracingNotifier};
pub use paginator::CollectionBrowser;
pub use table::{TableOptions, UserDataTable};
