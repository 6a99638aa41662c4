// lib.rs - Root module for the collection_browser library
//
// A paginated, filterable, cursor-based browser over document collections,
// plus the stores, fixtures and configuration around it.

/// The browser, its data model and its document stores
pub mod browser;

/// Environment-driven configuration
pub mod config;

/// Error types shared by the builder, stores and configuration
pub mod error;

/// Deterministic collections for tests and demos
pub mod fixtures;

pub use browser::{CollectionBrowser, Document, QuerySpec, UserDataTable};
pub use config::BrowserConfig;
