// error.rs - Error types for the collection browser
//
// Browser operations never return these to their callers; they surface as
// state plus a notification. They are returned by the builder, the stores,
// the export helpers and the configuration loader.

use thiserror::Error;

use crate::browser::model::Operator;

/// A query specification that cannot be sent to a store
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("query specification has no collection")]
    MissingCollection,

    #[error("page size must be between 1 and 10000, got {0}")]
    InvalidPageSize(usize),

    #[error("predicate or sort field name is empty")]
    EmptyField,

    #[error("operator '{operator}' on '{field}' requires a list value")]
    ExpectedList { field: String, operator: Operator },

    #[error("'{field}' has {count} alternatives, at most {max} are allowed")]
    TooManyValues { field: String, count: usize, max: usize },
}

/// Failure reported by a document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error("query rejected by document store: {0}")]
    InvalidQuery(String),

    #[cfg(feature = "db-tools")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Invalid configuration value
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber { key: String, value: String },

    #[error("{key} must be a comma separated list of positive integers, got '{value}'")]
    InvalidPageSizeOptions { key: String, value: String },

    #[error("default page size {page_size} is not one of the page size options {options:?}")]
    PageSizeNotAnOption { page_size: usize, options: Vec<usize> },

    #[error("'{0}' is not a valid table identifier")]
    InvalidIdentifier(String),
}
