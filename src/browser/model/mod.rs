// browser/model/mod.rs - Shared data models for the collection browser
//
// These types travel between the browser, the document stores and the
// table facade. Everything here is plain data: no I/O, no locking.
//
// Layout:
// - mod.rs: documents, cursors, page results and the browser status
// - query.rs: the validated query specification and its predicates
// - user.rs: the flat row shown in the registrant tables

pub mod query;
pub mod user;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

pub use query::{
    CountQuery, Direction, FieldFilter, Operator, OrderBy, PageQuery, QuerySpec,
    QuerySpecBuilder, DOCUMENT_ID_FIELD, MAX_DISJUNCTION_VALUES, MAX_PAGE_SIZE,
};
pub use user::UserDataEntry;

/// A document from a remote collection
///
/// Fields are a JSON object; nested values are addressed with dotted paths
/// such as `user.universityCountryCode`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Build a document from a JSON value. Non-object values yield an empty field map.
    pub fn from_value(id: impl Into<String>, value: Value) -> Self {
        let fields = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(id, fields)
    }

    /// Resolve a dotted field path.
    ///
    /// `__name__` resolves to nothing here; use [`Document::sort_value`]
    /// when the document id has to take part in ordering.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Convenience accessor for string fields
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// The value this document is ordered by for `field`
    pub fn sort_value(&self, field: &str) -> Option<Value> {
        if field == DOCUMENT_ID_FIELD {
            return Some(Value::String(self.id.clone()));
        }
        self.get(field).cloned()
    }
}

/// Total order over JSON values, following the document database's
/// cross-type ordering: null < booleans < numbers < strings < arrays < objects.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ordering = compare_values(left, right);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => x
            .len()
            .cmp(&y.len())
            .then_with(|| a.to_string().cmp(&b.to_string())),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Equality as the database sees it (`1 == 1.0`)
pub fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Ordering::Equal
}

/// Opaque pointer to the last document seen on a page
///
/// Holds the sort value of that document plus its id, so documents sharing
/// a sort value still paginate deterministically.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    value: Value,
    document_id: String,
}

impl Cursor {
    pub fn new(value: Value, document_id: impl Into<String>) -> Self {
        Self {
            value,
            document_id: document_id.into(),
        }
    }

    /// Cursor pointing at `document` under the ordering of `order_field`
    pub fn from_document(document: &Document, order_field: &str) -> Self {
        Self::new(
            document.sort_value(order_field).unwrap_or(Value::Null),
            document.id.clone(),
        )
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }
}

/// Total count response, `None` while unknown or after a failed count
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountQueryResponse {
    pub count: Option<u64>,
}

/// Lifecycle of a browser. Page indexes here are 0-based.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrowserStatus {
    #[default]
    Idle,
    Loading { target_page: usize },
    Loaded { page: usize, has_more: bool },
    Error { page: usize },
}

impl std::fmt::Display for BrowserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrowserStatus::Idle => write!(f, "idle"),
            BrowserStatus::Loading { target_page } => write!(f, "loading page {}", target_page + 1),
            BrowserStatus::Loaded { page, has_more } => {
                write!(f, "page {}", page + 1)?;
                if *has_more {
                    write!(f, " (more available)")?;
                }
                Ok(())
            }
            BrowserStatus::Error { page } => write!(f, "error on page {}", page + 1),
        }
    }
}

/// What a view renders: the current page plus navigation state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    pub data: Vec<Document>,
    /// 1-indexed, for display
    pub page: usize,
    pub loading: bool,
    pub next_disabled: bool,
    pub count_query_response: CountQueryResponse,
    pub status: BrowserStatus,
}
