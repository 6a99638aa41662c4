// browser/model/query.rs - Query specification and filter predicates
//
// A QuerySpec is an immutable description of what a browser fetches:
// collection, predicates, sort and page size. It can only be produced by
// QuerySpecBuilder, so every spec that reaches a store is already valid.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{compare_values, values_equal, Cursor, Document};
use crate::error::SpecError;

/// Pseudo-field that orders by document id
pub const DOCUMENT_ID_FIELD: &str = "__name__";

/// Upper bound on the values of one `in` / `array-contains-any` predicate
pub const MAX_DISJUNCTION_VALUES: usize = 30;

/// Largest page a spec may ask for
pub const MAX_PAGE_SIZE: usize = 10_000;

/// Predicate operators understood by the document stores
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "array-contains")]
    ArrayContains,
    #[serde(rename = "array-contains-any")]
    ArrayContainsAny,
}

impl Operator {
    /// Operators whose value is a list of alternatives
    pub fn takes_list(self) -> bool {
        matches!(self, Operator::In | Operator::ArrayContainsAny)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::Equal => write!(f, "=="),
            Operator::In => write!(f, "in"),
            Operator::ArrayContains => write!(f, "array-contains"),
            Operator::ArrayContainsAny => write!(f, "array-contains-any"),
        }
    }
}

/// One `(field, operator, value)` predicate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Evaluate this predicate against a document
    pub fn matches(&self, document: &Document) -> bool {
        let Some(actual) = document.sort_value(&self.field) else {
            return false;
        };

        match self.operator {
            Operator::Equal => values_equal(&actual, &self.value),
            Operator::In => list_items(&self.value)
                .iter()
                .any(|candidate| values_equal(&actual, candidate)),
            Operator::ArrayContains => actual
                .as_array()
                .is_some_and(|items| items.iter().any(|item| values_equal(item, &self.value))),
            Operator::ArrayContainsAny => {
                let Some(items) = actual.as_array() else {
                    return false;
                };
                list_items(&self.value)
                    .iter()
                    .any(|candidate| items.iter().any(|item| values_equal(item, candidate)))
            }
        }
    }
}

fn list_items(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or(&[])
}

/// Sort direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Asc => write!(f, "asc"),
            Direction::Desc => write!(f, "desc"),
        }
    }
}

/// Sort field and direction
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Compare two documents under this ordering, ties broken by id.
    /// Documents missing the field sort first.
    pub fn compare(&self, a: &Document, b: &Document) -> std::cmp::Ordering {
        let left = a.sort_value(&self.field).unwrap_or(Value::Null);
        let right = b.sort_value(&self.field).unwrap_or(Value::Null);
        let ordering = compare_values(&left, &right).then_with(|| a.id.cmp(&b.id));
        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }

    /// Whether `document` comes strictly after `cursor` in this ordering
    pub fn is_after(&self, document: &Document, cursor: &Cursor) -> bool {
        let value = document.sort_value(&self.field).unwrap_or(Value::Null);
        let ordering = compare_values(&value, cursor.value())
            .then_with(|| document.id.as_str().cmp(cursor.document_id()));
        match self.direction {
            Direction::Asc => ordering.is_gt(),
            Direction::Desc => ordering.is_lt(),
        }
    }
}

impl Default for OrderBy {
    fn default() -> Self {
        Self::new(DOCUMENT_ID_FIELD, Direction::Asc)
    }
}

/// Immutable, validated description of a paginated query
///
/// Two specs compare equal when every field matches; callers use that to
/// decide whether a rebuilt spec needs a re-fetch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuerySpec {
    collection: String,
    filters: Vec<FieldFilter>,
    order_by: OrderBy,
    page_size: usize,
    get_total_count: bool,
}

impl QuerySpec {
    pub fn builder(collection: impl Into<String>) -> QuerySpecBuilder {
        QuerySpecBuilder::new(collection)
    }

    /// Builder pre-filled with this spec
    pub fn to_builder(&self) -> QuerySpecBuilder {
        QuerySpecBuilder {
            collection: self.collection.clone(),
            filters: self.filters.clone(),
            order_by: self.order_by.clone(),
            page_size: self.page_size,
            get_total_count: self.get_total_count,
        }
    }

    /// Same spec with another page size
    pub fn with_page_size(&self, page_size: usize) -> Result<QuerySpec, SpecError> {
        self.to_builder().page_size(page_size).build()
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    pub fn order_by(&self) -> &OrderBy {
        &self.order_by
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn get_total_count(&self) -> bool {
        self.get_total_count
    }

    /// Collection and predicates match; sort and page size may differ
    pub fn same_filter_set(&self, other: &QuerySpec) -> bool {
        self.collection == other.collection && self.filters == other.filters
    }

    /// Page fetch for this spec: one lookahead row beyond the page size
    pub fn page_query(&self, start_after: Option<&Cursor>) -> PageQuery {
        self.query_with_limit(self.page_size.saturating_add(1), start_after)
    }

    /// Same predicates and sort with an arbitrary limit (used for full reads)
    pub fn query_with_limit(&self, limit: usize, start_after: Option<&Cursor>) -> PageQuery {
        PageQuery {
            collection: self.collection.clone(),
            filters: self.filters.clone(),
            order_by: self.order_by.clone(),
            limit,
            start_after: start_after.cloned(),
        }
    }

    /// Aggregate count under the same predicates
    pub fn count_query(&self) -> CountQuery {
        CountQuery {
            collection: self.collection.clone(),
            filters: self.filters.clone(),
        }
    }
}

/// Builder for [`QuerySpec`]
///
/// Empty lists given to `in` / `array-contains-any` are dropped instead of
/// being sent, since the database rejects them.
#[derive(Clone, Debug)]
pub struct QuerySpecBuilder {
    collection: String,
    filters: Vec<FieldFilter>,
    order_by: OrderBy,
    page_size: usize,
    get_total_count: bool,
}

impl QuerySpecBuilder {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: OrderBy::default(),
            page_size: 10,
            get_total_count: false,
        }
    }

    pub fn filter(mut self, field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter::new(field, operator, value));
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Operator::Equal, value)
    }

    pub fn where_in<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.filter(field, Operator::In, Value::Array(values))
    }

    pub fn filters(mut self, filters: impl IntoIterator<Item = FieldFilter>) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Drop every predicate collected so far
    pub fn clear_filters(mut self) -> Self {
        self.filters.clear();
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = OrderBy::new(field, direction);
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn total_count(mut self, enabled: bool) -> Self {
        self.get_total_count = enabled;
        self
    }

    pub fn build(self) -> Result<QuerySpec, SpecError> {
        if self.collection.trim().is_empty() {
            return Err(SpecError::MissingCollection);
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(SpecError::InvalidPageSize(self.page_size));
        }
        if self.order_by.field.trim().is_empty() {
            return Err(SpecError::EmptyField);
        }

        let mut filters = Vec::with_capacity(self.filters.len());
        for filter in self.filters {
            if filter.field.trim().is_empty() {
                return Err(SpecError::EmptyField);
            }

            if filter.operator.takes_list() {
                let Some(values) = filter.value.as_array() else {
                    return Err(SpecError::ExpectedList {
                        field: filter.field,
                        operator: filter.operator,
                    });
                };
                if values.is_empty() {
                    tracing::debug!(
                        "Omitting '{}' predicate on '{}': empty value list",
                        filter.operator,
                        filter.field
                    );
                    continue;
                }
                if values.len() > MAX_DISJUNCTION_VALUES {
                    return Err(SpecError::TooManyValues {
                        field: filter.field,
                        count: values.len(),
                        max: MAX_DISJUNCTION_VALUES,
                    });
                }
            }

            filters.push(filter);
        }

        Ok(QuerySpec {
            collection: self.collection,
            filters,
            order_by: self.order_by,
            page_size: self.page_size,
            get_total_count: self.get_total_count,
        })
    }
}

/// A bounded page read sent to a store
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageQuery {
    pub collection: String,
    pub filters: Vec<FieldFilter>,
    pub order_by: OrderBy,
    pub limit: usize,
    pub start_after: Option<Cursor>,
}

/// An aggregate count sent to a store
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CountQuery {
    pub collection: String,
    pub filters: Vec<FieldFilter>,
}

impl CountQuery {
    pub fn matches(&self, document: &Document) -> bool {
        self.filters.iter().all(|filter| filter.matches(document))
    }
}

impl PageQuery {
    pub fn matches(&self, document: &Document) -> bool {
        self.filters.iter().all(|filter| filter.matches(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registrant() -> Document {
        Document::from_value(
            "r1",
            json!({
                "user": { "universityCountryCode": "CH", "searchTokens": ["ada", "lovelace"] },
                "interestIds": ["rust", "ml"],
            }),
        )
    }

    #[test]
    fn test_builder_defaults() {
        let spec = QuerySpec::builder("registrations").build().unwrap();

        assert_eq!(spec.collection(), "registrations");
        assert_eq!(spec.page_size(), 10);
        assert!(spec.filters().is_empty());
        assert_eq!(spec.order_by(), &OrderBy::default());
        assert!(!spec.get_total_count());
    }

    #[test]
    fn test_builder_rejects_invalid_specs() {
        assert!(matches!(
            QuerySpec::builder("  ").build(),
            Err(SpecError::MissingCollection)
        ));
        assert!(matches!(
            QuerySpec::builder("c").page_size(0).build(),
            Err(SpecError::InvalidPageSize(0))
        ));
        assert!(matches!(
            QuerySpec::builder("c").page_size(usize::MAX).build(),
            Err(SpecError::InvalidPageSize(usize::MAX))
        ));
        assert!(matches!(
            QuerySpec::builder("c").page_size(MAX_PAGE_SIZE + 1).build(),
            Err(SpecError::InvalidPageSize(_))
        ));
        assert!(matches!(
            QuerySpec::builder("c").where_eq("", 1).build(),
            Err(SpecError::EmptyField)
        ));
        assert!(matches!(
            QuerySpec::builder("c").filter("f", Operator::In, "not a list").build(),
            Err(SpecError::ExpectedList { .. })
        ));
    }

    #[test]
    fn test_empty_in_list_is_omitted() {
        let spec = QuerySpec::builder("c")
            .where_in("user.universityCountryCode", Vec::<String>::new())
            .where_eq("livestreamId", "ls1")
            .build()
            .unwrap();

        assert_eq!(spec.filters().len(), 1);
        assert_eq!(spec.filters()[0].field, "livestreamId");
    }

    #[test]
    fn test_too_many_disjunction_values() {
        let values: Vec<u32> = (0..=MAX_DISJUNCTION_VALUES as u32).collect();
        let result = QuerySpec::builder("c").where_in("f", values).build();

        assert!(matches!(result, Err(SpecError::TooManyValues { count: 31, max: 30, .. })));
    }

    #[test]
    fn test_predicate_matching() {
        let doc = registrant();

        assert!(FieldFilter::new("user.universityCountryCode", Operator::Equal, "CH").matches(&doc));
        assert!(FieldFilter::new("user.universityCountryCode", Operator::In, json!(["DE", "CH"])).matches(&doc));
        assert!(!FieldFilter::new("user.universityCountryCode", Operator::In, json!(["DE"])).matches(&doc));
        assert!(FieldFilter::new("user.searchTokens", Operator::ArrayContains, "ada").matches(&doc));
        assert!(FieldFilter::new("interestIds", Operator::ArrayContainsAny, json!(["go", "ml"])).matches(&doc));
        assert!(!FieldFilter::new("missing", Operator::Equal, json!(null)).matches(&doc));
    }

    #[test]
    fn test_page_query_adds_lookahead_row() {
        let spec = QuerySpec::builder("c").page_size(10).build().unwrap();
        let query = spec.page_query(None);

        assert_eq!(query.limit, 11);
        assert!(query.start_after.is_none());
    }

    #[test]
    fn test_same_filter_set_ignores_page_size_and_sort() {
        let a = QuerySpec::builder("c").where_eq("f", 1).build().unwrap();
        let b = a.with_page_size(25).unwrap();
        let c = a.to_builder().order_by("g", Direction::Desc).build().unwrap();
        let d = a.to_builder().where_eq("h", 2).build().unwrap();

        assert_ne!(a, b);
        assert!(a.same_filter_set(&b));
        assert!(a.same_filter_set(&c));
        assert!(!a.same_filter_set(&d));
    }

    #[test]
    fn test_descending_order_and_cursor() {
        let order = OrderBy::new("n", Direction::Desc);
        let low = Document::from_value("a", json!({ "n": 1 }));
        let high = Document::from_value("b", json!({ "n": 2 }));

        assert!(order.compare(&high, &low).is_lt());

        let cursor = Cursor::from_document(&high, "n");
        assert!(order.is_after(&low, &cursor));
        assert!(!order.is_after(&high, &cursor));
    }

    #[test]
    fn test_operator_serialization() {
        assert_eq!(serde_json::to_string(&Operator::In).unwrap(), "\"in\"");
        assert_eq!(serde_json::to_string(&Operator::Equal).unwrap(), "\"==\"");
        assert_eq!(Operator::ArrayContainsAny.to_string(), "array-contains-any");
    }
}
