// browser/export.rs - Reads over the full query
//
// Export, "copy all emails" and similar bulk actions need every matching
// document, not just the visible page. They reuse the table's predicates
// and sort, drop the page limit, and read in cursor-paginated batches.

use serde::{Deserialize, Serialize};

use super::api::DocumentStore;
use super::model::{Cursor, Document, QuerySpec, UserDataEntry};
use crate::error::StoreError;

/// Read every document matching `spec`, `batch_size` documents per request
pub async fn collect_all<S>(store: &S, spec: &QuerySpec, batch_size: usize) -> Result<Vec<Document>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let batch_size = batch_size.max(1);
    let order_field = spec.order_by().field.clone();
    let mut documents = Vec::new();
    let mut cursor: Option<Cursor> = None;

    loop {
        let query = spec.query_with_limit(batch_size, cursor.as_ref());
        let batch = store.fetch_page(&query).await?;
        let fetched = batch.len();
        cursor = batch.last().map(|last| Cursor::from_document(last, &order_field));
        documents.extend(batch);

        if fetched < batch_size {
            break;
        }
    }

    tracing::debug!(
        "Read {} document(s) from '{}' in batches of {}",
        documents.len(),
        spec.collection(),
        batch_size
    );
    Ok(documents)
}

/// Tabular export of the full query
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn from_entries(title: impl Into<String>, entries: &[UserDataEntry]) -> Self {
        Self {
            title: title.into(),
            headers: UserDataEntry::HEADERS.iter().map(|h| h.to_string()).collect(),
            rows: entries.iter().map(UserDataEntry::to_record).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header line plus one line per row; cells holding a comma, quote or
    /// line break are quoted with inner quotes doubled
    pub fn to_csv(&self) -> String {
        std::iter::once(&self.headers)
            .chain(&self.rows)
            .map(|cells| cells.iter().map(|cell| csv_cell(cell)).collect::<Vec<_>>().join(","))
            .map(|line| line + "\n")
            .collect()
    }
}

fn csv_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Distinct, non-empty emails in first-seen order, joined for the clipboard
pub fn join_emails(entries: &[UserDataEntry]) -> String {
    let mut seen = std::collections::HashSet::new();
    entries
        .iter()
        .map(|entry| entry.email.trim())
        .filter(|email| !email.is_empty())
        .filter(|email| seen.insert(email.to_lowercase()))
        .collect::<Vec<_>>()
        .join(", ")
}
