// browser/table.rs - Registrant table facade
//
// Wires one CollectionBrowser to the things an admin table needs around
// it: filter selections, rows-per-page, a document -> row converter and the
// bulk actions (export, copy emails, download CVs) that read the full query.
//
// The table rebuilds its QuerySpec from a base spec (collection, fixed
// predicates, sort, counting) plus the current filter selections, and only
// hands it to the browser when it differs from the current one.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use super::api::DocumentStore;
use super::export::{collect_all, join_emails, ExportTable};
use super::filters::{FilterFields, FilterState};
use super::model::{BrowserStatus, Document, PageResult, QuerySpec, UserDataEntry};
use super::notify::{Notifier, TracingNotifier};
use super::paginator::CollectionBrowser;
use crate::config::BrowserConfig;
use crate::error::{SpecError, StoreError};

/// Turns a document into a table row; `None` skips the document
pub type Converter = Arc<dyn Fn(&Document) -> Option<UserDataEntry> + Send + Sync>;

/// Presentation and bulk-read settings of a table
#[derive(Clone)]
pub struct TableOptions {
    pub title: String,
    /// Plural noun used in messages, e.g. "registrants"
    pub user_type: String,
    pub fields: FilterFields,
    pub page_size_options: Vec<usize>,
    pub export_batch_size: usize,
    pub converter: Converter,
}

impl TableOptions {
    pub fn new(title: impl Into<String>, user_type: impl Into<String>) -> Self {
        Self::from_config(&BrowserConfig::default(), title, user_type)
    }

    pub fn from_config(config: &BrowserConfig, title: impl Into<String>, user_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            user_type: user_type.into(),
            fields: FilterFields::registrations(),
            page_size_options: config.page_size_options.clone(),
            export_batch_size: config.export_batch_size,
            converter: Arc::new(UserDataEntry::from_registration),
        }
    }

    pub fn with_fields(mut self, fields: FilterFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_converter<F>(mut self, converter: F) -> Self
    where
        F: Fn(&Document) -> Option<UserDataEntry> + Send + Sync + 'static,
    {
        self.converter = Arc::new(converter);
        self
    }
}

impl std::fmt::Debug for TableOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableOptions")
            .field("title", &self.title)
            .field("user_type", &self.user_type)
            .field("fields", &self.fields)
            .field("page_size_options", &self.page_size_options)
            .field("export_batch_size", &self.export_batch_size)
            .finish_non_exhaustive()
    }
}

pub struct UserDataTable<S, N = TracingNotifier> {
    browser: CollectionBrowser<S, N>,
    base: QuerySpec,
    filters: Mutex<FilterState>,
    options: TableOptions,
}

impl<S, N> UserDataTable<S, N>
where
    S: DocumentStore,
    N: Notifier,
{
    /// Bind a table to `base` and load its first page with no filters selected
    pub async fn initialize(store: Arc<S>, notifier: Arc<N>, base: QuerySpec, options: TableOptions) -> Self {
        if !options.page_size_options.contains(&base.page_size()) {
            tracing::warn!(
                "Table '{}' starts with page size {} outside its options {:?}",
                options.title,
                base.page_size(),
                options.page_size_options
            );
        }

        let browser = CollectionBrowser::initialize(store, notifier, base.clone()).await;
        Self {
            browser,
            base,
            filters: Mutex::new(FilterState::default()),
            options,
        }
    }

    pub fn browser(&self) -> &CollectionBrowser<S, N> {
        &self.browser
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn snapshot(&self) -> PageResult {
        self.browser.snapshot()
    }

    pub fn filters(&self) -> FilterState {
        self.filters.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn filters_active(&self) -> bool {
        self.filters().is_active()
    }

    pub fn filters_inactive(&self) -> bool {
        !self.filters_active()
    }

    /// Apply new selections. Returns whether the browser re-queried.
    pub async fn set_filters(&self, filters: FilterState) -> Result<bool, SpecError> {
        let spec = self.compose(&filters, self.rows_per_page())?;
        *self.filters.lock().unwrap_or_else(PoisonError::into_inner) = filters;
        Ok(self.apply(spec).await)
    }

    pub async fn reset_filters(&self) -> Result<bool, SpecError> {
        self.set_filters(FilterState::default()).await
    }

    pub fn rows_per_page(&self) -> usize {
        self.browser.query_spec().page_size()
    }

    /// Change rows per page; sizes outside the configured options are refused
    pub async fn set_rows_per_page(&self, rows: usize) -> bool {
        if !self.options.page_size_options.contains(&rows) {
            tracing::warn!(
                "Rows per page {} is not one of {:?}",
                rows,
                self.options.page_size_options
            );
            return false;
        }
        match self.compose(&self.filters(), rows) {
            Ok(spec) => self.apply(spec).await,
            Err(e) => {
                tracing::warn!("Cannot change rows per page: {}", e);
                false
            }
        }
    }

    /// Page change from a 0-based table widget: forward calls `next`,
    /// backward calls `prev`
    pub async fn handle_page_change(&self, new_page: usize) {
        let current = self.browser.page() - 1;
        if new_page > current {
            self.browser.next().await;
        } else if new_page < current {
            self.browser.prev().await;
        }
    }

    /// Rows of the visible page
    pub fn rows(&self) -> Vec<UserDataEntry> {
        self.browser
            .data()
            .iter()
            .filter_map(|document| (self.options.converter)(document))
            .collect()
    }

    /// No filters, first page loaded, nothing there: the collection is empty
    pub fn no_results_without_filters(&self) -> bool {
        let snapshot = self.browser.snapshot();
        self.filters_inactive()
            && matches!(snapshot.status, BrowserStatus::Loaded { page: 0, .. })
            && snapshot.data.is_empty()
    }

    /// "N registrants found", shown only while filters are active
    pub fn found_label(&self) -> Option<String> {
        if self.filters_inactive() {
            return None;
        }
        let count = self.browser.count_query_response().count.unwrap_or(0);
        Some(format!("{} {} found", count, self.options.user_type))
    }

    /// Bulk actions are pointless when the count is known to be zero
    pub fn bulk_actions_disabled(&self) -> bool {
        self.browser.count_query_response().count == Some(0)
    }

    /// Every matching row, for a CSV download
    pub async fn export_users(&self) -> Result<ExportTable, StoreError> {
        let entries = self.collect_entries("export").await?;
        let table = ExportTable::from_entries(self.options.title.replace('_', " "), &entries);
        self.browser.notifier().success_notification(&format!(
            "Exported {} {}",
            table.len(),
            self.options.user_type
        ));
        Ok(table)
    }

    /// Every matching email, joined for the clipboard
    pub async fn copy_all_emails(&self) -> Result<String, StoreError> {
        let entries = self.collect_entries("copy emails").await?;
        let emails = join_emails(&entries);
        self.browser
            .notifier()
            .success_notification(&format!("Copied the emails of {} {}", entries.len(), self.options.user_type));
        Ok(emails)
    }

    /// Distinct resume links of every matching row, paired with the registrant name
    pub async fn resume_urls(&self) -> Result<Vec<(String, String)>, StoreError> {
        let entries = self.collect_entries("download CVs").await?;
        let mut seen = HashSet::new();
        let resumes: Vec<(String, String)> = entries
            .iter()
            .filter(|entry| !entry.resume_url.trim().is_empty())
            .filter(|entry| seen.insert(entry.resume_url.clone()))
            .map(|entry| (entry.full_name(), entry.resume_url.clone()))
            .collect();
        self.browser.notifier().success_notification(&format!(
            "Prepared {} CVs of {}",
            resumes.len(),
            self.options.user_type
        ));
        Ok(resumes)
    }

    async fn collect_entries(&self, action: &str) -> Result<Vec<UserDataEntry>, StoreError> {
        let spec = self.browser.query_spec();
        match collect_all(&**self.browser.store(), &spec, self.options.export_batch_size).await {
            Ok(documents) => Ok(documents
                .iter()
                .filter_map(|document| (self.options.converter)(document))
                .collect()),
            Err(e) => {
                tracing::error!("{} on '{}' failed: {}", action, spec.collection(), e);
                self.browser
                    .notifier()
                    .error_notification(&format!("Could not {} for {}: {}", action, self.options.user_type, e));
                Err(e)
            }
        }
    }

    fn compose(&self, filters: &FilterState, rows: usize) -> Result<QuerySpec, SpecError> {
        self.base
            .to_builder()
            .filters(filters.to_filters(&self.options.fields))
            .page_size(rows)
            .build()
    }

    async fn apply(&self, spec: QuerySpec) -> bool {
        if spec == self.browser.query_spec() {
            tracing::debug!("Query for '{}' unchanged, not re-fetching", self.options.title);
            return false;
        }
        self.browser.set_query_spec(spec).await;
        true
    }
}
