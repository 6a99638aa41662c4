// browser/api/queries.rs - PostgreSQL document store
//
// Documents live in one JSONB table keyed by (collection, id):
//
//   CREATE TABLE documents (
//       collection TEXT  NOT NULL,
//       id         TEXT  NOT NULL,
//       data       JSONB NOT NULL,
//       PRIMARY KEY (collection, id)
//   )
//
// Predicates compile to JSONB operators on `data #> '{path,segments}'`:
// - `==`                  -> path = $v::jsonb
// - `in`                  -> (path = $a OR path = $b ...)
// - `array-contains`      -> path @> '[v]'
// - `array-contains-any`  -> (path @> '[a]' OR path @> '[b]' ...)
//
// Pagination is keyset based: ORDER BY (sort value, id) and a row
// comparison against the cursor, so every page is a bounded index-order read
// instead of an OFFSET scan.

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::store::DocumentStore;
use crate::browser::model::{
    CountQuery, Direction, Document, FieldFilter, Operator, PageQuery, DOCUMENT_ID_FIELD,
};
use crate::config::validate_identifier;
use crate::error::{ConfigError, StoreError};

#[derive(Clone, Debug)]
pub struct PgDocumentStore {
    pool: PgPool,
    table: String,
}

impl PgDocumentStore {
    /// Store over `table`; the name is validated because it is interpolated into SQL
    pub fn new(pool: PgPool, table: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            pool,
            table: validate_identifier(table)?,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the documents table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        if let Some((schema, _)) = self.table.split_once('.') {
            sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema))
                .execute(&self.pool)
                .await?;
        }

        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                PRIMARY KEY (collection, id)
            )
            "#,
            self.table
        );
        sqlx::query(&sql).execute(&self.pool).await?;

        tracing::info!("Documents table {} ready", self.table);
        Ok(())
    }

    /// Upsert documents into a collection in one transaction
    pub async fn insert_documents(&self, collection: &str, documents: &[Document]) -> Result<u64, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO {} (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data
            "#,
            self.table
        );

        let mut tx = self.pool.begin().await?;
        let mut written = 0;
        for document in documents {
            let result = sqlx::query(&sql)
                .bind(collection)
                .bind(&document.id)
                .bind(Value::Object(document.fields.clone()))
                .execute(&mut *tx)
                .await?;
            written += result.rows_affected();
        }
        tx.commit().await?;

        tracing::debug!("Upserted {} document(s) into '{}'", written, collection);
        Ok(written)
    }

    /// Delete every document of a collection
    pub async fn delete_collection(&self, collection: &str) -> Result<u64, StoreError> {
        let sql = format!("DELETE FROM {} WHERE collection = $1", self.table);
        let result = sqlx::query(&sql).bind(collection).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Document count per collection
    pub async fn collection_counts(&self) -> Result<Vec<(String, i64)>, StoreError> {
        let sql = format!(
            "SELECT collection, COUNT(*) FROM {} GROUP BY collection ORDER BY collection",
            self.table
        );
        let rows: Vec<(String, i64)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    fn page_sql(&self, query: &PageQuery) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(format!("SELECT id, data FROM {} WHERE collection = ", self.table));
        builder.push_bind(query.collection.clone());

        let order_field = query.order_by.field.as_str();
        if order_field != DOCUMENT_ID_FIELD {
            // documents without the sort field never appear in ordered results
            builder.push(" AND ");
            push_path(&mut builder, order_field);
            builder.push(" IS NOT NULL");
        }

        push_filters(&mut builder, &query.filters);

        let (comparison, direction) = match query.order_by.direction {
            Direction::Asc => (" > ", "ASC"),
            Direction::Desc => (" < ", "DESC"),
        };

        if let Some(cursor) = &query.start_after {
            builder.push(" AND (");
            push_sort_value(&mut builder, order_field);
            builder.push(", id)");
            builder.push(comparison);
            builder.push("(");
            builder.push_bind(cursor.value().clone());
            builder.push("::jsonb, ");
            builder.push_bind(cursor.document_id().to_string());
            builder.push(")");
        }

        builder.push(" ORDER BY ");
        push_sort_value(&mut builder, order_field);
        builder.push(format!(" {}, id {}", direction, direction));
        builder.push(" LIMIT ");
        builder.push_bind(i64::try_from(query.limit).unwrap_or(i64::MAX));
        builder
    }

    fn count_sql(&self, query: &CountQuery) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {} WHERE collection = ", self.table));
        builder.push_bind(query.collection.clone());
        push_filters(&mut builder, &query.filters);
        builder
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<Document>, StoreError> {
        let mut builder = self.page_sql(query);
        let rows: Vec<(String, Value)> = builder.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(id, data)| Document::from_value(id, data))
            .collect())
    }

    async fn count(&self, query: &CountQuery) -> Result<u64, StoreError> {
        let mut builder = self.count_sql(query);
        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }
}

fn path_segments(field: &str) -> Vec<String> {
    field.split('.').map(str::to_string).collect()
}

/// `data #> '{a,b}'`
fn push_path(builder: &mut QueryBuilder<'static, Postgres>, field: &str) {
    builder.push("(data #> ");
    builder.push_bind(path_segments(field));
    builder.push("::text[])");
}

/// Sort expression; the document id is exposed as a JSONB string
fn push_sort_value(builder: &mut QueryBuilder<'static, Postgres>, field: &str) {
    if field == DOCUMENT_ID_FIELD {
        builder.push("to_jsonb(id)");
    } else {
        push_path(builder, field);
    }
}

fn push_filters(builder: &mut QueryBuilder<'static, Postgres>, filters: &[FieldFilter]) {
    for filter in filters {
        builder.push(" AND ");
        push_filter(builder, filter);
    }
}

fn push_filter(builder: &mut QueryBuilder<'static, Postgres>, filter: &FieldFilter) {
    let alternatives: Vec<Value> = match filter.operator {
        Operator::Equal | Operator::ArrayContains => vec![filter.value.clone()],
        Operator::In | Operator::ArrayContainsAny => filter.value.as_array().cloned().unwrap_or_default(),
    };

    if alternatives.is_empty() {
        // the builder never lets this through; keep the SQL valid regardless
        builder.push("FALSE");
        return;
    }

    builder.push("(");
    for (i, value) in alternatives.into_iter().enumerate() {
        if i > 0 {
            builder.push(" OR ");
        }
        push_sort_value(builder, &filter.field);
        match filter.operator {
            Operator::Equal | Operator::In => {
                builder.push(" = ");
                builder.push_bind(value);
            }
            Operator::ArrayContains | Operator::ArrayContainsAny => {
                builder.push(" @> ");
                builder.push_bind(json!([value]));
            }
        }
        builder.push("::jsonb");
    }
    builder.push(")");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::model::{Cursor, QuerySpec};
    use sqlx::postgres::PgPoolOptions;

    // connect_lazy never opens a connection, so SQL generation is testable offline
    fn offline_store() -> PgDocumentStore {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        PgDocumentStore::new(pool, "browser.documents").unwrap()
    }

    #[tokio::test]
    async fn test_rejects_unsafe_table_names() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        assert!(PgDocumentStore::new(pool, "documents; DROP TABLE x").is_err());
    }

    #[tokio::test]
    async fn test_page_sql_shape() {
        let store = offline_store();
        let spec = QuerySpec::builder("regs")
            .where_in("user.universityCountryCode", ["CH", "DE"])
            .filter("user.searchTokens", Operator::ArrayContains, "ada")
            .order_by("registeredAt", Direction::Desc)
            .page_size(10)
            .build()
            .unwrap();
        let cursor = Cursor::new(json!("2024-03-01"), "reg-003");

        let builder = store.page_sql(&spec.page_query(Some(&cursor)));
        let sql = builder.sql();

        assert!(sql.starts_with("SELECT id, data FROM browser.documents WHERE collection = $1"));
        assert!(sql.contains("(data #> $2::text[]) IS NOT NULL"));
        assert!(sql.contains(" OR "));
        assert!(sql.contains(" @> "));
        assert!(sql.contains(", id) < ("));
        assert!(sql.contains("DESC, id DESC LIMIT"));
    }

    #[tokio::test]
    async fn test_count_sql_has_no_order_or_limit() {
        let store = offline_store();
        let spec = QuerySpec::builder("regs").where_eq("livestreamId", "ls").build().unwrap();

        let builder = store.count_sql(&spec.count_query());
        let sql = builder.sql();

        assert!(sql.starts_with("SELECT COUNT(*) FROM browser.documents"));
        assert!(!sql.contains("ORDER BY"));
        assert!(!sql.contains("LIMIT"));
    }

    #[tokio::test]
    async fn test_document_id_ordering_uses_to_jsonb() {
        let store = offline_store();
        let spec = QuerySpec::builder("regs").build().unwrap();

        let builder = store.page_sql(&spec.page_query(None));
        let sql = builder.sql();

        assert!(sql.contains("ORDER BY to_jsonb(id) ASC, id ASC"));
        assert!(!sql.contains("IS NOT NULL"));
    }
}
