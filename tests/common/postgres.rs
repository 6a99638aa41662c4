// common/postgres.rs - PostgreSQL setup and teardown for store tests
//
// Every test gets its own schema holding a documents table, seeded from the
// registrations fixture, and the schema is dropped afterwards so tests can
// run repeatedly and concurrently.

use sqlx::PgPool;

use collection_browser::browser::api::{db, PgDocumentStore};
use collection_browser::fixtures::collections::RegistrationsCollection;
use collection_browser::fixtures::TestCollection;
use collection_browser::BrowserConfig;

/// Create a database connection pool for testing
pub async fn create_test_pool() -> anyhow::Result<PgPool> {
    let config = BrowserConfig::from_env()?;
    if config.database_url.is_none() {
        anyhow::bail!("DATABASE_URL must be set in environment");
    }
    Ok(db::create_pool(&config).await?)
}

/// Drop a test schema and everything in it
pub async fn teardown_test_db(pool: &PgPool, schema: &str) -> anyhow::Result<()> {
    let query = format!("DROP SCHEMA IF EXISTS {} CASCADE", schema);
    sqlx::query(&query).execute(pool).await?;
    Ok(())
}

/// Fresh `{schema}.documents` table holding the registrations fixture
pub async fn setup_test_db(pool: &PgPool, schema: &str) -> anyhow::Result<PgDocumentStore> {
    teardown_test_db(pool, schema).await?;

    let store = PgDocumentStore::new(pool.clone(), &format!("{}.documents", schema))?;
    store.ensure_schema().await?;
    store
        .insert_documents(RegistrationsCollection::name(), &RegistrationsCollection::documents())
        .await?;

    Ok(store)
}

/// Generate a unique schema name for a test
pub fn generate_test_schema_name(test_name: &str) -> String {
    let sanitized = test_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect::<String>();

    // PostgreSQL identifiers are limited to 63 bytes
    let truncated = if sanitized.len() > 40 { &sanitized[..40] } else { &sanitized };

    format!("test_{}", truncated.to_lowercase())
}

/// Full setup and teardown wrapper for tests with an isolated schema
pub async fn with_test_db<F, Fut>(test_name: &str, test_fn: F) -> anyhow::Result<()>
where
    F: FnOnce(PgDocumentStore) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<()>>,
{
    let pool = create_test_pool().await?;
    let schema = generate_test_schema_name(test_name);

    let store = setup_test_db(&pool, &schema).await?;
    let result = test_fn(store).await;

    // Always cleanup, even if the test failed
    teardown_test_db(&pool, &schema).await?;

    result
}
