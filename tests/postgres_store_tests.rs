// tests/postgres_store_tests.rs
// PostgreSQL document store against a live database (DATABASE_URL)
//
// Each test runs in its own schema seeded with the registrations fixture.
// The in-memory store is the reference: both backends must answer every
// query identically.

mod common;

use serde_json::json;
use std::sync::Arc;

use collection_browser::browser::model::{Direction, Operator, DOCUMENT_ID_FIELD};
use collection_browser::browser::{CollectionBrowser, DocumentStore, TracingNotifier};
use collection_browser::fixtures::collections::registrations::COLLECTION;
use collection_browser::fixtures::collections::RegistrationsCollection;
use collection_browser::fixtures::TestCollection;
use collection_browser::QuerySpec;

use common::postgres::with_test_db;
use common::{counted_spec, ids, registration_ids, registrations_store};

#[tokio::test]
async fn test_pages_match_memory_store() -> anyhow::Result<()> {
    with_test_db("pg_pages_match_memory", |store| async move {
        let browser = CollectionBrowser::initialize(Arc::new(store), Arc::new(TracingNotifier), counted_spec(10)).await;

        assert_eq!(ids(&browser.data()), registration_ids(0, 10));
        assert_eq!(browser.count_query_response().count, Some(25));

        browser.next().await;
        browser.next().await;
        assert_eq!(ids(&browser.data()), registration_ids(20, 25));
        assert!(browser.next_disabled());

        browser.prev().await;
        assert_eq!(ids(&browser.data()), registration_ids(10, 20));

        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_filters_match_memory_store() -> anyhow::Result<()> {
    with_test_db("pg_filters_match_memory", |store| async move {
        let memory = registrations_store();
        let first = RegistrationsCollection::documents()[0]
            .get_str("user.firstName")
            .unwrap()
            .to_lowercase();

        let specs = vec![
            QuerySpec::builder(COLLECTION)
                .where_in("user.universityCountryCode", ["CH", "AT"])
                .order_by("registeredAt", Direction::Desc)
                .page_size(50)
                .build()?,
            QuerySpec::builder(COLLECTION)
                .filter("user.searchTokens", Operator::ArrayContains, first.clone())
                .page_size(50)
                .build()?,
            QuerySpec::builder(COLLECTION)
                .filter("user.searchTokens", Operator::ArrayContainsAny, json!([first, "nobody"]))
                .where_eq("user.levelOfStudy.id", "master")
                .order_by("user.lastName", Direction::Asc)
                .page_size(50)
                .build()?,
        ];

        for spec in specs {
            let expected = memory.fetch_page(&spec.page_query(None)).await?;
            let actual = store.fetch_page(&spec.page_query(None)).await?;
            assert_eq!(ids(&actual), ids(&expected));

            let expected_count = memory.count(&spec.count_query()).await?;
            assert_eq!(store.count(&spec.count_query()).await?, expected_count);
        }

        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_document_id_ordering() -> anyhow::Result<()> {
    with_test_db("pg_document_id_ordering", |store| async move {
        let spec = QuerySpec::builder(COLLECTION)
            .order_by(DOCUMENT_ID_FIELD, Direction::Desc)
            .page_size(3)
            .build()?;

        let page = store.fetch_page(&spec.page_query(None)).await?;
        assert_eq!(ids(&page), vec!["reg-024", "reg-023", "reg-022", "reg-021"]);

        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_missing_sort_field_is_excluded() -> anyhow::Result<()> {
    with_test_db("pg_missing_sort_field", |store| async move {
        let spec = QuerySpec::builder(COLLECTION)
            .order_by("user.userResume", Direction::Asc)
            .page_size(50)
            .build()?;

        let page = store.fetch_page(&spec.page_query(None)).await?;
        // every third registration has a resume
        assert_eq!(page.len(), 9);
        assert_eq!(store.count(&spec.count_query()).await?, 25);

        Ok(())
    })
    .await
}

#[tokio::test]
async fn test_upsert_and_collection_counts() -> anyhow::Result<()> {
    with_test_db("pg_upsert_counts", |store| async move {
        let documents = RegistrationsCollection::documents();
        store.insert_documents(COLLECTION, &documents[..5]).await?;
        store.insert_documents("other", &documents[..2]).await?;

        let counts = store.collection_counts().await?;
        assert_eq!(
            counts,
            vec![(COLLECTION.to_string(), 25), ("other".to_string(), 2)]
        );

        assert_eq!(store.delete_collection("other").await?, 2);
        assert_eq!(store.collection_counts().await?.len(), 1);

        Ok(())
    })
    .await
}
