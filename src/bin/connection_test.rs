use anyhow::Result;
use collection_browser::browser::api::{db, PgDocumentStore};
use collection_browser::browser::DocumentStore;
use collection_browser::fixtures::collections::registrations::COLLECTION;
use collection_browser::{BrowserConfig, QuerySpec};

fn main() -> Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> Result<()> {
    println!("Testing PostgreSQL connection...");

    let config = BrowserConfig::from_env()?;
    let pool = db::create_pool(&config).await?;
    println!("✓ Connected successfully!");

    let store = PgDocumentStore::new(pool, &config.documents_table)?;
    store.ensure_schema().await?;

    println!("\nDocuments per collection in {}:", store.table());
    let counts = store.collection_counts().await?;
    if counts.is_empty() {
        println!("  No documents stored yet");
    } else {
        for (collection, count) in counts {
            println!("  - {}: {}", collection, count);
        }
    }

    // One page and one count through the same path the browser uses
    println!("\nTesting first page of {}:", COLLECTION);
    let spec = QuerySpec::builder(COLLECTION)
        .page_size(config.default_page_size)
        .total_count(true)
        .build()?;

    match store.fetch_page(&spec.page_query(None)).await {
        Ok(documents) => {
            println!("✓ Page query executed successfully. Found {} rows.", documents.len());
            for document in documents.iter().take(5) {
                println!(
                    "  - ID: {}, Email: {}",
                    document.id,
                    document.get_str("user.userEmail").unwrap_or("-")
                );
            }
        }
        Err(e) => println!("✗ Page query failed: {}", e),
    }

    match store.count(&spec.count_query()).await {
        Ok(count) => println!("✓ Count query executed successfully. Count: {}", count),
        Err(e) => println!("✗ Count query failed: {}", e),
    }

    Ok(())
}
