// Interactive registrant browser
//
// This binary opens the registrations collection in a UserDataTable and
// drives it from stdin, one command per line:
// - next / prev           move one page
// - page N                jump like a table widget (1-indexed, one step at a time)
// - country CH,DE         filter by university country codes
// - search TEXT           filter by search token
// - reset                 clear every filter
// - size N                rows per page (must be one of the configured options)
// - export / emails / cvs bulk actions over the full query
// - quit
//
// With DATABASE_URL set the PostgreSQL store is used (and seeded from the
// registrations fixture when empty), otherwise the in-memory fixture.

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use collection_browser::browser::api::{db, PgDocumentStore};
use collection_browser::browser::model::Direction;
use collection_browser::browser::{DocumentStore, FilterState, TableOptions, TracingNotifier};
use collection_browser::fixtures::collections::registrations::COLLECTION;
use collection_browser::fixtures::collections::RegistrationsCollection;
use collection_browser::fixtures::TestCollection;
use collection_browser::{BrowserConfig, QuerySpec, UserDataTable};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = BrowserConfig::from_env()?;

    let base = QuerySpec::builder(COLLECTION)
        .order_by("registeredAt", Direction::Desc)
        .page_size(config.default_page_size)
        .total_count(true)
        .build()?;
    let options = TableOptions::from_config(&config, "Career_Day_Registrants", "registrants");

    if config.database_url.is_some() {
        let pool = db::create_pool(&config).await?;
        let store = PgDocumentStore::new(pool, &config.documents_table)?;
        store.ensure_schema().await?;
        seed_if_empty(&store).await?;
        tracing::info!("Browsing '{}' from PostgreSQL table {}", COLLECTION, store.table());

        let table = UserDataTable::initialize(Arc::new(store), Arc::new(TracingNotifier), base, options).await;
        run_session(&table).await
    } else {
        tracing::info!("DATABASE_URL not set, browsing the in-memory registrations fixture");
        let store = RegistrationsCollection::memory_store();

        let table = UserDataTable::initialize(Arc::new(store), Arc::new(TracingNotifier), base, options).await;
        run_session(&table).await
    }
}

async fn seed_if_empty(store: &PgDocumentStore) -> Result<()> {
    let spec = QuerySpec::builder(COLLECTION).build()?;
    let existing = store.count(&spec.count_query()).await?;
    if existing > 0 {
        tracing::info!("Collection already contains {} registrations, skipping seed.", existing);
        return Ok(());
    }

    tracing::info!("Seeding '{}' from the registrations fixture...", COLLECTION);
    let written = store
        .insert_documents(RegistrationsCollection::name(), &RegistrationsCollection::documents())
        .await?;
    tracing::info!("Seeded {} registrations.", written);
    Ok(())
}

async fn run_session<S: DocumentStore>(table: &UserDataTable<S>) -> Result<()> {
    render(table);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, argument) = line.split_once(' ').unwrap_or((line, ""));
        let argument = argument.trim();

        match command {
            "" => continue,
            "quit" | "exit" => break,
            "next" => table.browser().next().await,
            "prev" => table.browser().prev().await,
            "page" => match argument.parse::<usize>() {
                Ok(page) if page > 0 => table.handle_page_change(page - 1).await,
                _ => println!("usage: page N (N >= 1)"),
            },
            "country" => {
                let codes = argument.split(',').map(str::trim).filter(|c| !c.is_empty());
                let filters = table.filters().with_country_codes(codes);
                if let Err(e) = table.set_filters(filters).await {
                    println!("invalid filter: {}", e);
                }
            }
            "search" => {
                let filters = table.filters().with_search(argument);
                if let Err(e) = table.set_filters(filters).await {
                    println!("invalid filter: {}", e);
                }
            }
            "reset" => {
                table.set_filters(FilterState::default()).await?;
            }
            "size" => match argument.parse::<usize>() {
                Ok(rows) => {
                    if !table.set_rows_per_page(rows).await {
                        println!("rows per page must be one of {:?}", table.options().page_size_options);
                    }
                }
                Err(_) => println!("usage: size N"),
            },
            "export" => {
                if table.bulk_actions_disabled() {
                    println!("nothing to export");
                    continue;
                }
                match table.export_users().await {
                    Ok(export) => print!("{}", export.to_csv()),
                    Err(e) => println!("export failed: {}", e),
                }
                continue;
            }
            "emails" => {
                if table.bulk_actions_disabled() {
                    println!("no emails to copy");
                    continue;
                }
                match table.copy_all_emails().await {
                    Ok(emails) => println!("{}", emails),
                    Err(e) => println!("copy failed: {}", e),
                }
                continue;
            }
            "cvs" => {
                if table.bulk_actions_disabled() {
                    println!("no CVs to download");
                    continue;
                }
                match table.resume_urls().await {
                    Ok(resumes) => {
                        for (name, url) in &resumes {
                            println!("{}\t{}", name, url);
                        }
                    }
                    Err(e) => println!("CV download failed: {}", e),
                }
                continue;
            }
            other => {
                println!("unknown command '{}'", other);
                continue;
            }
        }

        render(table);
    }

    table.browser().dispose();
    Ok(())
}

fn render<S: DocumentStore>(table: &UserDataTable<S>) {
    let snapshot = table.snapshot();

    println!();
    println!("{} - {}", table.options().title.replace('_', " "), snapshot.status);
    if let Some(label) = table.found_label() {
        println!("{}", label);
    }
    if table.no_results_without_filters() {
        println!("No {} yet", table.options().user_type);
    }

    for entry in table.rows() {
        println!(
            "  {:<24} {:<36} {:<36} {}",
            entry.full_name(),
            entry.email,
            entry.university_name,
            entry.university_country_code
        );
    }

    let total = snapshot
        .count_query_response
        .count
        .map_or_else(|| "?".to_string(), |count| count.to_string());
    println!(
        "page {} | {} rows per page | {} total | next {}",
        snapshot.page,
        table.rows_per_page(),
        total,
        if snapshot.next_disabled { "disabled" } else { "available" }
    );
}
