use catalog_crawler::cli::{Cli, Commands};
use catalog_crawler::config::Config;
use catalog_crawler::diagnostics::spawn_diagnostics;
use catalog_crawler::logging::{init_logging, LoggingError};
use catalog_crawler::orchestration::builder::build_http_client;
use catalog_crawler::orchestration::{
    build_crawl_config, build_crawler, open_store, setup_shutdown_handler, BuildError, CrawlConfig,
    JobError,
};
use catalog_crawler::seeder::SeedError;
use catalog_crawler::{CategorySeeder, CrawlMetrics, FetchError, ListingLayout, StoreError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MainError {
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("Setup error: {0}")]
    Build(#[from] BuildError),

    #[error("Crawl aborted: {0}")]
    Crawl(#[from] JobError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("HTTP error: {0}")]
    Http(#[from] FetchError),

    #[error("Discovery error: {0}")]
    Seed(#[from] SeedError),
}

async fn run_crawl_command(
    config: CrawlConfig,
    diagnostics_addr: Option<String>,
) -> Result<(), MainError> {
    tracing::info!(
        dry_run = config.dry_run,
        delay_secs = config.delay.as_secs(),
        order = ?config.order,
        max_concurrent_pages = config.max_concurrent_pages,
        "starting crawl"
    );

    let metrics = Arc::new(CrawlMetrics::new());
    if let Some(addr) = diagnostics_addr {
        spawn_diagnostics(addr, Arc::clone(&metrics));
    }

    let shutdown = setup_shutdown_handler();
    let layout = ListingLayout::default();
    let controller = build_crawler(&config, &layout, metrics, shutdown).await?;

    let summary = controller.run().await?;
    println!("{}", summary);
    Ok(())
}

async fn run_discover_command(config: CrawlConfig, index_url: String) -> Result<(), MainError> {
    let store = open_store(&config).await?;
    let http = build_http_client(&config)?;
    let seeder = CategorySeeder::new(
        http,
        index_url,
        Config::CATEGORY_LINK_SELECTOR,
        Config::SITE_ROOT,
    );

    let added = seeder.seed(store.as_ref(), &config.seed_key).await?;
    println!("Added {} listing URLs to {}", added, config.seed_key);
    Ok(())
}

async fn run_category_command(
    config: CrawlConfig,
    name: String,
    ids_only: bool,
) -> Result<(), MainError> {
    let store = open_store(&config).await?;
    let ids = store.category_members(&name).await?;

    for id in &ids {
        if ids_only {
            println!("{}", id);
            continue;
        }
        for record in store.records(id).await? {
            println!(
                "{}\t{}\t{}\t{}",
                record.id, record.part_number, record.manufacturer, record.price
            );
        }
    }
    println!("{} ids in category '{}'", ids.len(), name);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), MainError> {
    let cli = Cli::parse_args();
    let _log_guard = init_logging(&cli.log_dir)?;

    let base = CrawlConfig {
        redis_url: cli.redis_url,
        seed_key: cli.seed_key,
        ..Default::default()
    };

    match cli.command {
        Commands::Crawl {
            delay,
            seed,
            order,
            user_agent,
            timeout,
            max_concurrent_pages,
            diagnostics_addr,
            no_diagnostics,
            dry_run,
            seed_urls,
        } => {
            let config = build_crawl_config(
                base.redis_url,
                base.seed_key,
                user_agent,
                timeout,
                delay,
                seed,
                order,
                max_concurrent_pages,
                dry_run,
                seed_urls,
            );
            let diagnostics_addr = (!no_diagnostics).then_some(diagnostics_addr);
            run_crawl_command(config, diagnostics_addr).await?;
        }

        Commands::Discover {
            index_url,
            user_agent,
            timeout,
        } => {
            let config = CrawlConfig {
                user_agent,
                timeout_secs: timeout,
                ..base
            };
            run_discover_command(config, index_url).await?;
        }

        Commands::Category { name, ids_only } => {
            run_category_command(base, name, ids_only).await?;
        }
    }

    Ok(())
}
