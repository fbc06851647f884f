//! Wires the store, HTTP client and job orchestration into a crawl controller.

use std::sync::Arc;
use tokio::sync::watch;

use super::config::CrawlConfig;
use super::controller::CrawlController;
use super::job::{Job, JobOrchestrator};
use crate::metrics::CrawlMetrics;
use crate::network::{FetchError, HttpClient, PageSource};
use crate::parsing_modules::state_extractor::ExtractError;
use crate::parsing_modules::ListingLayout;
use crate::store::{MemoryStore, RecordStore, RedisStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("store setup failed: {0}")]
    Store(#[from] StoreError),

    #[error("HTTP client setup failed: {0}")]
    Http(#[from] FetchError),

    #[error("layout setup failed: {0}")]
    Layout(#[from] ExtractError),
}

/// Redis at the configured URL, or an empty in-memory store for dry runs.
pub async fn open_store(config: &CrawlConfig) -> Result<Arc<dyn RecordStore>, StoreError> {
    if config.dry_run {
        tracing::info!("dry run, records are kept in memory");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = RedisStore::connect(&config.redis_url).await?;
    tracing::info!(redis_url = %config.redis_url, "connected to store");
    Ok(Arc::new(store))
}

pub fn build_http_client(config: &CrawlConfig) -> Result<Arc<HttpClient>, FetchError> {
    Ok(Arc::new(HttpClient::new(
        config.user_agent.clone(),
        config.timeout_secs,
    )?))
}

/// Add `extra` URLs to the seed set, then read the whole set back as jobs.
///
/// Jobs are sorted by URL so a given seed always yields the same visit order.
pub async fn load_jobs(
    store: &dyn RecordStore,
    seed_key: &str,
    extra: &[String],
) -> Result<Vec<Job>, StoreError> {
    for url in extra {
        store.add_seed_url(seed_key, url).await?;
    }

    let mut urls = store.seed_urls(seed_key).await?;
    urls.sort();
    tracing::info!(seed_key, jobs = urls.len(), "loaded seed URLs");
    Ok(urls.into_iter().map(Job::new).collect())
}

/// Build a ready-to-run controller over an existing store and page source.
pub async fn build_controller(
    config: &CrawlConfig,
    layout: &ListingLayout,
    store: Arc<dyn RecordStore>,
    source: Arc<dyn PageSource>,
    metrics: Arc<CrawlMetrics>,
    shutdown: watch::Receiver<bool>,
) -> Result<CrawlController, BuildError> {
    let jobs = load_jobs(store.as_ref(), &config.seed_key, &config.seed_urls).await?;
    let orchestrator = JobOrchestrator::new(
        layout,
        source,
        store,
        Arc::clone(&metrics),
        config.max_concurrent_pages,
    )?;

    Ok(CrawlController::new(jobs, orchestrator, metrics, shutdown)
        .with_delay(config.delay)
        .with_order(config.order)
        .with_seed(config.seed))
}

/// Builds the complete crawler for `config` with the production HTTP client.
#[tracing::instrument(skip_all, fields(dry_run = config.dry_run))]
pub async fn build_crawler(
    config: &CrawlConfig,
    layout: &ListingLayout,
    metrics: Arc<CrawlMetrics>,
    shutdown: watch::Receiver<bool>,
) -> Result<CrawlController, BuildError> {
    let store = open_store(config).await?;
    let http = build_http_client(config)?;
    build_controller(config, layout, store, http, metrics, shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_jobs_merges_extra_urls_sorted() {
        let store = MemoryStore::new();
        store.add_seed_url("itemURL", "https://shop.test/b").await.unwrap();

        let extra = vec![
            "https://shop.test/a".to_string(),
            "https://shop.test/b".to_string(),
        ];
        let jobs = load_jobs(&store, "itemURL", &extra).await.unwrap();

        assert_eq!(
            jobs,
            vec![Job::new("https://shop.test/a"), Job::new("https://shop.test/b")]
        );
    }

    #[tokio::test]
    async fn test_dry_run_crawler_has_seed_jobs() {
        let config = CrawlConfig {
            dry_run: true,
            seed_urls: vec!["https://shop.test/a".to_string()],
            ..Default::default()
        };
        let (_tx, rx) = watch::channel(false);

        let controller = build_crawler(
            &config,
            &ListingLayout::default(),
            Arc::new(CrawlMetrics::new()),
            rx,
        )
        .await
        .unwrap();
        assert_eq!(controller.total_jobs(), 1);
    }
}
