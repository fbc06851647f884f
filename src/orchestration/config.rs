//! Runtime crawl configuration.

use std::time::Duration;

use super::controller::VisitOrder;
use crate::config::Config;

/// Everything a crawl run needs beyond the site layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    pub redis_url: String,
    pub seed_key: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub delay: Duration,
    pub seed: u64,
    pub order: VisitOrder,
    pub max_concurrent_pages: usize,
    /// Use an in-memory store seeded from `seed_urls` instead of Redis.
    pub dry_run: bool,
    pub seed_urls: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            redis_url: Config::REDIS_URL.to_string(),
            seed_key: Config::SEED_KEY.to_string(),
            user_agent: Config::USER_AGENT.to_string(),
            timeout_secs: Config::REQUEST_TIMEOUT_SECS,
            delay: Duration::from_secs(Config::JOB_DELAY_SECS),
            seed: Config::RANDOM_SEED,
            order: VisitOrder::default(),
            max_concurrent_pages: Config::MAX_CONCURRENT_PAGES,
            dry_run: false,
            seed_urls: Vec::new(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn build_crawl_config(
    redis_url: String,
    seed_key: String,
    user_agent: String,
    timeout_secs: u64,
    delay_secs: u64,
    seed: u64,
    order: VisitOrder,
    max_concurrent_pages: usize,
    dry_run: bool,
    seed_urls: Vec<String>,
) -> CrawlConfig {
    if max_concurrent_pages == 0 {
        tracing::warn!("max concurrent pages is 0, using 1");
    }
    CrawlConfig {
        redis_url,
        seed_key,
        user_agent,
        timeout_secs,
        delay: Duration::from_secs(delay_secs),
        seed,
        order,
        max_concurrent_pages: max_concurrent_pages.max(1),
        dry_run,
        seed_urls,
    }
}
