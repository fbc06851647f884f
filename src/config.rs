// Global configuration constants - single source of truth

pub struct Config;

impl Config {
    // Target site
    pub const SITE_ROOT: &'static str = "https://www.arrow.com";
    pub const CATEGORY_INDEX_URL: &'static str = "https://www.arrow.com/en/products";
    pub const CATEGORY_LINK_SELECTOR: &'static str = ".CategoryListings-subItems-item a[href]";

    // Embedded state
    pub const STATE_ELEMENT_ID: &'static str = "arrow-state";
    pub const QUOTE_PLACEHOLDER: &'static str = "&q;";

    // Store
    pub const REDIS_URL: &'static str = "redis://127.0.0.1:6666";
    pub const SEED_KEY: &'static str = "itemURL";

    // Crawl pacing
    pub const JOB_DELAY_SECS: u64 = 5;
    pub const RANDOM_SEED: u64 = 86;
    pub const MAX_CONCURRENT_PAGES: usize = 100;

    // HTTP/Network config
    pub const USER_AGENT: &'static str = "CatalogCrawler/1.0";
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    pub const MAX_CONTENT_SIZE: usize = 20 * 1024 * 1024; // listing pages inline their whole state
    pub const POOL_IDLE_PER_HOST: usize = 16;
    pub const POOL_IDLE_TIMEOUT_SECS: u64 = 30;

    // Process side channels
    pub const DIAGNOSTICS_ADDR: &'static str = "0.0.0.0:8888";
    pub const LOG_DIR: &'static str = "./logs";
}
