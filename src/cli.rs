use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::orchestration::VisitOrder;

/// Command line interface.
/// Exit codes: 0=success, 1=crawl or setup error, 2=invalid arguments
#[derive(Parser, Debug)]
#[command(name = "catalog_crawler")]
#[command(about = "Crawls catalog listing pages and indexes their products by category")]
#[command(version)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = Config::LOG_DIR,
        help = "Directory for rolling log files"
    )]
    pub log_dir: String,

    #[arg(
        long,
        global = true,
        default_value = Config::REDIS_URL,
        help = "Redis connection URL for seeds and records"
    )]
    pub redis_url: String,

    #[arg(
        long,
        global = true,
        default_value = Config::SEED_KEY,
        help = "Redis set holding listing URLs"
    )]
    pub seed_key: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl every listing URL in the seed set.
    Crawl {
        #[arg(
            short,
            long,
            default_value_t = Config::JOB_DELAY_SECS,
            help = "Seconds to wait between listings"
        )]
        delay: u64,

        #[arg(long, default_value_t = Config::RANDOM_SEED, help = "Seed for the visit order")]
        seed: u64,

        #[arg(
            long,
            value_enum,
            default_value_t = VisitOrder::Shuffled,
            help = "How listings are ordered"
        )]
        order: VisitOrder,

        #[arg(
            short,
            long,
            default_value = Config::USER_AGENT,
            help = "User agent string for requests"
        )]
        user_agent: String,

        #[arg(
            short,
            long,
            default_value_t = Config::REQUEST_TIMEOUT_SECS,
            help = "Request timeout in seconds"
        )]
        timeout: u64,

        #[arg(
            short = 'p',
            long,
            default_value_t = Config::MAX_CONCURRENT_PAGES,
            help = "Concurrent page fetches within one listing"
        )]
        max_concurrent_pages: usize,

        #[arg(
            long,
            default_value = Config::DIAGNOSTICS_ADDR,
            help = "Address for the /debug/stats endpoint"
        )]
        diagnostics_addr: String,

        #[arg(long, help = "Do not start the diagnostics endpoint")]
        no_diagnostics: bool,

        #[arg(long, help = "Keep records in memory instead of Redis")]
        dry_run: bool,

        #[arg(long = "seed-url", help = "Listing URL to add to the seed set (repeatable)")]
        seed_urls: Vec<String>,
    },

    /// Read listing URLs off the category index page into the seed set.
    Discover {
        #[arg(long, default_value = Config::CATEGORY_INDEX_URL, help = "Category index page")]
        index_url: String,

        #[arg(
            short,
            long,
            default_value = Config::USER_AGENT,
            help = "User agent string for requests"
        )]
        user_agent: String,

        #[arg(
            short,
            long,
            default_value_t = Config::REQUEST_TIMEOUT_SECS,
            help = "Request timeout in seconds"
        )]
        timeout: u64,
    },

    /// List stored records for a category.
    Category {
        /// Category name as stored (case-sensitive)
        name: String,

        #[arg(long, help = "Print ids only")]
        ids_only: bool,
    },
}

impl Cli {
    /// Parse CLI arguments. On error, clap prints help and exits with code 2.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
