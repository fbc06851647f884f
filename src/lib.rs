pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod fetcher;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod network;
pub mod orchestration;
pub mod parsing_modules;
pub mod seeder;
pub mod store;

// Re-export main types for library usage
pub use fetcher::{page_url, PageFetcher};
pub use metrics::{CrawlMetrics, MetricsSnapshot};
pub use models::{PageDocument, ProductRecord};
pub use network::{FetchError, FetchResult, HttpClient, PageSource};
pub use orchestration::{
    CrawlConfig, CrawlController, CrawlSummary, Job, JobError, JobOrchestrator, JobOutcome,
    JobReport, VisitOrder,
};
pub use parsing_modules::ListingLayout;
pub use seeder::CategorySeeder;
pub use store::{persist_record, MemoryStore, RecordStore, RedisStore, StoreError};
