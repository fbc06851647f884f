//! High-level orchestration for crawl setup and execution.

pub mod barrier;
pub mod builder;
pub mod config;
pub mod controller;
pub mod job;
pub mod shutdown;

pub use barrier::CompletionBarrier;
pub use builder::{build_controller, build_crawler, load_jobs, open_store, BuildError};
pub use config::{build_crawl_config, CrawlConfig};
pub use controller::{CrawlController, CrawlSummary, VisitOrder};
pub use job::{Job, JobError, JobOrchestrator, JobOutcome, JobReport};
pub use shutdown::setup_shutdown_handler;
