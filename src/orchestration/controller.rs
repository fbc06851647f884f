//! Runs every job of a crawl, one at a time, in a seeded pseudo-random order.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::job::{Job, JobError, JobOrchestrator};
use crate::config::Config;
use crate::metrics::CrawlMetrics;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum VisitOrder {
    /// Every job exactly once, in a seeded random permutation.
    #[default]
    Shuffled,
    /// One uniform draw per job from the full job list. Jobs may repeat or be skipped.
    WithReplacement,
}

/// Indices into a job list of length `n`, in visit order.
pub fn visit_order(n: usize, order: VisitOrder, rng: &mut StdRng) -> Vec<usize> {
    match order {
        VisitOrder::Shuffled => {
            let mut indices: Vec<usize> = (0..n).collect();
            indices.shuffle(rng);
            indices
        }
        VisitOrder::WithReplacement => (0..n).map(|_| rng.gen_range(0..n)).collect(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub total_jobs: usize,
    pub visits: usize,
    pub failed_jobs: usize,
    pub subpage_failures: u64,
    pub records_written: u64,
    pub stopped_early: bool,
}

impl fmt::Display for CrawlSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Crawled {} of {} jobs ({} failed), {} records written, {} subpage failures",
            self.visits,
            self.total_jobs,
            self.failed_jobs,
            self.records_written,
            self.subpage_failures
        )?;
        if self.stopped_early {
            write!(f, " (stopped early)")?;
        }
        Ok(())
    }
}

pub struct CrawlController {
    jobs: Vec<Job>,
    orchestrator: JobOrchestrator,
    metrics: Arc<CrawlMetrics>,
    delay: Duration,
    order: VisitOrder,
    seed: u64,
    shutdown: watch::Receiver<bool>,
}

impl CrawlController {
    pub fn new(
        jobs: Vec<Job>,
        orchestrator: JobOrchestrator,
        metrics: Arc<CrawlMetrics>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            jobs,
            orchestrator,
            metrics,
            delay: Duration::from_secs(Config::JOB_DELAY_SECS),
            order: VisitOrder::default(),
            seed: Config::RANDOM_SEED,
            shutdown,
        }
    }

    /// Pause between consecutive job visits.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_order(mut self, order: VisitOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn total_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Visit jobs sequentially with the configured delay between visits.
    ///
    /// A shutdown signal stops the run before the next visit; the summary of the
    /// visits made so far is still returned. An unresolvable page count aborts the
    /// run with an error.
    #[tracing::instrument(
        skip(self),
        fields(jobs = self.jobs.len(), order = ?self.order, seed = self.seed)
    )]
    pub async fn run(&self) -> Result<CrawlSummary, JobError> {
        let mut summary = CrawlSummary {
            total_jobs: self.jobs.len(),
            ..Default::default()
        };
        self.metrics.jobs_total.set(summary.total_jobs as u64);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let order = visit_order(self.jobs.len(), self.order, &mut rng);
        let mut shutdown = self.shutdown.clone();

        for (visit, &index) in order.iter().enumerate() {
            if visit > 0 {
                tokio::select! {
                    _ = tokio::time::sleep(self.delay) => {}
                    _ = shutdown_requested(&mut shutdown) => {}
                }
            }
            if *shutdown.borrow() {
                tracing::warn!(visits = summary.visits, "shutdown requested, stopping crawl");
                summary.stopped_early = true;
                break;
            }

            let report = self.orchestrator.run(&self.jobs[index]).await?;
            summary.visits += 1;
            self.metrics.jobs_visited.inc();
            if report.failed() {
                summary.failed_jobs += 1;
                self.metrics.jobs_failed.inc();
            }
            summary.subpage_failures += u64::from(report.subpage_failures);
            summary.records_written += report.records_written;
        }

        tracing::info!(
            total_jobs = summary.total_jobs,
            visits = summary.visits,
            failed_jobs = summary.failed_jobs,
            subpage_failures = summary.subpage_failures,
            records_written = summary.records_written,
            stopped_early = summary.stopped_early,
            "crawl finished"
        );
        Ok(summary)
    }
}

// Never resolves if the sender is gone.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
