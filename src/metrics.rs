use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct Histogram {
    buckets: Vec<(u64, u64)>,
    sum_ms: u64,
    count: u64,
}

impl Histogram {
    pub fn new() -> Self {
        Self {
            buckets: vec![
                (50, 0),
                (100, 0),
                (250, 0),
                (500, 0),
                (1000, 0),
                (2500, 0),
                (5000, 0),
                (10000, 0),
                (u64::MAX, 0),
            ],
            sum_ms: 0,
            count: 0,
        }
    }

    pub fn observe(&mut self, value_ms: u64) {
        self.sum_ms = self.sum_ms.saturating_add(value_ms);
        self.count += 1;

        for (threshold, count) in &mut self.buckets {
            if value_ms <= *threshold {
                *count += 1;
                break;
            }
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean_ms(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.sum_ms / self.count
        }
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

// Atomic counter for lock-free updates from concurrent page tasks
#[derive(Debug)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self { value: AtomicU64::new(0) }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, delta: u64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    /// Decrement without wrapping below zero.
    pub fn dec(&self) {
        let _ = self
            .value
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    pub fn set(&self, value: u64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide crawl counters, shared by the controller, page tasks and the
/// diagnostics endpoint.
#[derive(Debug, Default)]
pub struct CrawlMetrics {
    pub page_fetch_latency: Mutex<Histogram>,

    pub jobs_total: Counter,
    pub jobs_visited: Counter,
    pub jobs_failed: Counter,
    pub pages_fetched: Counter,
    pub page_fetch_failures: Counter,
    pub subpages_failed: Counter,
    pub pages_pending: Counter,
    pub records_written: Counter,
    pub records_skipped: Counter,
    pub store_write_failures: Counter,
}

/// Point-in-time copy of [`CrawlMetrics`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub jobs_total: u64,
    pub jobs_visited: u64,
    pub jobs_failed: u64,
    pub pages_fetched: u64,
    pub page_fetch_failures: u64,
    pub subpages_failed: u64,
    pub pages_pending: u64,
    pub records_written: u64,
    pub records_skipped: u64,
    pub store_write_failures: u64,
    pub fetch_latency_mean_ms: u64,
}

impl CrawlMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fetch(&self, duration: Duration, success: bool) {
        if success {
            self.pages_fetched.inc();
        } else {
            self.page_fetch_failures.inc();
        }
        self.page_fetch_latency
            .lock()
            .observe(duration.as_millis() as u64);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            jobs_total: self.jobs_total.get(),
            jobs_visited: self.jobs_visited.get(),
            jobs_failed: self.jobs_failed.get(),
            pages_fetched: self.pages_fetched.get(),
            page_fetch_failures: self.page_fetch_failures.get(),
            subpages_failed: self.subpages_failed.get(),
            pages_pending: self.pages_pending.get(),
            records_written: self.records_written.get(),
            records_skipped: self.records_skipped.get(),
            store_write_failures: self.store_write_failures.get(),
            fetch_latency_mean_ms: self.page_fetch_latency.lock().mean_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram() {
        let mut hist = Histogram::new();
        hist.observe(5);
        hist.observe(10);
        hist.observe(15);

        assert_eq!(hist.count(), 3);
        assert_eq!(hist.mean_ms(), 10);
        assert_eq!(hist.buckets[0], (50, 3));
    }

    #[test]
    fn test_histogram_overflow_bucket() {
        let mut hist = Histogram::new();
        hist.observe(60_000);
        assert_eq!(hist.buckets.last(), Some(&(u64::MAX, 1)));
    }

    #[test]
    fn test_counter() {
        let counter = Counter::new();
        counter.inc();
        counter.add(5);
        assert_eq!(counter.get(), 6);

        counter.set(1);
        counter.dec();
        counter.dec();
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn test_snapshot_reflects_fetches() {
        let metrics = CrawlMetrics::new();
        metrics.record_fetch(Duration::from_millis(100), true);
        metrics.record_fetch(Duration::from_millis(300), false);
        metrics.jobs_failed.inc();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.pages_fetched, 1);
        assert_eq!(snapshot.page_fetch_failures, 1);
        assert_eq!(snapshot.jobs_failed, 1);
        assert_eq!(snapshot.fetch_latency_mean_ms, 200);
    }
}
