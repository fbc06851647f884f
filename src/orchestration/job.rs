//! One crawl job: every page of a single listing URL.
//!
//! The first page is fetched alone because it carries the page count. The
//! remaining pages are then fetched concurrently, each task extracting and
//! storing its own records, and the job waits for all of them before it reports.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use super::barrier::CompletionBarrier;
use crate::fetcher::PageFetcher;
use crate::metrics::CrawlMetrics;
use crate::network::{FetchError, PageSource};
use crate::parsing_modules::field_resolver::{
    as_array, coerce_f64, json_type_name, strict, FieldPath, ResolveError,
};
use crate::parsing_modules::item_extractor::ItemExtractor;
use crate::parsing_modules::state_extractor::{ExtractError, StateExtractor};
use crate::parsing_modules::ListingLayout;
use crate::store::{persist_record, RecordStore};

/// A listing URL to crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub url: String,
}

impl Job {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    /// The first page could not be fetched, had no readable state or had no
    /// results array. Subpages may still have been crawled.
    FailedFirstPage { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub url: String,
    pub outcome: JobOutcome,
    pub page_count: u32,
    pub subpages_issued: u32,
    pub subpage_failures: u32,
    pub records_written: u64,
}

impl JobReport {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            outcome: JobOutcome::Succeeded,
            page_count: 0,
            subpages_issued: 0,
            subpage_failures: 0,
            records_written: 0,
        }
    }

    pub fn failed(&self) -> bool {
        matches!(self.outcome, JobOutcome::FailedFirstPage { .. })
    }
}

/// Failures that end the whole crawl, not just the job.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("page count unresolved for {url}: {source}")]
    PageCountUnresolved {
        url: String,
        #[source]
        source: ResolveError,
    },
}

/// Why a single page produced no records.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("no results on {url}: {source}")]
    MissingResults {
        url: String,
        #[source]
        source: ResolveError,
    },

    #[error("results on {url} is a {found}, not an array")]
    ResultsNotArray { url: String, found: &'static str },
}

/// Fetch, extract and store for one page. Cloned into every subpage task.
#[derive(Clone)]
pub struct PagePipeline {
    fetcher: PageFetcher,
    state: Arc<StateExtractor>,
    items: ItemExtractor,
    results_path: FieldPath,
    store: Arc<dyn RecordStore>,
    metrics: Arc<CrawlMetrics>,
}

impl PagePipeline {
    pub fn new(
        layout: &ListingLayout,
        source: Arc<dyn PageSource>,
        store: Arc<dyn RecordStore>,
        metrics: Arc<CrawlMetrics>,
    ) -> Result<Self, ExtractError> {
        Ok(Self {
            fetcher: PageFetcher::new(source, Arc::clone(&metrics)),
            state: Arc::new(StateExtractor::new(layout)?),
            items: ItemExtractor::new(),
            results_path: layout.results_path.clone(),
            store,
            metrics,
        })
    }

    /// Fetch the page at `index` and parse its embedded state.
    pub async fn load(&self, base: &str, index: u32) -> Result<(String, Value), PageError> {
        let page = self.fetcher.fetch(base, index).await?;
        let state = self.state.extract(&page)?;
        Ok((page.url, state))
    }

    /// Persist every result entry in `state`. Returns the number of records written.
    ///
    /// A missing or non-array results field is an error. A failed store write is
    /// logged and the remaining records are still written.
    pub async fn store_page(&self, url: &str, state: &Value) -> Result<u64, PageError> {
        let value = strict(state, &self.results_path).map_err(|source| {
            PageError::MissingResults {
                url: url.to_string(),
                source,
            }
        })?;
        let results = as_array(value).ok_or_else(|| PageError::ResultsNotArray {
            url: url.to_string(),
            found: json_type_name(value),
        })?;

        let mut written = 0;
        for record in self.items.extract_all(results) {
            if persist_record(self.store.as_ref(), &record, &self.metrics).await {
                written += 1;
            }
        }
        tracing::debug!(url, entries = results.len(), written, "stored page");
        Ok(written)
    }

    /// Full pipeline for a subpage: no page count, no fan-out.
    pub async fn process_page(&self, base: &str, index: u32) -> Result<u64, PageError> {
        let (url, state) = self.load(base, index).await?;
        self.store_page(&url, &state).await
    }
}

/// Page count from the resolved value. Non-numeric or negative counts are zero.
///
/// The count is taken as published; subpage tasks are only spawned as page
/// permits free up, so a large count costs time, not memory.
fn page_count_of(value: &Value) -> u32 {
    let count = coerce_f64(value);
    if count.is_finite() && count > 0.0 {
        count as u32
    } else {
        0
    }
}

/// Runs jobs one listing at a time, fanning each out over its pages.
pub struct JobOrchestrator {
    pipeline: PagePipeline,
    page_count_path: FieldPath,
    page_permits: Arc<Semaphore>,
    metrics: Arc<CrawlMetrics>,
}

impl JobOrchestrator {
    pub fn new(
        layout: &ListingLayout,
        source: Arc<dyn PageSource>,
        store: Arc<dyn RecordStore>,
        metrics: Arc<CrawlMetrics>,
        max_concurrent_pages: usize,
    ) -> Result<Self, ExtractError> {
        Ok(Self {
            pipeline: PagePipeline::new(layout, source, store, Arc::clone(&metrics))?,
            page_count_path: layout.page_count_path.clone(),
            page_permits: Arc::new(Semaphore::new(max_concurrent_pages.max(1))),
            metrics,
        })
    }

    /// Crawl every page of `job`.
    ///
    /// A first page that cannot be fetched or parsed fails the job and is reported
    /// in the outcome. So does a first page without a results array, although its
    /// subpages are still crawled. A first page without a page count is an error
    /// for the whole run.
    #[tracing::instrument(skip(self, job), fields(url = %job.url))]
    pub async fn run(&self, job: &Job) -> Result<JobReport, JobError> {
        let mut report = JobReport::new(&job.url);

        let (first_url, state) = match self.pipeline.load(&job.url, 0).await {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(error = %e, "first page failed");
                report.outcome = JobOutcome::FailedFirstPage {
                    reason: e.to_string(),
                };
                return Ok(report);
            }
        };

        let count = strict(&state, &self.page_count_path).map_err(|source| {
            JobError::PageCountUnresolved {
                url: job.url.clone(),
                source,
            }
        })?;
        report.page_count = page_count_of(count);
        tracing::info!(page_count = report.page_count, "resolved page count");

        match self.pipeline.store_page(&first_url, &state).await {
            Ok(written) => report.records_written += written,
            Err(e) => {
                tracing::warn!(error = %e, "first page has no results");
                report.outcome = JobOutcome::FailedFirstPage {
                    reason: e.to_string(),
                };
            }
        }
        drop(state);

        if report.page_count > 1 {
            self.fan_out(job, &mut report).await;
        }

        tracing::info!(
            records = report.records_written,
            subpage_failures = report.subpage_failures,
            "job finished"
        );
        Ok(report)
    }

    async fn fan_out(&self, job: &Job, report: &mut JobReport) {
        let barrier = CompletionBarrier::new();
        let guards = barrier.arm((report.page_count - 1) as usize);
        report.subpages_issued = guards.len() as u32;
        self.metrics.pages_pending.add(guards.len() as u64);

        let mut tasks = JoinSet::new();
        for (index, guard) in (1..report.page_count).zip(guards) {
            let pending = PendingPage(Arc::clone(&self.metrics));
            let permit = match Arc::clone(&self.page_permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::error!(page = index + 1, "page permits closed");
                    self.record_subpage_failure(report);
                    continue;
                }
            };
            let pipeline = self.pipeline.clone();
            let base = job.url.clone();

            tasks.spawn(async move {
                let _guard = guard;
                let _pending = pending;
                let _permit = permit;
                (index, pipeline.process_page(&base, index).await)
            });

            while let Some(joined) = tasks.try_join_next() {
                self.tally(joined, report);
            }
        }

        barrier.wait().await;

        while let Some(joined) = tasks.join_next().await {
            self.tally(joined, report);
        }
    }

    fn tally(
        &self,
        joined: Result<(u32, Result<u64, PageError>), JoinError>,
        report: &mut JobReport,
    ) {
        match joined {
            Ok((_, Ok(written))) => report.records_written += written,
            Ok((index, Err(e))) => {
                tracing::warn!(page = index + 1, error = %e, "subpage failed");
                self.record_subpage_failure(report);
            }
            Err(e) => {
                tracing::error!(error = %e, "subpage task panicked");
                self.record_subpage_failure(report);
            }
        }
    }

    fn record_subpage_failure(&self, report: &mut JobReport) {
        report.subpage_failures += 1;
        self.metrics.subpages_failed.inc();
    }
}

/// Holds one unit of the pending-pages gauge until the subpage task ends.
struct PendingPage(Arc<CrawlMetrics>);

impl Drop for PendingPage {
    fn drop(&mut self) {
        self.0.pages_pending.dec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductRecord;
    use crate::store::{MemoryStore, StoreError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Serves canned pages by URL and records every request.
    struct ScriptedSource {
        pages: HashMap<String, Result<String, FetchError>>,
        requested: Mutex<Vec<String>>,
    }

    impl ScriptedSource {
        fn new() -> Self {
            Self {
                pages: HashMap::new(),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn page(mut self, url: &str, state: Value) -> Self {
            let escaped = state.to_string().replace('"', "&q;");
            let html = format!(
                "<html><body><script id=\"arrow-state\" type=\"application/json\">{}</script>\
                 </body></html>",
                escaped
            );
            self.pages.insert(url.to_string(), Ok(html));
            self
        }

        fn failing(mut self, url: &str, error: FetchError) -> Self {
            self.pages.insert(url.to_string(), Err(error));
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().clone()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn get_html(&self, url: &str) -> Result<String, FetchError> {
            self.requested.lock().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .unwrap_or(Err(FetchError::HttpStatus(404)))
        }
    }

    fn listing(page_count: Value, results: Value) -> Value {
        json!({"search": {"resultsMetadata": {"totalPageCount": page_count}, "results": results}})
    }

    fn widget(id: &str) -> Value {
        json!({
            "partId": id,
            "partNumber": format!("PN-{}", id),
            "manufacturer": "Acme",
            "category": "widgets",
            "priceBands": [{"displayPrice": "$1.00"}]
        })
    }

    struct Harness {
        source: Arc<ScriptedSource>,
        store: Arc<MemoryStore>,
        metrics: Arc<CrawlMetrics>,
        orchestrator: JobOrchestrator,
    }

    fn orchestrator(
        source: Arc<ScriptedSource>,
        store: Arc<dyn RecordStore>,
        metrics: Arc<CrawlMetrics>,
        max_concurrent_pages: usize,
    ) -> JobOrchestrator {
        let layout = ListingLayout::with_search_results("$.search").unwrap();
        JobOrchestrator::new(&layout, source, store, metrics, max_concurrent_pages).unwrap()
    }

    fn harness(source: ScriptedSource) -> Harness {
        let source = Arc::new(source);
        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(CrawlMetrics::new());
        let orchestrator = orchestrator(source.clone(), store.clone(), metrics.clone(), 4);
        Harness {
            source,
            store,
            metrics,
            orchestrator,
        }
    }

    const BASE: &str = "https://shop.test/widgets";

    #[tokio::test]
    async fn test_three_page_listing() {
        let h = harness(
            ScriptedSource::new()
                .page(BASE, listing(json!(3), json!([widget("A1")])))
                .page(&format!("{}?page=2", BASE), listing(json!(3), json!([widget("A2")])))
                .page(&format!("{}?page=3", BASE), listing(json!(3), json!([]))),
        );

        let report = h.orchestrator.run(&Job::new(BASE)).await.unwrap();

        assert_eq!(report.outcome, JobOutcome::Succeeded);
        assert_eq!(report.page_count, 3);
        assert_eq!(report.subpages_issued, 2);
        assert_eq!(report.subpage_failures, 0);
        assert_eq!(report.records_written, 2);

        assert_eq!(h.store.members("widgets"), vec!["A1", "A2"]);
        let stored = h.store.records("A1").await.unwrap();
        assert_eq!(stored[0].part_number, "PN-A1");
        assert_eq!(stored[0].price, "$1.00");

        let requested = h.source.requested();
        assert_eq!(requested.len(), 3);
        assert_eq!(requested[0], BASE);
        assert_eq!(h.metrics.pages_pending.get(), 0);
    }

    #[tokio::test]
    async fn test_first_page_fetch_failure_fails_job() {
        let h = harness(ScriptedSource::new().failing(BASE, FetchError::ConnectionRefused));

        let report = h.orchestrator.run(&Job::new(BASE)).await.unwrap();

        assert!(report.failed());
        assert_eq!(report.subpages_issued, 0);
        assert_eq!(h.source.requested(), vec![BASE.to_string()]);
        assert_eq!(h.store.key_count(), 0);
    }

    #[tokio::test]
    async fn test_first_page_without_state_fails_job() {
        let mut source = ScriptedSource::new();
        let maintenance = "<html><body>maintenance</body></html>".to_string();
        source.pages.insert(BASE.to_string(), Ok(maintenance));
        let h = harness(source);

        let report = h.orchestrator.run(&Job::new(BASE)).await.unwrap();
        assert!(matches!(report.outcome, JobOutcome::FailedFirstPage { .. }));
    }

    #[tokio::test]
    async fn test_missing_page_count_is_an_error() {
        let h = harness(
            ScriptedSource::new().page(BASE, json!({"search": {"results": [widget("A1")]}})),
        );

        let err = h.orchestrator.run(&Job::new(BASE)).await.unwrap_err();
        assert!(matches!(err, JobError::PageCountUnresolved { .. }));
        assert_eq!(h.source.requested().len(), 1);
        assert_eq!(h.store.key_count(), 0);
    }

    #[tokio::test]
    async fn test_single_or_zero_pages_issue_no_subpages() {
        for count in [json!(1), json!(0), json!("three")] {
            let h =
                harness(ScriptedSource::new().page(BASE, listing(count, json!([widget("A1")]))));

            let report = h.orchestrator.run(&Job::new(BASE)).await.unwrap();
            assert_eq!(report.subpages_issued, 0);
            assert_eq!(report.records_written, 1);
            assert_eq!(h.source.requested().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_failing_subpage_is_logged_and_job_completes() {
        let h = harness(
            ScriptedSource::new()
                .page(BASE, listing(json!(4), json!([widget("A1")])))
                .page(&format!("{}?page=2", BASE), listing(json!(4), json!([widget("A2")])))
                .failing(&format!("{}?page=3", BASE), FetchError::Timeout)
                .page(&format!("{}?page=4", BASE), listing(json!(4), json!([widget("A4")]))),
        );

        let report = h.orchestrator.run(&Job::new(BASE)).await.unwrap();

        assert_eq!(report.outcome, JobOutcome::Succeeded);
        assert_eq!(report.subpages_issued, 3);
        assert_eq!(report.subpage_failures, 1);
        assert_eq!(report.records_written, 3);
        assert_eq!(h.source.requested().len(), 4);
        assert_eq!(h.metrics.subpages_failed.get(), 1);
        assert_eq!(h.metrics.pages_pending.get(), 0);
    }

    #[tokio::test]
    async fn test_first_page_without_results_fails_job() {
        let h = harness(
            ScriptedSource::new()
                .page(BASE, json!({"search": {"resultsMetadata": {"totalPageCount": 1}}})),
        );

        let report = h.orchestrator.run(&Job::new(BASE)).await.unwrap();
        assert!(report.failed());
        assert_eq!(report.page_count, 1);
        assert_eq!(report.records_written, 0);
        assert_eq!(h.store.key_count(), 0);
    }

    #[tokio::test]
    async fn test_first_page_with_non_array_results_fails_job() {
        let h = harness(ScriptedSource::new().page(BASE, listing(json!(1), json!({"A1": 1}))));

        let report = h.orchestrator.run(&Job::new(BASE)).await.unwrap();
        match report.outcome {
            JobOutcome::FailedFirstPage { reason } => assert!(reason.contains("not an array")),
            other => panic!("expected a failed job, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_first_page_without_results_still_crawls_subpages() {
        let h = harness(
            ScriptedSource::new()
                .page(BASE, json!({"search": {"resultsMetadata": {"totalPageCount": 2}}}))
                .page(&format!("{}?page=2", BASE), listing(json!(2), json!([widget("A2")]))),
        );

        let report = h.orchestrator.run(&Job::new(BASE)).await.unwrap();

        assert!(report.failed());
        assert_eq!(report.subpages_issued, 1);
        assert_eq!(report.records_written, 1);
        assert_eq!(h.store.members("widgets"), vec!["A2"]);
        assert_eq!(h.source.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_subpage_without_results_is_a_subpage_failure() {
        let h = harness(
            ScriptedSource::new()
                .page(BASE, listing(json!(3), json!([widget("A1")])))
                .page(&format!("{}?page=2", BASE), json!({"search": {}}))
                .page(&format!("{}?page=3", BASE), listing(json!(3), json!("none"))),
        );

        let report = h.orchestrator.run(&Job::new(BASE)).await.unwrap();

        assert_eq!(report.outcome, JobOutcome::Succeeded);
        assert_eq!(report.subpage_failures, 2);
        assert_eq!(report.records_written, 1);
        assert_eq!(h.metrics.subpages_failed.get(), 2);
    }

    /// Memory store whose first category index write fails.
    struct FlakyIndexStore {
        inner: MemoryStore,
        failed_once: AtomicBool,
    }

    #[async_trait]
    impl RecordStore for FlakyIndexStore {
        async fn add_to_category(&self, category: &str, id: &str) -> Result<(), StoreError> {
            if !self.failed_once.swap(true, Ordering::SeqCst) {
                return Err(StoreError::Unavailable("index offline".to_string()));
            }
            self.inner.add_to_category(category, id).await
        }
        async fn add_record(&self, record: &ProductRecord) -> Result<(), StoreError> {
            self.inner.add_record(record).await
        }
        async fn seed_urls(&self, key: &str) -> Result<Vec<String>, StoreError> {
            self.inner.seed_urls(key).await
        }
        async fn add_seed_url(&self, key: &str, url: &str) -> Result<bool, StoreError> {
            self.inner.add_seed_url(key, url).await
        }
        async fn category_members(&self, category: &str) -> Result<Vec<String>, StoreError> {
            self.inner.category_members(category).await
        }
        async fn records(&self, id: &str) -> Result<Vec<ProductRecord>, StoreError> {
            self.inner.records(id).await
        }
    }

    #[tokio::test]
    async fn test_failed_index_write_does_not_stop_the_page() {
        let source = Arc::new(
            ScriptedSource::new()
                .page(BASE, listing(json!(1), json!([widget("A1"), widget("A2"), widget("A3")]))),
        );
        let store = Arc::new(FlakyIndexStore {
            inner: MemoryStore::new(),
            failed_once: AtomicBool::new(false),
        });
        let metrics = Arc::new(CrawlMetrics::new());
        let orchestrator = orchestrator(source, store.clone(), metrics.clone(), 4);

        let report = orchestrator.run(&Job::new(BASE)).await.unwrap();

        assert_eq!(report.outcome, JobOutcome::Succeeded);
        assert_eq!(report.records_written, 2);
        assert_eq!(metrics.records_written.get(), 2);
        assert_eq!(metrics.store_write_failures.get(), 1);

        assert_eq!(store.inner.members("widgets"), vec!["A2", "A3"]);
        for id in ["A1", "A2", "A3"] {
            assert_eq!(store.inner.records(id).await.unwrap().len(), 1, "value set for {}", id);
        }
    }

    /// Source that holds every subpage until released, to observe the job mid-flight.
    struct GatedSource {
        inner: ScriptedSource,
        gate: tokio::sync::Semaphore,
    }

    #[async_trait]
    impl PageSource for GatedSource {
        async fn get_html(&self, url: &str) -> Result<String, FetchError> {
            self.inner.requested.lock().push(url.to_string());
            if url != BASE {
                if let Ok(permit) = self.gate.acquire().await {
                    permit.forget();
                }
            }
            self.inner
                .pages
                .get(url)
                .cloned()
                .unwrap_or(Err(FetchError::HttpStatus(404)))
        }
    }

    #[tokio::test]
    async fn test_pending_gauge_drops_as_subpages_finish() {
        let mut inner = ScriptedSource::new().page(BASE, listing(json!(4), json!([])));
        for page in 2..=4 {
            inner = inner.page(&format!("{}?page={}", BASE, page), listing(json!(4), json!([])));
        }
        let source = Arc::new(GatedSource {
            inner,
            gate: tokio::sync::Semaphore::new(0),
        });
        let metrics = Arc::new(CrawlMetrics::new());
        let layout = ListingLayout::with_search_results("$.search").unwrap();
        let orchestrator = Arc::new(
            JobOrchestrator::new(
                &layout,
                source.clone(),
                Arc::new(MemoryStore::new()),
                metrics.clone(),
                4,
            )
            .unwrap(),
        );

        let running = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.run(&Job::new(BASE)).await })
        };

        wait_for(|| metrics.pages_pending.get() == 3).await;
        source.gate.add_permits(1);
        wait_for(|| metrics.pages_pending.get() == 2).await;
        assert!(!running.is_finished());

        source.gate.add_permits(2);
        let report = running.await.unwrap().unwrap();
        assert_eq!(report.subpages_issued, 3);
        assert_eq!(metrics.pages_pending.get(), 0);
    }

    #[tokio::test]
    async fn test_subpages_are_spawned_only_as_permits_free_up() {
        let mut inner = ScriptedSource::new().page(BASE, listing(json!(6), json!([])));
        for page in 2..=6 {
            inner = inner.page(&format!("{}?page={}", BASE, page), listing(json!(6), json!([])));
        }
        let source = Arc::new(GatedSource {
            inner,
            gate: tokio::sync::Semaphore::new(0),
        });
        let layout = ListingLayout::with_search_results("$.search").unwrap();
        let orchestrator = Arc::new(
            JobOrchestrator::new(
                &layout,
                source.clone(),
                Arc::new(MemoryStore::new()),
                Arc::new(CrawlMetrics::new()),
                2,
            )
            .unwrap(),
        );

        let running = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.run(&Job::new(BASE)).await })
        };

        // Only two subpage tasks may be in flight at once.
        wait_for(|| source.inner.requested().len() == 3).await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(source.inner.requested().len(), 3);

        source.gate.add_permits(5);
        let report = running.await.unwrap().unwrap();
        assert_eq!(report.subpages_issued, 5);
        assert_eq!(report.subpage_failures, 0);
        assert_eq!(source.inner.requested().len(), 6);
    }

    async fn wait_for(condition: impl Fn() -> bool) {
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while !condition() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("condition not reached");
    }

    #[tokio::test]
    async fn test_empty_id_entries_are_skipped() {
        let h = harness(ScriptedSource::new().page(
            BASE,
            listing(
                json!(1),
                json!([widget("A1"), {"partNumber": "NOID", "category": "widgets"}, 7]),
            ),
        ));

        let report = h.orchestrator.run(&Job::new(BASE)).await.unwrap();
        assert_eq!(report.records_written, 1);
        assert_eq!(h.store.members("widgets"), vec!["A1"]);
        assert_eq!(h.metrics.records_skipped.get(), 1);
    }

    #[test]
    fn test_page_count_coercion() {
        assert_eq!(page_count_of(&json!(3)), 3);
        assert_eq!(page_count_of(&json!(2.0)), 2);
        assert_eq!(page_count_of(&json!(-1)), 0);
        assert_eq!(page_count_of(&json!("3")), 0);
        assert_eq!(page_count_of(&json!(null)), 0);
    }
}
