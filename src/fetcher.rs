//! Listing page retrieval.
//!
//! Page index 0 is the listing URL itself. Index `n >= 1` is page `n + 1` on the
//! site and is requested with a `page=<n+1>` query parameter.

use std::sync::Arc;
use std::time::Instant;

use crate::metrics::CrawlMetrics;
use crate::models::PageDocument;
use crate::network::{FetchError, PageSource};

/// URL of the listing page at `index`.
pub fn page_url(base: &str, index: u32) -> String {
    if index == 0 {
        return base.to_string();
    }
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{}{}page={}", base, separator, index + 1)
}

/// Fetches listing pages through a shared [`PageSource`].
#[derive(Clone)]
pub struct PageFetcher {
    source: Arc<dyn PageSource>,
    metrics: Arc<CrawlMetrics>,
}

impl PageFetcher {
    pub fn new(source: Arc<dyn PageSource>, metrics: Arc<CrawlMetrics>) -> Self {
        Self { source, metrics }
    }

    /// Fetch the page at `index` of the listing at `base`.
    pub async fn fetch(&self, base: &str, index: u32) -> Result<PageDocument, FetchError> {
        let url = page_url(base, index);
        tracing::info!(url = %url, "visiting");

        let started = Instant::now();
        let result = self.source.get_html(&url).await;
        self.metrics.record_fetch(started.elapsed(), result.is_ok());

        result.map(|body| PageDocument::new(url, body))
    }
}
