// Seed the listing set from the catalog's category index so crawls have jobs to run.

use std::sync::Arc;

use crate::network::{FetchError, PageSource};
use crate::parsing_modules::category_index::{extract_listing_urls, CategoryIndexError};
use crate::store::{RecordStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to fetch category index {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Parse(#[from] CategoryIndexError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reads listing links off the category index page into the seed set.
pub struct CategorySeeder {
    source: Arc<dyn PageSource>,
    index_url: String,
    link_selector: String,
    site_root: String,
}

impl CategorySeeder {
    pub fn new(
        source: Arc<dyn PageSource>,
        index_url: impl Into<String>,
        link_selector: impl Into<String>,
        site_root: impl Into<String>,
    ) -> Self {
        Self {
            source,
            index_url: index_url.into(),
            link_selector: link_selector.into(),
            site_root: site_root.into(),
        }
    }

    /// Listing URLs found on the index page.
    pub async fn discover(&self) -> Result<Vec<String>, SeedError> {
        let html = self
            .source
            .get_html(&self.index_url)
            .await
            .map_err(|source| SeedError::Fetch {
                url: self.index_url.clone(),
                source,
            })?;

        let urls = extract_listing_urls(&html, &self.link_selector, &self.site_root)?;
        for url in &urls {
            tracing::debug!(href = %url, "found listing");
        }
        Ok(urls)
    }

    /// Discover listings and add them to the seed set at `seed_key`.
    ///
    /// Returns the number of URLs that were not already seeded. A failed write is
    /// logged and the rest are still attempted.
    #[tracing::instrument(skip(self, store), fields(index = %self.index_url))]
    pub async fn seed(&self, store: &dyn RecordStore, seed_key: &str) -> Result<usize, SeedError> {
        let urls = self.discover().await?;
        let mut added = 0;

        for url in &urls {
            match store.add_seed_url(seed_key, url).await {
                Ok(true) => added += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(url = %url, error = %e, "failed to add seed url"),
            }
        }

        tracing::info!(found = urls.len(), added, "Seeded listing URLs");
        Ok(added)
    }
}
