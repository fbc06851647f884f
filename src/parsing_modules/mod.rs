//! Parsers that turn fetched catalog pages into product records.
//!
//! Listing pages do not render their products as markup worth scraping. The
//! whole result set is serialized into one element as a JSON blob for
//! client-side hydration, so extraction works on that blob directly:
//!
//! - **state_extractor**: finds the state element and parses its JSON
//! - **field_resolver**: path lookups against the parsed state
//! - **item_extractor**: maps one result entry to a [`ProductRecord`]
//! - **category_index**: reads listing links off the category index page
//!
//! [`ProductRecord`]: crate::models::ProductRecord

pub mod category_index;
pub mod field_resolver;
pub mod item_extractor;
pub mod state_extractor;

use crate::config::Config;
use field_resolver::{FieldPath, PathParseError};

/// Prefix shared by the page-count and results paths on the catalog's listing pages.
pub const SEARCH_RESULTS_PATH: &str = "$.jss.sitecore.route.placeholders.arrow-main[2].placeholders.plp-details[0].placeholders.product-line-search[0].fields.firstBeSearchResults";

/// Where a listing page keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLayout {
    /// `id` attribute of the element holding the embedded state
    pub state_element_id: String,
    /// Token the site writes in place of literal double quotes
    pub quote_placeholder: String,
    /// Total number of pages, read once from the first page
    pub page_count_path: FieldPath,
    /// Array of result entries, read on every page
    pub results_path: FieldPath,
}

impl ListingLayout {
    /// Layout whose page count lives at `<prefix>.resultsMetadata.totalPageCount`
    /// and results at `<prefix>.results`.
    pub fn with_search_results(prefix: &str) -> Result<Self, PathParseError> {
        let prefix: FieldPath = prefix.parse()?;
        Ok(Self {
            state_element_id: Config::STATE_ELEMENT_ID.to_string(),
            quote_placeholder: Config::QUOTE_PLACEHOLDER.to_string(),
            page_count_path: prefix.join("resultsMetadata").join("totalPageCount"),
            results_path: prefix.join("results"),
        })
    }
}

impl Default for ListingLayout {
    fn default() -> Self {
        Self::with_search_results(SEARCH_RESULTS_PATH).expect("built-in results path is valid")
    }
}
