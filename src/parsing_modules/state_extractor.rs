//! Embedded state extraction.
//!
//! The catalog serializes each listing's search results into a single element:
//!
//! ```html
//! <script id="arrow-state" type="application/json">
//! {&q;jss&q;:{&q;sitecore&q;:{ ... }}}
//! </script>
//! ```
//!
//! Double quotes are written as a placeholder token (`&q;`), so the text has to
//! be unescaped before it is valid JSON.

use scraper::{Html, Selector};
use serde_json::Value;

use super::ListingLayout;
use crate::models::PageDocument;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("no embedded state in element '{element_id}' on {url}")]
    NoEmbeddedState { url: String, element_id: String },

    #[error("embedded state on {url} is not valid JSON: {source}")]
    MalformedState {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid state selector: {0}")]
    InvalidSelector(String),
}

/// Pulls the embedded state out of a listing page.
#[derive(Debug)]
pub struct StateExtractor {
    selector: Selector,
    element_id: String,
    quote_placeholder: String,
}

impl StateExtractor {
    pub fn new(layout: &ListingLayout) -> Result<Self, ExtractError> {
        let selector_str = format!(r#"[id="{}"]"#, layout.state_element_id);
        let selector = Selector::parse(&selector_str)
            .map_err(|e| ExtractError::InvalidSelector(format!("{}: {:?}", selector_str, e)))?;

        Ok(Self {
            selector,
            element_id: layout.state_element_id.clone(),
            quote_placeholder: layout.quote_placeholder.clone(),
        })
    }

    /// Raw text of the state element, before unescaping.
    ///
    /// Returns `None` if the element is missing or holds only whitespace.
    pub fn raw_state(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let element = document.select(&self.selector).next()?;
        let text = element.text().collect::<String>();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Replace every placeholder token with a literal double quote.
    pub fn unescape(&self, raw: &str) -> String {
        raw.replace(&self.quote_placeholder, "\"")
    }

    /// Extract and parse the page's embedded state.
    pub fn extract(&self, page: &PageDocument) -> Result<Value, ExtractError> {
        let raw = self
            .raw_state(&page.body)
            .ok_or_else(|| ExtractError::NoEmbeddedState {
                url: page.url.clone(),
                element_id: self.element_id.clone(),
            })?;

        serde_json::from_str(&self.unescape(&raw)).map_err(|source| ExtractError::MalformedState {
            url: page.url.clone(),
            source,
        })
    }
}
