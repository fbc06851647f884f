use scraper::{Html, Selector};
use url::Url;

/// Extract listing URLs from the category index page.
///
/// # Arguments
/// * `html_body` - The HTML content of the index page
/// * `selector` - CSS selector matching the listing anchors
/// * `site_root` - Base that relative hrefs are resolved against
///
/// # Returns
/// Absolute listing URLs in document order, without duplicates
///
/// # Examples
/// ```
/// use catalog_crawler::parsing_modules::category_index::extract_listing_urls;
///
/// let html = r#"<li class="item"><a href="/en/products/widgets">Widgets</a></li>"#;
/// let urls = extract_listing_urls(html, ".item a[href]", "https://shop.test").unwrap();
/// assert_eq!(urls, vec!["https://shop.test/en/products/widgets"]);
/// ```
pub fn extract_listing_urls(
    html_body: &str,
    selector: &str,
    site_root: &str,
) -> Result<Vec<String>, CategoryIndexError> {
    let selector = Selector::parse(selector)
        .map_err(|e| CategoryIndexError::InvalidSelector(format!("{}: {:?}", selector, e)))?;
    let root = Url::parse(site_root).map_err(|e| CategoryIndexError::InvalidRoot(e.to_string()))?;
    let document = Html::parse_document(html_body);

    let mut urls: Vec<String> = Vec::new();

    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            let cleaned_href = href.trim();

            // Skip empty links and in-page anchors
            if cleaned_href.is_empty()
                || cleaned_href.starts_with('#')
                || cleaned_href.starts_with("javascript:")
            {
                continue;
            }

            match root.join(cleaned_href) {
                Ok(url) => {
                    let url = url.to_string();
                    if !urls.contains(&url) {
                        urls.push(url);
                    }
                }
                Err(e) => {
                    tracing::debug!(href = cleaned_href, error = %e, "skipping unresolvable href")
                }
            }
        }
    }

    Ok(urls)
}

#[derive(Debug, thiserror::Error)]
pub enum CategoryIndexError {
    #[error("invalid listing selector: {0}")]
    InvalidSelector(String),

    #[error("invalid site root: {0}")]
    InvalidRoot(String),
}
