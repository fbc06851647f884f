//! Product extraction from listing result entries.
//!
//! Each entry of the results array looks like:
//!
//! ```json
//! {
//!   "partId": "A1",
//!   "partNumber": "LM317T",
//!   "manufacturer": "Texas Instruments",
//!   "category": "Linear Regulators",
//!   "priceBands": [{"displayPrice": "$0.52"}, {"displayPrice": "$0.41"}]
//! }
//! ```
//!
//! All fields are read leniently. The price is the display price of the first
//! price band; later bands are quantity breaks and are ignored.

use serde_json::Value;

use super::field_resolver::{as_array, lenient_str, FieldPath};
use crate::models::ProductRecord;

/// Maps raw result entries to [`ProductRecord`]s.
#[derive(Debug, Clone)]
pub struct ItemExtractor {
    id: FieldPath,
    part_number: FieldPath,
    manufacturer: FieldPath,
    category: FieldPath,
    price_bands: FieldPath,
    display_price: FieldPath,
}

impl Default for ItemExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemExtractor {
    pub fn new() -> Self {
        Self {
            id: FieldPath::key("partId"),
            part_number: FieldPath::key("partNumber"),
            manufacturer: FieldPath::key("manufacturer"),
            category: FieldPath::key("category"),
            price_bands: FieldPath::key("priceBands"),
            display_price: FieldPath::key("displayPrice"),
        }
    }

    /// Build a record from one result entry. Missing fields come back empty.
    pub fn extract(&self, entry: &Value) -> ProductRecord {
        ProductRecord {
            id: lenient_str(entry, &self.id),
            part_number: lenient_str(entry, &self.part_number),
            category: lenient_str(entry, &self.category),
            manufacturer: lenient_str(entry, &self.manufacturer),
            price: self.first_band_price(entry),
        }
    }

    /// Records for every object entry of a results array. Non-object entries are skipped.
    pub fn extract_all(&self, results: &[Value]) -> Vec<ProductRecord> {
        results
            .iter()
            .filter(|entry| entry.is_object())
            .map(|entry| self.extract(entry))
            .collect()
    }

    fn first_band_price(&self, entry: &Value) -> String {
        self.price_bands
            .lookup(entry)
            .and_then(as_array)
            .and_then(|bands| bands.first())
            .map(|band| lenient_str(band, &self.display_price))
            .unwrap_or_default()
    }
}
