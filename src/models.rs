use serde::{Deserialize, Serialize};

/// A product extracted from one entry of a listing page's results array.
///
/// Every field except `id` may be empty when the source entry lacks it or
/// holds a value of the wrong JSON type. Records are immutable once extracted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    /// Catalog part id, the store key for this record
    pub id: String,

    /// Manufacturer part number
    pub part_number: String,

    /// Category name, used as the index set key
    pub category: String,

    pub manufacturer: String,

    /// Display price of the first price band, empty when there is none
    pub price: String,
}

impl ProductRecord {
    /// Serialize to the JSON form written into the per-id set.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a record previously written with [`ProductRecord::to_json`].
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Records without an id cannot be addressed in the store.
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }
}

/// A fetched listing page, not yet parsed.
///
/// The body is kept as text so the value can cross task boundaries; the HTML
/// tree is built where the state is extracted.
#[derive(Debug, Clone)]
pub struct PageDocument {
    /// URL the page was requested from, including any page query
    pub url: String,
    pub body: String,
}

impl PageDocument {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }
}
