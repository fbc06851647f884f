//! Set-based record store.
//!
//! Each record produces two set entries:
//!
//! - `SADD <category> <id>` so a category can list its ids
//! - `SADD <id> <record json>` as the canonical per-id value
//!
//! Both are set additions, so repeating a write is a no-op and concurrent page
//! tasks can write without coordination. The same keyspace also holds the seed
//! set of listing URLs.

use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use std::collections::BTreeSet;

use crate::metrics::CrawlMetrics;
use crate::models::ProductRecord;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),

    #[error("Failed to serialize record {id}: {source}")]
    Serialization {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Add `id` to the set keyed by `category`.
    async fn add_to_category(&self, category: &str, id: &str) -> Result<(), StoreError>;

    /// Add the serialized record to the set keyed by its id.
    async fn add_record(&self, record: &ProductRecord) -> Result<(), StoreError>;

    /// All listing URLs in the seed set.
    async fn seed_urls(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Add a listing URL to the seed set. Returns false if it was already there.
    async fn add_seed_url(&self, key: &str, url: &str) -> Result<bool, StoreError>;

    /// Ids indexed under `category`.
    async fn category_members(&self, category: &str) -> Result<Vec<String>, StoreError>;

    /// Records stored under `id`. Normally one; several if the source changed between runs.
    async fn records(&self, id: &str) -> Result<Vec<ProductRecord>, StoreError>;
}

fn encode(record: &ProductRecord) -> Result<String, StoreError> {
    record.to_json().map_err(|source| StoreError::Serialization {
        id: record.id.clone(),
        source,
    })
}

fn decode_members(id: &str, members: impl IntoIterator<Item = String>) -> Vec<ProductRecord> {
    members
        .into_iter()
        .filter_map(|json| match ProductRecord::from_json(&json) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(id, error = %e, "skipping undecodable record");
                None
            }
        })
        .collect()
}

/// Write one record to the store: category index first, then the per-id value.
///
/// Both writes are always attempted. Failures are logged and counted, never
/// retried, and the paired write is not rolled back. Records without an id are
/// skipped. Returns true when both writes succeeded.
pub async fn persist_record(
    store: &dyn RecordStore,
    record: &ProductRecord,
    metrics: &CrawlMetrics,
) -> bool {
    if !record.has_id() {
        tracing::warn!(
            part_number = %record.part_number,
            category = %record.category,
            "result entry has no part id, not stored"
        );
        metrics.records_skipped.inc();
        return false;
    }

    let mut ok = true;

    match store.add_to_category(&record.category, &record.id).await {
        Ok(()) => {
            tracing::trace!(category = %record.category, id = %record.id, "indexed id in category")
        }
        Err(e) => {
            tracing::warn!(
                category = %record.category,
                id = %record.id,
                error = %e,
                "category index write failed"
            );
            metrics.store_write_failures.inc();
            ok = false;
        }
    }

    match store.add_record(record).await {
        Ok(()) => tracing::trace!(id = %record.id, "stored record"),
        Err(e) => {
            tracing::warn!(id = %record.id, error = %e, "record write failed");
            metrics.store_write_failures.inc();
            ok = false;
        }
    }

    if ok {
        metrics.records_written.inc();
    }
    ok
}

/// Redis-backed store
#[derive(Clone)]
pub struct RedisStore {
    client: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis
    ///
    /// # Arguments
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url)?;
        let connection_manager = ConnectionManager::new(client).await?;

        Ok(Self {
            client: connection_manager,
        })
    }

    // ConnectionManager is a cheap handle over one multiplexed connection
    fn conn(&self) -> ConnectionManager {
        self.client.clone()
    }
}

#[async_trait]
impl RecordStore for RedisStore {
    async fn add_to_category(&self, category: &str, id: &str) -> Result<(), StoreError> {
        let _: i64 = self.conn().sadd(category, id).await?;
        Ok(())
    }

    async fn add_record(&self, record: &ProductRecord) -> Result<(), StoreError> {
        let json = encode(record)?;
        let _: i64 = self.conn().sadd(&record.id, json).await?;
        Ok(())
    }

    async fn seed_urls(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let urls: Vec<String> = self.conn().smembers(key).await?;
        Ok(urls)
    }

    async fn add_seed_url(&self, key: &str, url: &str) -> Result<bool, StoreError> {
        let added: i64 = self.conn().sadd(key, url).await?;
        Ok(added > 0)
    }

    async fn category_members(&self, category: &str) -> Result<Vec<String>, StoreError> {
        let mut ids: Vec<String> = self.conn().smembers(category).await?;
        ids.sort();
        Ok(ids)
    }

    async fn records(&self, id: &str) -> Result<Vec<ProductRecord>, StoreError> {
        let members: Vec<String> = self.conn().smembers(id).await?;
        Ok(decode_members(id, members))
    }
}

/// In-memory store with the same set semantics as [`RedisStore`].
///
/// Used by dry runs and tests. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sets: DashMap<String, BTreeSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Members of the set at `key`, sorted.
    pub fn members(&self, key: &str) -> Vec<String> {
        self.sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of non-empty keys.
    pub fn key_count(&self) -> usize {
        self.sets.len()
    }

    fn sadd(&self, key: &str, member: String) -> bool {
        self.sets.entry(key.to_string()).or_default().insert(member)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn add_to_category(&self, category: &str, id: &str) -> Result<(), StoreError> {
        self.sadd(category, id.to_string());
        Ok(())
    }

    async fn add_record(&self, record: &ProductRecord) -> Result<(), StoreError> {
        let json = encode(record)?;
        self.sadd(&record.id, json);
        Ok(())
    }

    async fn seed_urls(&self, key: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.members(key))
    }

    async fn add_seed_url(&self, key: &str, url: &str) -> Result<bool, StoreError> {
        Ok(self.sadd(key, url.to_string()))
    }

    async fn category_members(&self, category: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.members(category))
    }

    async fn records(&self, id: &str) -> Result<Vec<ProductRecord>, StoreError> {
        Ok(decode_members(id, self.members(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(id: &str) -> ProductRecord {
        ProductRecord {
            id: id.to_string(),
            part_number: format!("PN-{}", id),
            category: "widgets".to_string(),
            manufacturer: "Acme".to_string(),
            price: "$1.00".to_string(),
        }
    }

    /// Store whose category writes always fail.
    struct BrokenIndexStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl RecordStore for BrokenIndexStore {
        async fn add_to_category(&self, _category: &str, _id: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("index offline".to_string()))
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
    async fn test_persist_writes_index_and_value() {
        let store = MemoryStore::new();
        let metrics = CrawlMetrics::new();

        assert!(persist_record(&store, &widget("A1"), &metrics).await);

        assert_eq!(store.category_members("widgets").await.unwrap(), vec!["A1"]);
        assert_eq!(store.records("A1").await.unwrap(), vec![widget("A1")]);
        assert_eq!(metrics.records_written.get(), 1);
    }

    #[tokio::test]
    async fn test_persist_twice_is_idempotent() {
        let store = MemoryStore::new();
        let metrics = CrawlMetrics::new();

        persist_record(&store, &widget("A1"), &metrics).await;
        let keys_once = store.key_count();
        let index_once = store.members("widgets");
        let value_once = store.members("A1");

        persist_record(&store, &widget("A1"), &metrics).await;
        assert_eq!(store.key_count(), keys_once);
        assert_eq!(store.members("widgets"), index_once);
        assert_eq!(store.members("A1"), value_once);
    }

    #[tokio::test]
    async fn test_persist_skips_empty_id() {
        let store = MemoryStore::new();
        let metrics = CrawlMetrics::new();

        let record = ProductRecord {
            category: "widgets".to_string(),
            ..Default::default()
        };
        assert!(!persist_record(&store, &record, &metrics).await);
        assert_eq!(store.key_count(), 0);
        assert_eq!(metrics.records_skipped.get(), 1);
    }

    #[tokio::test]
    async fn test_failed_index_write_still_writes_value() {
        let store = BrokenIndexStore { inner: MemoryStore::new() };
        let metrics = CrawlMetrics::new();

        assert!(!persist_record(&store, &widget("A1"), &metrics).await);
        assert_eq!(store.inner.members("A1").len(), 1);
        assert!(store.inner.members("widgets").is_empty());
        assert_eq!(metrics.store_write_failures.get(), 1);
        assert_eq!(metrics.records_written.get(), 0);
    }

    #[tokio::test]
    async fn test_seed_set() {
        let store = MemoryStore::new();
        assert!(store.add_seed_url("itemURL", "https://shop.test/a").await.unwrap());
        assert!(!store.add_seed_url("itemURL", "https://shop.test/a").await.unwrap());
        assert!(store.add_seed_url("itemURL", "https://shop.test/b").await.unwrap());
        assert_eq!(store.seed_urls("itemURL").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_records_skips_foreign_members() {
        let store = MemoryStore::new();
        store.add_record(&widget("A1")).await.unwrap();
        store.add_to_category("A1", "not json").await.unwrap();
        assert_eq!(store.records("A1").await.unwrap(), vec![widget("A1")]);
    }

    #[tokio::test]
    async fn test_redis_store_roundtrip() {
        // Skip test if Redis is not available
        let store = match RedisStore::connect("redis://127.0.0.1:6379").await {
            Ok(s) => s,
            Err(_) => {
                println!("Redis not available, skipping test");
                return;
            }
        };

        let record = ProductRecord {
            id: "catalog-crawler-test-id".to_string(),
            category: "catalog-crawler-test-category".to_string(),
            ..Default::default()
        };

        let metrics = CrawlMetrics::new();
        if !persist_record(&store, &record, &metrics).await {
            println!("Redis rejected writes, skipping test");
            return;
        }
        persist_record(&store, &record, &metrics).await;

        assert_eq!(
            store.category_members(&record.category).await.unwrap(),
            vec![record.id.clone()]
        );
        assert_eq!(store.records(&record.id).await.unwrap(), vec![record.clone()]);

        // Cleanup
        let mut conn = store.conn();
        let _: () = conn
            .del(vec![record.id.clone(), record.category.clone()])
            .await
            .unwrap();
    }
}
