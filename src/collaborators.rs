// =============================================================================
// collaborators.rs — THE THREE PHONE LINES TO THE REST OF THE COMPANY
// =============================================================================
//
// The engine talks to exactly three external parties:
//
//   - the Website Registry, which turns an integration key into a website
//     and tells us whether the account is still paying us
//   - the Product Catalog, which hands over the affiliate products an
//     account is allowed to promote
//   - the Record Store, which keeps one analysis row per (website, hash)
//
// All three are traits injected into the handler. There is no module-level
// client, no global connection, no ambient anything — the pure pipeline
// stays pure, and tests swap in the in-memory fakes below without a
// single running service.
// =============================================================================

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::models::{AnalysisResult, ProductCandidate, Website};

/// Resolves integration keys. Backed by Redis in production
/// ([`crate::registry::RedisWebsiteRegistry`]).
#[async_trait]
pub trait WebsiteRegistry: Send + Sync {
    /// `Ok(None)` means "no such key" — an auth outcome, not an error.
    /// `Err` means the registry itself couldn't answer.
    async fn resolve(&self, integration_key: &str) -> Result<Option<Website>>;
}

/// Serves candidate products scoped to an account. Backed by the
/// dashboard's internal HTTP API in production ([`crate::catalog::HttpProductCatalog`]).
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn candidates_for_account(&self, account_id: &str) -> Result<Vec<ProductCandidate>>;
}

/// Persists and reads back analysis rows. Backed by Redis in production
/// ([`crate::record_store::RedisRecordStore`]).
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find(&self, website_id: &str, content_hash: &str) -> Result<Option<AnalysisResult>>;
    async fn insert(&self, record: &AnalysisResult) -> Result<()>;
}

// =============================================================================
// In-memory fakes
// =============================================================================
// Used by the handler tests and by anyone running the engine on a laptop
// without a Redis or a dashboard monolith nearby.
// =============================================================================

#[derive(Default)]
pub struct MemoryRegistry {
    websites: RwLock<HashMap<String, Website>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, integration_key: &str, website: Website) {
        self.websites
            .write()
            .insert(integration_key.to_string(), website);
    }
}

#[async_trait]
impl WebsiteRegistry for MemoryRegistry {
    async fn resolve(&self, integration_key: &str) -> Result<Option<Website>> {
        Ok(self.websites.read().get(integration_key).cloned())
    }
}

#[derive(Default)]
pub struct MemoryCatalog {
    products: RwLock<HashMap<String, Vec<ProductCandidate>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stock(&self, account_id: &str, products: Vec<ProductCandidate>) {
        self.products
            .write()
            .insert(account_id.to_string(), products);
    }
}

#[async_trait]
impl ProductCatalog for MemoryCatalog {
    async fn candidates_for_account(&self, account_id: &str) -> Result<Vec<ProductCandidate>> {
        Ok(self
            .products
            .read()
            .get(account_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MemoryRecordStore {
    rows: RwLock<HashMap<String, AnalysisResult>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.read().len()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find(&self, website_id: &str, content_hash: &str) -> Result<Option<AnalysisResult>> {
        let key = format!("{website_id}:{content_hash}");
        Ok(self.rows.read().get(&key).cloned())
    }

    async fn insert(&self, record: &AnalysisResult) -> Result<()> {
        self.rows
            .write()
            .insert(record.dedup_key(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;
    use crate::models::WebsiteStatus;

    #[tokio::test]
    async fn test_memory_registry_round_trip() {
        let registry = MemoryRegistry::new();
        registry.register(
            "key_abc",
            Website {
                id: "site_1".into(),
                account_id: "acct_1".into(),
                status: WebsiteStatus::Active,
            },
        );
        let site = registry.resolve("key_abc").await.unwrap().unwrap();
        assert_eq!(site.id, "site_1");
        assert!(registry.resolve("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_is_keyed_by_website_and_hash() {
        let store = MemoryRecordStore::new();
        let record = analyze("t", "some content").into_record("site_1", "https://a.dev");
        store.insert(&record).await.unwrap();
        // Idempotent re-insert of the same page doesn't grow the store.
        store.insert(&record).await.unwrap();
        assert_eq!(store.row_count(), 1);

        let found = store
            .find("site_1", &record.content_hash)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.content_hash, record.content_hash);
        assert!(store.find("site_2", &record.content_hash).await.unwrap().is_none());
    }
}
