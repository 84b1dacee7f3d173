// =============================================================================
// handler.rs — THE INTAKE BOUNDARY
// =============================================================================
//
// Everything impure about a page view happens here, in a fixed order:
//
//   1. Validate — no integration key or no content, no service.
//   2. Authenticate — the registry must resolve the key to an ACTIVE site.
//   3. Analyze — the pure pipeline, which cannot fail, only disappoint.
//   4. Persist + recommend — concurrently, because neither waits for the
//      other. The write is load-bearing: if the Record Store refuses the
//      row, the whole request fails. The catalog is garnish: if it's down,
//      slow, or on fire, the response ships with zero recommendations and
//      nobody pages anyone.
//
// The dedup engine fronts the store, and the store is the final arbiter:
// when the Bloom+LRU layer claims we've seen a page, we read the existing
// row back instead of trusting a probabilistic data structure with a
// customer-visible answer.
// =============================================================================

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

use crate::analyzer;
use crate::collaborators::{ProductCatalog, RecordStore, WebsiteRegistry};
use crate::dedup::DedupEngine;
use crate::error::IntakeError;
use crate::metrics::MetricsCollector;
use crate::models::{
    AnalysisResult, IntakeResponse, PageViewRequest, RankedRecommendation, Website, WebsiteStatus,
};
use crate::recommender;

pub struct IntakeHandler {
    registry: Arc<dyn WebsiteRegistry>,
    catalog: Arc<dyn ProductCatalog>,
    store: Arc<dyn RecordStore>,
    dedup: Arc<DedupEngine>,
    metrics: Arc<MetricsCollector>,
    collaborator_timeout: Duration,
}

impl IntakeHandler {
    pub fn new(
        registry: Arc<dyn WebsiteRegistry>,
        catalog: Arc<dyn ProductCatalog>,
        store: Arc<dyn RecordStore>,
        dedup: Arc<DedupEngine>,
        metrics: Arc<MetricsCollector>,
        collaborator_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            catalog,
            store,
            dedup,
            metrics,
            collaborator_timeout,
        }
    }

    /// Process one page-view beacon end to end.
    pub async fn handle(&self, request: PageViewRequest) -> Result<IntakeResponse, IntakeError> {
        self.metrics.page_received();

        self.validate(&request)?;
        let website = self.authenticate(&request.integration_key).await?;

        // The pure pipeline. Same strings in, same analysis out, forever.
        let analysis = analyzer::analyze(&request.title, &request.content);
        let record = analysis.into_record(&website.id, &request.url);

        // Persistence and recommendations are independent deliverables —
        // run them concurrently and let each fail on its own terms.
        let (persisted, recommendations) = tokio::join!(
            self.persist(&record),
            self.fetch_recommendations(&website, &record),
        );
        let record = persisted?;

        self.metrics.page_analyzed();
        self.metrics.recommendations_served(recommendations.len());
        if record.has_high_intent() {
            self.metrics.popup_triggered();
        }

        info!(
            website = %record.website_id,
            hash = %record.content_hash,
            category = %record.category,
            intent = format!("{:.2}", record.buying_intent_score),
            recommendations = recommendations.len(),
            "page view processed"
        );

        Ok(IntakeResponse::new(record, recommendations))
    }

    fn validate(&self, request: &PageViewRequest) -> Result<(), IntakeError> {
        let missing = match (
            request.integration_key.is_empty(),
            request.content.is_empty(),
        ) {
            (true, true) => Some("integrationKey, content"),
            (true, false) => Some("integrationKey"),
            (false, true) => Some("content"),
            (false, false) => None,
        };

        if let Some(fields) = missing {
            self.metrics.validation_rejected();
            debug!(fields = fields, "beacon rejected — missing parameters");
            return Err(IntakeError::MissingParameters(fields));
        }
        Ok(())
    }

    /// Resolve the integration key to an active website or bust. A
    /// registry that errors or times out is indistinguishable from an
    /// unknown key as far as the caller is concerned — detail goes to
    /// the logs, a 401 goes to the wire.
    async fn authenticate(&self, integration_key: &str) -> Result<Website, IntakeError> {
        let resolved = self
            .bounded(self.registry.resolve(integration_key))
            .await;

        let website = match resolved {
            Ok(Some(website)) => website,
            Ok(None) => {
                self.metrics.auth_rejected();
                debug!("unknown integration key");
                return Err(IntakeError::Unauthorized);
            }
            Err(e) => {
                self.metrics.auth_rejected();
                warn!(error = %e, "registry lookup failed — rejecting as unauthorized");
                return Err(IntakeError::Unauthorized);
            }
        };

        if website.status != WebsiteStatus::Active {
            self.metrics.auth_rejected();
            debug!(website = %website.id, "inactive website");
            return Err(IntakeError::Unauthorized);
        }

        Ok(website)
    }

    /// Write the analysis row unless it already exists. Returns the row
    /// that is actually in the store — the fresh one we just wrote, or
    /// the existing one a previous page view left behind.
    async fn persist(&self, record: &AnalysisResult) -> Result<AnalysisResult, IntakeError> {
        let key = record.dedup_key();

        if !self.dedup.check_and_insert(&key) {
            // The Bloom+LRU layer says repeat. It's probably right, but
            // "probably" doesn't persist rows — ask the store.
            match self
                .bounded(self.store.find(&record.website_id, &record.content_hash))
                .await
            {
                Ok(Some(existing)) => {
                    self.metrics.duplicate_page();
                    debug!(key = %key, "repeat page — returning existing analysis row");
                    return Ok(existing);
                }
                Ok(None) => {
                    debug!(key = %key, "dedup layer overruled — store has no row, writing");
                }
                Err(e) => {
                    // Can't confirm the duplicate; fall through and write.
                    // The write is idempotent, so the worst case is a no-op.
                    warn!(error = %e, "dedup read-back failed — writing anyway");
                }
            }
        }

        match self.bounded(self.store.insert(record)).await {
            Ok(()) => {
                self.metrics.record_persisted();
                Ok(record.clone())
            }
            Err(e) => {
                self.metrics.store_failure();
                warn!(error = %e, key = %key, "record store write failed");
                Err(IntakeError::Store(e))
            }
        }
    }

    /// Fetch and rank catalog candidates. Every failure mode — error,
    /// timeout, open breaker — collapses to an empty list, logged and
    /// counted but never fatal.
    async fn fetch_recommendations(
        &self,
        website: &Website,
        record: &AnalysisResult,
    ) -> Vec<RankedRecommendation> {
        let candidates = match self
            .bounded(self.catalog.candidates_for_account(&website.account_id))
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                self.metrics.catalog_failure();
                warn!(
                    error = %e,
                    account = %website.account_id,
                    "catalog unavailable — degrading to empty recommendations"
                );
                return Vec::new();
            }
        };

        recommender::recommend(&record.keywords, &record.category, &candidates)
    }

    /// Apply the collaborator timeout to a fallible future.
    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.collaborator_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(anyhow!(
                "collaborator call exceeded {:?}",
                self.collaborator_timeout
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{MemoryCatalog, MemoryRecordStore, MemoryRegistry};
    use crate::models::ProductCandidate;
    use async_trait::async_trait;

    const INTENT_HEAVY_CONTENT: &str =
        "Buy the best budget laptop deal. Compare prices, read our review, \
         and purchase the discount pick for $499 before the deal ends. Buy now.";

    fn active_site(registry: &MemoryRegistry) {
        registry.register(
            "key_live",
            Website {
                id: "site_1".into(),
                account_id: "acct_1".into(),
                status: WebsiteStatus::Active,
            },
        );
    }

    fn request(key: &str, content: &str) -> PageViewRequest {
        PageViewRequest {
            url: "https://blog.example/post".into(),
            title: "Best Laptop Deals".into(),
            content: content.into(),
            integration_key: key.into(),
            user_id: None,
            session_id: None,
        }
    }

    struct Harness {
        registry: Arc<MemoryRegistry>,
        catalog: Arc<MemoryCatalog>,
        store: Arc<MemoryRecordStore>,
        handler: IntakeHandler,
    }

    fn harness() -> Harness {
        let registry = Arc::new(MemoryRegistry::new());
        let catalog = Arc::new(MemoryCatalog::new());
        let store = Arc::new(MemoryRecordStore::new());
        let handler = IntakeHandler::new(
            registry.clone(),
            catalog.clone(),
            store.clone(),
            Arc::new(DedupEngine::new(1000, 0.01, 100, 3600)),
            Arc::new(MetricsCollector::new()),
            Duration::from_secs(5),
        );
        Harness {
            registry,
            catalog,
            store,
            handler,
        }
    }

    #[tokio::test]
    async fn test_missing_content_is_rejected_before_anything_runs() {
        let h = harness();
        active_site(&h.registry);
        let err = h.handler.handle(request("key_live", "")).await.unwrap_err();
        assert!(matches!(err, IntakeError::MissingParameters("content")));
        assert_eq!(h.store.row_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_key_is_rejected() {
        let h = harness();
        let err = h.handler.handle(request("", "some content")).await.unwrap_err();
        assert!(matches!(err, IntakeError::MissingParameters("integrationKey")));
    }

    #[tokio::test]
    async fn test_unknown_key_is_unauthorized() {
        let h = harness();
        let err = h
            .handler
            .handle(request("key_ghost", "some content"))
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::Unauthorized));
        assert_eq!(h.store.row_count(), 0);
    }

    #[tokio::test]
    async fn test_inactive_website_is_unauthorized() {
        let h = harness();
        h.registry.register(
            "key_lapsed",
            Website {
                id: "site_2".into(),
                account_id: "acct_2".into(),
                status: WebsiteStatus::Inactive,
            },
        );
        let err = h
            .handler
            .handle(request("key_lapsed", "some content"))
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::Unauthorized));
    }

    #[tokio::test]
    async fn test_happy_path_persists_and_recommends() {
        let h = harness();
        active_site(&h.registry);
        h.catalog.stock(
            "acct_1",
            vec![ProductCandidate {
                id: "p1".into(),
                name: "Budget Laptop Stand".into(),
                description: "A stand for your laptop".into(),
                category: "technology".into(),
                commission_rate: 12.0,
            }],
        );

        let response = h
            .handler
            .handle(request("key_live", INTENT_HEAVY_CONTENT))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(h.store.row_count(), 1);
        assert_eq!(response.recommendations.len(), 1);
        assert!(response.recommendations.len() <= 5);
        assert_eq!(
            response.should_create_popup,
            response.analysis.buying_intent_score > 0.6
        );
    }

    #[tokio::test]
    async fn test_repeat_page_returns_existing_row() {
        let h = harness();
        active_site(&h.registry);

        let first = h
            .handler
            .handle(request("key_live", INTENT_HEAVY_CONTENT))
            .await
            .unwrap();
        let second = h
            .handler
            .handle(request("key_live", INTENT_HEAVY_CONTENT))
            .await
            .unwrap();

        assert_eq!(h.store.row_count(), 1);
        // Same stored row both times — down to the row id.
        assert_eq!(first.analysis.id, second.analysis.id);
        assert_eq!(first.analysis.content_hash, second.analysis.content_hash);
    }

    struct ExplodingCatalog;

    #[async_trait]
    impl ProductCatalog for ExplodingCatalog {
        async fn candidates_for_account(&self, _: &str) -> Result<Vec<ProductCandidate>> {
            Err(anyhow!("catalog is on fire"))
        }
    }

    #[tokio::test]
    async fn test_catalog_failure_degrades_to_empty_recommendations() {
        let registry = Arc::new(MemoryRegistry::new());
        active_site(&registry);
        let store = Arc::new(MemoryRecordStore::new());
        let handler = IntakeHandler::new(
            registry,
            Arc::new(ExplodingCatalog),
            store.clone(),
            Arc::new(DedupEngine::new(1000, 0.01, 100, 3600)),
            Arc::new(MetricsCollector::new()),
            Duration::from_secs(5),
        );

        let response = handler
            .handle(request("key_live", INTENT_HEAVY_CONTENT))
            .await
            .unwrap();

        // The analysis still shipped and persisted; only the garnish is gone.
        assert!(response.success);
        assert!(response.recommendations.is_empty());
        assert_eq!(store.row_count(), 1);
    }

    struct GlacialRegistry;

    #[async_trait]
    impl WebsiteRegistry for GlacialRegistry {
        async fn resolve(&self, _: &str) -> Result<Option<Website>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Some(Website {
                id: "site_1".into(),
                account_id: "acct_1".into(),
                status: WebsiteStatus::Active,
            }))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_registry_times_out_as_unauthorized() {
        let handler = IntakeHandler::new(
            Arc::new(GlacialRegistry),
            Arc::new(MemoryCatalog::new()),
            Arc::new(MemoryRecordStore::new()),
            Arc::new(DedupEngine::new(1000, 0.01, 100, 3600)),
            Arc::new(MetricsCollector::new()),
            Duration::from_secs(5),
        );

        // The registry would answer after an hour; the five-second
        // collaborator timeout turns that into a plain auth rejection.
        let err = handler
            .handle(request("key_live", INTENT_HEAVY_CONTENT))
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::Unauthorized));
    }

    struct GlacialCatalog;

    #[async_trait]
    impl ProductCatalog for GlacialCatalog {
        async fn candidates_for_account(&self, _: &str) -> Result<Vec<ProductCandidate>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![ProductCandidate {
                id: "p1".into(),
                name: "Budget Laptop Stand".into(),
                description: "A stand for your laptop".into(),
                category: "technology".into(),
                commission_rate: 12.0,
            }])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_catalog_times_out_to_empty_recommendations() {
        let registry = Arc::new(MemoryRegistry::new());
        active_site(&registry);
        let store = Arc::new(MemoryRecordStore::new());
        let handler = IntakeHandler::new(
            registry,
            Arc::new(GlacialCatalog),
            store.clone(),
            Arc::new(DedupEngine::new(1000, 0.01, 100, 3600)),
            Arc::new(MetricsCollector::new()),
            Duration::from_secs(5),
        );

        let response = handler
            .handle(request("key_live", INTENT_HEAVY_CONTENT))
            .await
            .unwrap();

        // Same degradation as a hard catalog error: the row lands, the
        // recommendations don't.
        assert!(response.success);
        assert!(response.recommendations.is_empty());
        assert_eq!(store.row_count(), 1);
    }

    struct ExplodingStore;

    #[async_trait]
    impl RecordStore for ExplodingStore {
        async fn find(&self, _: &str, _: &str) -> Result<Option<AnalysisResult>> {
            Err(anyhow!("store is on fire"))
        }
        async fn insert(&self, _: &AnalysisResult) -> Result<()> {
            Err(anyhow!("store is on fire"))
        }
    }

    #[tokio::test]
    async fn test_store_failure_fails_the_whole_request() {
        let registry = Arc::new(MemoryRegistry::new());
        active_site(&registry);
        let handler = IntakeHandler::new(
            registry,
            Arc::new(MemoryCatalog::new()),
            Arc::new(ExplodingStore),
            Arc::new(DedupEngine::new(1000, 0.01, 100, 3600)),
            Arc::new(MetricsCollector::new()),
            Duration::from_secs(5),
        );

        let err = handler
            .handle(request("key_live", INTENT_HEAVY_CONTENT))
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::Store(_)));
    }
}
