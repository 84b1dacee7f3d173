// =============================================================================
// catalog.rs — THE PRODUCT CATALOG CLIENT (with bodyguard)
// =============================================================================
//
// Candidate products come from the dashboard monolith's internal API:
//
//   GET {base}/accounts/{account_id}/products  ->  [ProductCandidate, ...]
//
// The catalog already scopes results to the account that owns the
// requesting website, so tenancy is its problem, not ours — we take the
// list at face value and rank it.
//
// The whole client sits behind a circuit breaker. Recommendations are
// optional garnish on the analysis, so when the monolith is having a bad
// day we skip the call entirely, return an empty list, and let the
// handler ship the analysis without it.
// =============================================================================

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::collaborators::ProductCatalog;
use crate::config::Config;
use crate::models::ProductCandidate;

pub struct HttpProductCatalog {
    client: reqwest::Client,
    base_url: String,
    breaker: CircuitBreaker,
}

impl HttpProductCatalog {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.collaborator_timeout.max(Duration::from_secs(1)))
            .user_agent("AffiliateIntelEngine/1.0 (content-analysis)")
            .build()
            .context("failed to build catalog HTTP client")?;

        info!(base_url = %config.catalog_base_url, "product catalog client ready");

        Ok(Self {
            client,
            base_url: config.catalog_base_url.trim_end_matches('/').to_string(),
            breaker: CircuitBreaker::new(
                "product-catalog",
                config.circuit_breaker_failure_threshold,
                config.circuit_breaker_reset_timeout,
                config.circuit_breaker_success_threshold,
            ),
        })
    }

    /// Shared handle on the breaker, for the metrics endpoint.
    pub fn breaker(&self) -> CircuitBreaker {
        self.breaker.clone()
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    async fn candidates_for_account(&self, account_id: &str) -> Result<Vec<ProductCandidate>> {
        if !self.breaker.allow_request() {
            // Open breaker: skip the call, ship no recommendations.
            debug!("catalog breaker OPEN — returning empty candidate list");
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/accounts/{}/products",
            self.base_url,
            urlencoding::encode(account_id)
        );

        let response = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                self.breaker.record_failure();
                warn!(error = %e, account = account_id, "catalog request failed");
                return Err(anyhow!(e).context("catalog fetch failed"));
            }
        };

        let status = response.status();
        if !status.is_success() {
            self.breaker.record_failure();
            warn!(status = %status, account = account_id, "catalog returned non-success status");
            return Err(anyhow!("catalog returned HTTP {status}"));
        }

        let candidates: Vec<ProductCandidate> = match response.json().await {
            Ok(c) => c,
            Err(e) => {
                self.breaker.record_failure();
                return Err(anyhow!(e).context("catalog response failed to parse"));
            }
        };

        self.breaker.record_success();
        debug!(
            account = account_id,
            candidates = candidates.len(),
            "catalog fetch complete"
        );
        Ok(candidates)
    }
}
