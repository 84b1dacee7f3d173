// =============================================================================
// config.rs — THE GRAND CONFIGURATION CATHEDRAL
// =============================================================================
//
// Every system needs configuration, but not every system needs THIS MUCH
// configuration. We have knobs for knobs: Redis key names, a Bloom filter
// sizing section, a circuit breaker tuning section, and two whole ports.
//
// Everything can be overridden via AFF_INTEL_-prefixed environment
// variables, because hardcoding configuration is how you end up on the
// front page of Hacker News for the wrong reasons. Defaults were chosen
// through a rigorous process of "that seems about right."
// =============================================================================

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // REDIS — the shared substrate between us and the dashboard monolith.
    // The dashboard writes websites in; we write analysis rows out.
    // =========================================================================
    /// Redis connection URL. Default: redis://127.0.0.1:6379
    pub redis_url: String,

    /// Hash mapping integration keys to website JSON. The dashboard owns
    /// writes to this hash; we only ever HGET it.
    pub websites_hash_key: String,

    /// Prefix for analysis-row keys. Rows live at
    /// `{prefix}:{website_id}:{content_hash}`.
    pub records_key_prefix: String,

    /// Sorted set indexing row keys by analysis timestamp, so the
    /// dashboard can list "recent analyses" without a key scan.
    pub records_index_key: String,

    // =========================================================================
    // PRODUCT CATALOG — the dashboard's internal HTTP API.
    // =========================================================================
    /// Base URL of the catalog API. Candidate fetches go to
    /// `{base}/accounts/{account_id}/products`.
    pub catalog_base_url: String,

    // =========================================================================
    // COLLABORATOR TIMEOUTS
    // A slow registry is an auth failure; a slow catalog is an empty
    // recommendation list. Neither gets to hold a page view hostage.
    // =========================================================================
    pub collaborator_timeout: Duration,

    // =========================================================================
    // SERVERS
    // =========================================================================
    /// Port for the intake endpoint the embed script beacons to.
    pub intake_port: u16,

    /// Port for the JSON metrics endpoint. 9090, because Prometheus
    /// conventions are conventions.
    pub metrics_port: u16,

    // =========================================================================
    // BLOOM FILTER PARAMETERS
    // For when "probably a repeat page view" is good enough.
    // =========================================================================
    pub bloom_expected_items: u64,
    pub bloom_false_positive_rate: f64,
    pub bloom_rotation_interval: Duration,
    pub lru_cache_size: usize,

    // =========================================================================
    // CIRCUIT BREAKER PARAMETERS
    // Because the dashboard monolith goes down more often than you'd think.
    // =========================================================================
    pub circuit_breaker_failure_threshold: u32,
    pub circuit_breaker_reset_timeout: Duration,
    pub circuit_breaker_success_threshold: u32,
}

impl Config {
    /// Load configuration from the environment with out-of-the-box
    /// defaults. A missing .env file is not an event worth logging.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Config {
            redis_url: env_or_default("AFF_INTEL_REDIS_URL", "redis://127.0.0.1:6379"),
            websites_hash_key: env_or_default("AFF_INTEL_WEBSITES_KEY", "aff_intel:websites"),
            records_key_prefix: env_or_default("AFF_INTEL_RECORDS_PREFIX", "aff_intel:records"),
            records_index_key: env_or_default(
                "AFF_INTEL_RECORDS_INDEX",
                "aff_intel:records:by_time",
            ),

            catalog_base_url: env_or_default(
                "AFF_INTEL_CATALOG_BASE_URL",
                "http://127.0.0.1:3000/internal",
            ),

            collaborator_timeout: Duration::from_secs(
                env_or_default("AFF_INTEL_COLLABORATOR_TIMEOUT_SECS", "5")
                    .parse()
                    .unwrap_or(5),
            ),

            intake_port: env_or_default("AFF_INTEL_INTAKE_PORT", "8080")
                .parse()
                .unwrap_or(8080),
            metrics_port: env_or_default("AFF_INTEL_METRICS_PORT", "9090")
                .parse()
                .unwrap_or(9090),

            bloom_expected_items: env_or_default("AFF_INTEL_BLOOM_ITEMS", "100000")
                .parse()
                .unwrap_or(100_000),
            bloom_false_positive_rate: env_or_default("AFF_INTEL_BLOOM_FP_RATE", "0.01")
                .parse()
                .unwrap_or(0.01),
            bloom_rotation_interval: Duration::from_secs(
                env_or_default("AFF_INTEL_BLOOM_ROTATION_SECS", "3600")
                    .parse()
                    .unwrap_or(3600),
            ),
            lru_cache_size: env_or_default("AFF_INTEL_LRU_CACHE_SIZE", "10000")
                .parse()
                .unwrap_or(10_000),

            circuit_breaker_failure_threshold: env_or_default("AFF_INTEL_CB_FAILURE_THRESHOLD", "5")
                .parse()
                .unwrap_or(5),
            circuit_breaker_reset_timeout: Duration::from_secs(
                env_or_default("AFF_INTEL_CB_RESET_TIMEOUT_SECS", "60")
                    .parse()
                    .unwrap_or(60),
            ),
            circuit_breaker_success_threshold: env_or_default("AFF_INTEL_CB_SUCCESS_THRESHOLD", "2")
                .parse()
                .unwrap_or(2),
        }
    }
}

/// Read an environment variable with a default fallback.
/// Because unwrap_or on env::var is ugly and we have standards.
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
