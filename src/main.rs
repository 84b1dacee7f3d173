//  █████╗ ███████╗███████╗██╗██╗     ██╗ █████╗ ████████╗███████╗
// ██╔══██╗██╔════╝██╔════╝██║██║     ██║██╔══██╗╚══██╔══╝██╔════╝
// ███████║█████╗  █████╗  ██║██║     ██║███████║   ██║   █████╗
// ██╔══██║██╔══╝  ██╔══╝  ██║██║     ██║██╔══██║   ██║   ██╔══╝
// ██║  ██║██║     ██║     ██║███████╗██║██║  ██║   ██║   ███████╗
// ╚═╝  ╚═╝╚═╝     ╚═╝     ╚═╝╚══════╝╚═╝╚═╝  ╚═╝   ╚═╝   ╚══════╝
//
// ██╗███╗   ██╗████████╗███████╗██╗
// ██║████╗  ██║╚══██╔══╝██╔════╝██║
// ██║██╔██╗ ██║   ██║   █████╗  ██║
// ██║██║╚██╗██║   ██║   ██╔══╝  ██║
// ██║██║ ╚████║   ██║   ███████╗███████╗
// ╚═╝╚═╝  ╚═══╝   ╚═╝   ╚══════╝╚══════╝
//
// E N G I N E
//
// The most overkill blog-post analyzer ever conceived.
// Rust + Tokio + Rayon + Bloom Filters + SIMD + Circuit Breakers
// All to decide whether someone reading "best laptop 2024" wants a laptop.

mod analysis;
mod analyzer;
mod catalog;
mod circuit_breaker;
mod collaborators;
mod config;
mod dedup;
mod error;
mod handler;
mod intake;
mod metrics;
mod models;
mod record_store;
mod recommender;
mod registry;

use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{self, fmt, EnvFilter};

use crate::catalog::HttpProductCatalog;
use crate::config::Config;
use crate::dedup::DedupEngine;
use crate::handler::IntakeHandler;
use crate::metrics::MetricsCollector;
use crate::record_store::RedisRecordStore;
use crate::registry::RedisWebsiteRegistry;

fn print_banner() {
    let banner = r#"

    ╔══════════════════════════════════════════════════════════════════╗
    ║                                                                  ║
    ║    █████╗ ███████╗███████╗██╗██╗     ██╗ █████╗ ████████╗███████╗║
    ║   ██╔══██╗██╔════╝██╔════╝██║██║     ██║██╔══██╗╚══██╔══╝██╔════╝║
    ║   ███████║█████╗  █████╗  ██║██║     ██║███████║   ██║   █████╗  ║
    ║   ██╔══██║██╔══╝  ██╔══╝  ██║██║     ██║██╔══██║   ██║   ██╔══╝  ║
    ║   ██║  ██║██║     ██║     ██║███████╗██║██║  ██║   ██║   ███████╗║
    ║   ╚═╝  ╚═╝╚═╝     ╚═╝     ╚═╝╚══════╝╚═╝╚═╝  ╚═╝   ╚═╝   ╚══════╝║
    ║                                                                  ║
    ║          ██╗███╗   ██╗████████╗███████╗██╗                       ║
    ║          ██║████╗  ██║╚══██╔══╝██╔════╝██║                       ║
    ║          ██║██╔██╗ ██║   ██║   █████╗  ██║                       ║
    ║          ██║██║╚██╗██║   ██║   ██╔══╝  ██║                       ║
    ║          ██║██║ ╚████║   ██║   ███████╗███████╗                  ║
    ║          ╚═╝╚═╝  ╚═══╝   ╚═╝   ╚══════╝╚══════╝                  ║
    ║                                                                  ║
    ║        ⚡ AFFILIATE CONTENT INTELLIGENCE ENGINE ⚡               ║
    ║                                                                  ║
    ║   Pipeline:  Keywords | Intent | Category | Sentiment | Quality  ║
    ║   Dedup:     Bloom Filter + LRU Cache Hybrid                     ║
    ║   Speed:     SIMD-Accelerated Aho-Corasick Text Scanning         ║
    ║   Resilience: Circuit Breaker on the Product Catalog             ║
    ║                                                                  ║
    ║   "Every page view is a purchase that hasn't happened yet."      ║
    ║                                                                  ║
    ╚══════════════════════════════════════════════════════════════════╝

    "#;
    println!("{}", banner);
}

#[tokio::main(flavor = "multi_thread", worker_threads = 8)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(true)
        .init();

    print_banner();

    info!("🧠 AFFILIATE INTEL ENGINE initializing...");

    // Load configuration
    let config = Config::from_env();
    info!("✅ Configuration loaded: redis_url={}", config.redis_url);

    // Deduplication engine: Bloom filter + LRU cache
    let dedup_engine = Arc::new(DedupEngine::new(
        config.bloom_expected_items,
        config.bloom_false_positive_rate,
        config.lru_cache_size,
        config.bloom_rotation_interval.as_secs(),
    ));
    info!("✅ Deduplication engine online");

    // Metrics collector
    let metrics_collector = Arc::new(MetricsCollector::new());
    info!("✅ Metrics collector initialized");

    // ═══════════════════════════════════════════
    // CONNECT COLLABORATORS
    // ═══════════════════════════════════════════

    let registry = Arc::new(RedisWebsiteRegistry::connect(&config).await?);
    info!("✅ Website registry connected");

    let record_store = Arc::new(RedisRecordStore::connect(&config).await?);
    info!("✅ Record store connected");

    let product_catalog = Arc::new(HttpProductCatalog::new(&config)?);
    let catalog_breaker = product_catalog.breaker();
    info!("✅ Product catalog client ready (breaker armed)");

    let intake_handler = Arc::new(IntakeHandler::new(
        registry,
        product_catalog,
        record_store,
        dedup_engine.clone(),
        metrics_collector.clone(),
        config.collaborator_timeout,
    ));

    // Shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ═══════════════════════════════════════════
    // SPAWN INTAKE HTTP SERVER
    // ═══════════════════════════════════════════
    let intake_port = config.intake_port;
    let intake_metrics = metrics_collector.clone();
    let mut intake_shutdown = shutdown_rx.clone();
    let intake_handle = tokio::spawn(async move {
        info!("📥 Intake server: ONLINE");
        intake::run_intake_server(intake_handler, intake_metrics, intake_port, &mut intake_shutdown)
            .await;
        info!("📥 Intake server: OFFLINE");
    });

    // ═══════════════════════════════════════════
    // SPAWN METRICS HTTP SERVER
    // ═══════════════════════════════════════════
    let metrics_port = config.metrics_port;
    let metrics_for_server = metrics_collector.clone();
    let dedup_for_server = dedup_engine.clone();
    let mut metrics_shutdown = shutdown_rx.clone();
    let metrics_handle = tokio::spawn(async move {
        info!("📊 Metrics server starting on port {metrics_port}...");
        metrics::run_metrics_server(
            metrics_for_server,
            dedup_for_server,
            catalog_breaker,
            metrics_port,
            &mut metrics_shutdown,
        )
        .await;
        info!("📊 Metrics server: OFFLINE");
    });

    info!("═══════════════════════════════════════════════════════");
    info!("  🟢 ALL SYSTEMS ONLINE - AFFILIATE INTEL ENGINE ACTIVE");
    info!("  📥 Intake at http://0.0.0.0:{}/track/pageview", config.intake_port);
    info!("  📦 Catalog at {}", config.catalog_base_url);
    info!("  📊 Metrics at http://0.0.0.0:{}/", config.metrics_port);
    info!("  ⚡ Press Ctrl+C for graceful shutdown");
    info!("═══════════════════════════════════════════════════════");

    // Wait for shutdown signal
    match signal::ctrl_c().await {
        Ok(()) => {
            warn!("🛑 Shutdown signal received!");
            let _ = shutdown_tx.send(true);
        }
        Err(err) => {
            error!("❌ Signal listener error: {}", err);
            let _ = shutdown_tx.send(true);
        }
    }

    info!("⏳ Waiting for tasks to complete (timeout: 10s)...");
    let _ = tokio::time::timeout(std::time::Duration::from_secs(10), async {
        let _ = tokio::join!(intake_handle, metrics_handle);
    })
    .await;

    info!("💤 AFFILIATE INTEL ENGINE: OFFLINE");
    Ok(())
}
