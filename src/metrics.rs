// ═══════════════════════════════════════════════════════════════
// METRICS COLLECTOR - Because if you can't measure it, it didn't happen
// ═══════════════════════════════════════════════════════════════
//
// Atomic counters for every interesting thing an intake request can do.
// Lock-free because we're THAT paranoid about contention on a counter.
// A tiny HTTP server exposes the lot as JSON so the dashboard can check
// engine health without asking us to install an agent.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{error, info};

use crate::circuit_breaker::CircuitBreaker;
use crate::dedup::DedupEngine;

/// The serialized snapshot served on the metrics port.
#[derive(Debug, Serialize, Clone)]
pub struct MetricsSnapshot {
    pub pages_received: u64,
    pub pages_analyzed: u64,
    pub validation_rejections: u64,
    pub auth_rejections: u64,
    pub duplicate_pages: u64,
    pub records_persisted: u64,
    pub store_failures: u64,
    pub catalog_failures: u64,
    pub recommendations_served: u64,
    pub popups_triggered: u64,
    pub internal_errors: u64,
    pub uptime_seconds: u64,
    pub pages_per_minute: f64,
    pub status: String,
}

/// Thread-safe atomic metrics collector.
/// Every counter is atomic because mutexes are for the weak.
pub struct MetricsCollector {
    pages_received: AtomicU64,
    pages_analyzed: AtomicU64,
    validation_rejections: AtomicU64,
    auth_rejections: AtomicU64,
    duplicate_pages: AtomicU64,
    records_persisted: AtomicU64,
    store_failures: AtomicU64,
    catalog_failures: AtomicU64,
    recommendations_served: AtomicU64,
    popups_triggered: AtomicU64,
    internal_errors: AtomicU64,
    start_time: Instant,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            pages_received: AtomicU64::new(0),
            pages_analyzed: AtomicU64::new(0),
            validation_rejections: AtomicU64::new(0),
            auth_rejections: AtomicU64::new(0),
            duplicate_pages: AtomicU64::new(0),
            records_persisted: AtomicU64::new(0),
            store_failures: AtomicU64::new(0),
            catalog_failures: AtomicU64::new(0),
            recommendations_served: AtomicU64::new(0),
            popups_triggered: AtomicU64::new(0),
            internal_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn page_received(&self) {
        self.pages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn page_analyzed(&self) {
        self.pages_analyzed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn validation_rejected(&self) {
        self.validation_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn auth_rejected(&self) {
        self.auth_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn duplicate_page(&self) {
        self.duplicate_pages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persisted(&self) {
        self.records_persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn catalog_failure(&self) {
        self.catalog_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn recommendations_served(&self, count: usize) {
        self.recommendations_served
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn popup_triggered(&self) {
        self.popups_triggered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn internal_error(&self) {
        self.internal_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Lock-free snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let uptime = self.start_time.elapsed().as_secs();
        let pages_analyzed = self.pages_analyzed.load(Ordering::Relaxed);
        let pages_per_minute = if uptime > 0 {
            (pages_analyzed as f64 / uptime as f64) * 60.0
        } else {
            0.0
        };

        MetricsSnapshot {
            pages_received: self.pages_received.load(Ordering::Relaxed),
            pages_analyzed,
            validation_rejections: self.validation_rejections.load(Ordering::Relaxed),
            auth_rejections: self.auth_rejections.load(Ordering::Relaxed),
            duplicate_pages: self.duplicate_pages.load(Ordering::Relaxed),
            records_persisted: self.records_persisted.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            catalog_failures: self.catalog_failures.load(Ordering::Relaxed),
            recommendations_served: self.recommendations_served.load(Ordering::Relaxed),
            popups_triggered: self.popups_triggered.load(Ordering::Relaxed),
            internal_errors: self.internal_errors.load(Ordering::Relaxed),
            uptime_seconds: uptime,
            pages_per_minute,
            status: "operational".to_string(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a tiny HTTP server that answers every request with the JSON
/// snapshot. This is the Rust equivalent of mounting a turret on a
/// skateboard, and it has never once needed a web framework.
pub async fn run_metrics_server(
    metrics: Arc<MetricsCollector>,
    dedup: Arc<DedupEngine>,
    catalog_breaker: CircuitBreaker,
    port: u16,
    shutdown: &mut watch::Receiver<bool>,
) {
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    let listener = match TcpListener::bind(("0.0.0.0", port)).await {
        Ok(l) => l,
        Err(e) => {
            error!("failed to bind metrics server on :{port}: {e}");
            return;
        }
    };

    info!("metrics server listening on http://0.0.0.0:{port}");

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((mut stream, _addr)) => {
                        let mut snapshot = serde_json::to_value(metrics.snapshot())
                            .unwrap_or_else(|_| serde_json::json!({}));
                        if let Ok(dedup_snap) = serde_json::to_value(dedup.snapshot()) {
                            snapshot["dedup"] = dedup_snap;
                        }
                        if let Ok(breaker_snap) =
                            serde_json::to_value(catalog_breaker.snapshot())
                        {
                            snapshot["catalog_breaker"] = breaker_snap;
                        }
                        let json = serde_json::to_string_pretty(&snapshot)
                            .unwrap_or_else(|_| "{}".to_string());

                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nAccess-Control-Allow-Origin: *\r\nContent-Length: {}\r\n\r\n{}",
                            json.len(),
                            json,
                        );

                        let _ = stream.write_all(response.as_bytes()).await;
                    }
                    Err(e) => {
                        error!("metrics server accept error: {e}");
                    }
                }
            }
            _ = shutdown.changed() => {
                info!("metrics server: shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_reach_the_snapshot() {
        let metrics = MetricsCollector::new();
        metrics.page_received();
        metrics.page_analyzed();
        metrics.recommendations_served(3);
        metrics.popup_triggered();
        metrics.duplicate_page();

        let snap = metrics.snapshot();
        assert_eq!(snap.pages_received, 1);
        assert_eq!(snap.pages_analyzed, 1);
        assert_eq!(snap.recommendations_served, 3);
        assert_eq!(snap.popups_triggered, 1);
        assert_eq!(snap.duplicate_pages, 1);
        assert_eq!(snap.status, "operational");
    }
}
