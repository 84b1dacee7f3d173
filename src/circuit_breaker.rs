// =============================================================================
// circuit_breaker.rs — THE CATALOG BODYGUARD
// =============================================================================
//
// The Product Catalog lives in the dashboard monolith, and the dashboard
// monolith has opinions about uptime. When it starts failing, hammering
// it with a catalog fetch per page view helps nobody — recommendations
// are optional garnish, and the analysis row ships either way.
//
// So: a classic three-state breaker. Closed means requests flow. After
// enough consecutive failures it opens and every catalog call is skipped
// on the spot (the handler degrades to an empty recommendation list).
// After a cooldown, one probe request goes through half-open; enough
// probe successes close it again, one probe failure slams it back open.
// =============================================================================

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum CircuitState {
    /// Requests flow freely.
    Closed,
    /// Tripped. Catalog calls are skipped until the cooldown passes.
    Open,
    /// Cooldown elapsed; probe traffic allowed through.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure_time: Option<Instant>,
    total_trips: u64,
}

/// Thread-safe breaker guarding one flaky collaborator.
/// Clones share the same underlying state — a handle held by the
/// metrics server observes the same breaker the catalog client trips.
#[derive(Clone)]
pub struct CircuitBreaker {
    /// Which collaborator this breaker protects, for the logs.
    name: String,
    inner: Arc<RwLock<BreakerInner>>,
    failure_threshold: u32,
    reset_timeout: Duration,
    success_threshold: u32,
}

impl CircuitBreaker {
    pub fn new(
        name: impl Into<String>,
        failure_threshold: u32,
        reset_timeout: Duration,
        success_threshold: u32,
    ) -> Self {
        let name = name.into();
        info!(
            name = %name,
            failure_threshold = failure_threshold,
            reset_timeout_secs = reset_timeout.as_secs(),
            success_threshold = success_threshold,
            "circuit breaker armed"
        );

        Self {
            name,
            inner: Arc::new(RwLock::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                last_failure_time: None,
                total_trips: 0,
            })),
            failure_threshold,
            reset_timeout,
            success_threshold,
        }
    }

    /// Whether a request may proceed right now. An Open breaker whose
    /// cooldown has elapsed transitions to HalfOpen and lets the probe
    /// through.
    pub fn allow_request(&self) -> bool {
        let mut inner = self.inner.write();

        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let Some(last_failure) = inner.last_failure_time else {
                    // Open without a recorded failure shouldn't happen;
                    // let the request through rather than wedge forever.
                    return true;
                };
                if last_failure.elapsed() >= self.reset_timeout {
                    info!(name = %self.name, "breaker OPEN -> HALF_OPEN — probing the catalog");
                    inner.state = CircuitState::HalfOpen;
                    inner.success_count = 0;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.write();

        match inner.state {
            CircuitState::Closed => {
                // A success breaks the consecutive-failure streak.
                inner.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                inner.success_count += 1;
                if inner.success_count >= self.success_threshold {
                    info!(name = %self.name, "breaker HALF_OPEN -> CLOSED — catalog is healthy again");
                    inner.state = CircuitState::Closed;
                    inner.failure_count = 0;
                    inner.success_count = 0;
                }
            }
            CircuitState::Open => {
                warn!(name = %self.name, "success recorded while OPEN — unexpected but welcome");
            }
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.write();

        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                inner.last_failure_time = Some(Instant::now());
                if inner.failure_count >= self.failure_threshold {
                    warn!(
                        name = %self.name,
                        failures = inner.failure_count,
                        "breaker TRIPPED — CLOSED -> OPEN, recommendations degrade to empty"
                    );
                    inner.state = CircuitState::Open;
                    inner.total_trips += 1;
                }
            }
            CircuitState::HalfOpen => {
                warn!(name = %self.name, "probe failed — HALF_OPEN -> OPEN");
                inner.state = CircuitState::Open;
                inner.failure_count = self.failure_threshold;
                inner.last_failure_time = Some(Instant::now());
                inner.total_trips += 1;
            }
            CircuitState::Open => {
                // Extend the cooldown.
                inner.last_failure_time = Some(Instant::now());
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.read().state.clone()
    }

    pub fn total_trips(&self) -> u64 {
        self.inner.read().total_trips
    }

    /// Point-in-time status for the metrics endpoint.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.read();
        BreakerSnapshot {
            name: self.name.clone(),
            state: inner.state.clone(),
            total_trips: inner.total_trips,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub total_trips: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_closed() {
        let cb = CircuitBreaker::new("catalog", 3, Duration::from_secs(5), 2);
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.allow_request());
    }

    #[test]
    fn test_trips_after_threshold_failures() {
        let cb = CircuitBreaker::new("catalog", 3, Duration::from_secs(5), 2);
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow_request());
        assert_eq!(cb.total_trips(), 1);
    }

    #[test]
    fn test_success_resets_failure_streak() {
        let cb = CircuitBreaker::new("catalog", 3, Duration::from_secs(5), 2);
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_snapshot_is_shared_across_clones() {
        let cb = CircuitBreaker::new("catalog", 1, Duration::from_secs(5), 1);
        let observer = cb.clone();
        cb.record_failure();

        let snap = observer.snapshot();
        assert_eq!(snap.name, "catalog");
        assert_eq!(snap.state, CircuitState::Open);
        assert_eq!(snap.total_trips, 1);
    }

    #[test]
    fn test_half_open_probe_cycle() {
        let cb = CircuitBreaker::new("catalog", 1, Duration::from_millis(0), 1);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        // Zero cooldown: next allow_request flips to half-open.
        assert!(cb.allow_request());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }
}
