// =============================================================================
// dedup.rs — THE REPEAT-VISITOR BOUNCER
// =============================================================================
//
// Every page view of the same article should produce exactly one analysis
// row. The Record Store enforces that with its `(website, hash)` key, but
// asking Redis "have we seen this?" on every beacon is a round-trip we can
// usually skip. So: a Bloom filter in front, an LRU cache behind it.
//
//   1. Bloom says "never seen it" — guaranteed true, write the row.
//   2. Bloom says "maybe" — Bloom filters lie (false positives), so the
//      LRU gives the definitive in-memory answer.
//   3. The Bloom filter rotates on an interval so it never saturates into
//      a filter that answers "maybe" to everything.
//
// A Bloom false negative is impossible; an LRU eviction just means one
// redundant idempotent write hits the store. Both failure modes cost
// nothing but electrons.
//
// Is this overkill for deduplicating blog-post page views? YES.
// Could we just use a HashSet? YES.
// Are we going to use a HashSet? ABSOLUTELY NOT.
// =============================================================================

use bloomfilter::Bloom;
use lru::LruCache;
use parking_lot::RwLock;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Thread-safe Bloom + LRU dedup keyed by `AnalysisResult::dedup_key()`.
pub struct DedupEngine {
    bloom: Arc<RwLock<Bloom<String>>>,
    known_rows: Arc<RwLock<LruCache<String, ()>>>,
    last_rotation: Arc<RwLock<Instant>>,
    rotation_interval_secs: u64,
    bloom_expected_items: u64,
    bloom_fp_rate: f64,
    pub stats: Arc<DedupStats>,
}

/// Atomic counters, surfaced through the metrics endpoint.
pub struct DedupStats {
    pub checks: portable_atomic::AtomicU64,
    pub fresh_pages: portable_atomic::AtomicU64,
    pub repeat_pages: portable_atomic::AtomicU64,
    pub rotations: portable_atomic::AtomicU64,
    /// Times the Bloom filter said "maybe" and the LRU overruled it.
    pub false_positive_rescues: portable_atomic::AtomicU64,
}

impl DedupStats {
    fn new() -> Self {
        Self {
            checks: portable_atomic::AtomicU64::new(0),
            fresh_pages: portable_atomic::AtomicU64::new(0),
            repeat_pages: portable_atomic::AtomicU64::new(0),
            rotations: portable_atomic::AtomicU64::new(0),
            false_positive_rescues: portable_atomic::AtomicU64::new(0),
        }
    }
}

impl DedupEngine {
    /// `expected_items` and `fp_rate` size the Bloom filter;
    /// `lru_capacity` bounds the definitive cache;
    /// `rotation_interval_secs` is how often the Bloom filter is replaced
    /// with a fresh empty one.
    pub fn new(
        expected_items: u64,
        fp_rate: f64,
        lru_capacity: usize,
        rotation_interval_secs: u64,
    ) -> Self {
        info!(
            expected_items = expected_items,
            fp_rate = fp_rate,
            lru_capacity = lru_capacity,
            rotation_secs = rotation_interval_secs,
            "dedup engine online — every page gets analyzed exactly once"
        );

        let bloom = Bloom::new_for_fp_rate(expected_items as usize, fp_rate);
        let lru_size = NonZeroUsize::new(lru_capacity).unwrap_or(NonZeroUsize::new(1000).unwrap());

        Self {
            bloom: Arc::new(RwLock::new(bloom)),
            known_rows: Arc::new(RwLock::new(LruCache::new(lru_size))),
            last_rotation: Arc::new(RwLock::new(Instant::now())),
            rotation_interval_secs,
            bloom_expected_items: expected_items,
            bloom_fp_rate: fp_rate,
            stats: Arc::new(DedupStats::new()),
        }
    }

    /// Returns `true` if this `(website, content hash)` key is new and was
    /// recorded; `false` if we've already analyzed this exact page for
    /// this website.
    pub fn check_and_insert(&self, key: &str) -> bool {
        use portable_atomic::Ordering;

        self.stats.checks.fetch_add(1, Ordering::Relaxed);
        self.maybe_rotate();

        let bloom_maybe_seen = {
            let bloom = self.bloom.read();
            bloom.check(&key.to_string())
        };

        if bloom_maybe_seen {
            let mut known = self.known_rows.write();
            if known.get(&key.to_string()).is_some() {
                self.stats.repeat_pages.fetch_add(1, Ordering::Relaxed);
                debug!(key = key, "repeat page — analysis row already exists");
                return false;
            }

            self.stats
                .false_positive_rescues
                .fetch_add(1, Ordering::Relaxed);
            debug!(key = key, "bloom false positive rescued by LRU — page is actually new");
        }

        {
            let mut bloom = self.bloom.write();
            bloom.set(&key.to_string());
        }
        {
            let mut known = self.known_rows.write();
            known.put(key.to_string(), ());
        }

        self.stats.fresh_pages.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Swap in a fresh Bloom filter when the rotation interval has
    /// elapsed. The LRU is never rotated — it self-evicts.
    fn maybe_rotate(&self) {
        let due = {
            let last = self.last_rotation.read();
            last.elapsed().as_secs() >= self.rotation_interval_secs
        };
        if !due {
            return;
        }

        let mut bloom = self.bloom.write();
        let mut last = self.last_rotation.write();

        // Re-check under the write lock — another request may have
        // rotated while we waited.
        if last.elapsed().as_secs() >= self.rotation_interval_secs {
            *bloom = Bloom::new_for_fp_rate(self.bloom_expected_items as usize, self.bloom_fp_rate);
            *last = Instant::now();
            self.stats
                .rotations
                .fetch_add(1, portable_atomic::Ordering::Relaxed);
            info!("bloom filter rotated — stale page fingerprints forgotten");
        }
    }

    pub fn snapshot(&self) -> DedupSnapshot {
        use portable_atomic::Ordering;
        DedupSnapshot {
            total_checks: self.stats.checks.load(Ordering::Relaxed),
            fresh_pages: self.stats.fresh_pages.load(Ordering::Relaxed),
            repeat_pages: self.stats.repeat_pages.load(Ordering::Relaxed),
            bloom_rotations: self.stats.rotations.load(Ordering::Relaxed),
            bloom_false_positive_rescues: self.stats.false_positive_rescues.load(Ordering::Relaxed),
            lru_cache_size: self.known_rows.read().len(),
        }
    }
}

/// Point-in-time dedup stats for the metrics endpoint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DedupSnapshot {
    pub total_checks: u64,
    pub fresh_pages: u64,
    pub repeat_pages: u64,
    pub bloom_rotations: u64,
    pub bloom_false_positive_rescues: u64,
    pub lru_cache_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_page_is_accepted() {
        let engine = DedupEngine::new(1000, 0.01, 100, 3600);
        assert!(engine.check_and_insert("site_1:k3j2a9"));
    }

    #[test]
    fn test_repeat_page_is_rejected() {
        let engine = DedupEngine::new(1000, 0.01, 100, 3600);
        assert!(engine.check_and_insert("site_1:k3j2a9"));
        assert!(!engine.check_and_insert("site_1:k3j2a9"));
    }

    #[test]
    fn test_same_hash_different_website_is_fresh() {
        let engine = DedupEngine::new(1000, 0.01, 100, 3600);
        assert!(engine.check_and_insert("site_1:k3j2a9"));
        assert!(engine.check_and_insert("site_2:k3j2a9"));
    }

    #[test]
    fn test_snapshot_counts() {
        let engine = DedupEngine::new(1000, 0.01, 100, 3600);
        engine.check_and_insert("a:1");
        engine.check_and_insert("a:1");
        engine.check_and_insert("b:2");
        let snap = engine.snapshot();
        assert_eq!(snap.total_checks, 3);
        assert_eq!(snap.fresh_pages, 2);
        assert_eq!(snap.repeat_pages, 1);
    }
}
