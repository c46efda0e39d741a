//! Cache metrics for the legend cache
//!
//! Cumulative hit, miss, promotion and demotion counters per resident tier,
//! plus the memory statistics derived from the tier store.

use serde::{Deserialize, Serialize};

use crate::cache::tiers::TierStore;
use crate::legend::StorageTier;

/// One counter per resident tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounters {
    pub hot: u64,
    pub warm: u64,
}

impl TierCounters {
    fn bump(&mut self, tier: StorageTier) {
        match tier {
            StorageTier::Hot => self.hot += 1,
            StorageTier::Warm => self.warm += 1,
            StorageTier::Cold => {}
        }
    }

    pub fn total(&self) -> u64 {
        self.hot + self.warm
    }
}

/// Snapshot of all cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetrics {
    /// Lookups served from a resident tier
    pub hits: TierCounters,
    /// Lookups that had to go to the registry, keyed by the tier loaded into
    pub misses: TierCounters,
    /// Entries that entered a tier from a colder one, keyed by destination
    pub promotions: TierCounters,
    /// Entries that left a tier for a colder one, keyed by source
    pub demotions: TierCounters,
}

/// Memory statistics derived from the tier store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub hot_entries: usize,
    pub warm_entries: usize,
    /// Bytes held by all resident entries
    pub total_bytes: usize,
    /// Configured memory budget
    pub configured_limit_bytes: usize,
    /// Fraction saved by compression against an all-full baseline of the
    /// same resident set
    pub reduction_ratio: f64,
}

/// Accumulates counters for a single cache instance
#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: CacheMetrics,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self, tier: StorageTier) {
        self.metrics.hits.bump(tier);
    }

    pub fn record_miss(&mut self, tier: StorageTier) {
        self.metrics.misses.bump(tier);
    }

    /// Record an entry entering `tier` from a colder tier
    pub fn record_promotion(&mut self, tier: StorageTier) {
        self.metrics.promotions.bump(tier);
    }

    /// Record an entry leaving `tier` for a colder tier
    pub fn record_demotion(&mut self, tier: StorageTier) {
        self.metrics.demotions.bump(tier);
    }

    pub fn snapshot(&self) -> CacheMetrics {
        self.metrics
    }

    /// Cumulative hits / (hits + misses) since construction; 0 before any lookup
    pub fn hit_rate(&self) -> f64 {
        let hits = self.metrics.hits.total();
        let lookups = hits + self.metrics.misses.total();
        if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64
        }
    }

    /// Derive memory statistics from the current store contents
    pub fn memory_stats(&self, store: &TierStore, limit_bytes: usize) -> MemoryStats {
        let total_bytes = store.total_bytes();
        let full_equivalent = store.full_equivalent_bytes();
        let reduction_ratio = if full_equivalent == 0 {
            0.0
        } else {
            (1.0 - total_bytes as f64 / full_equivalent as f64).max(0.0)
        };

        MemoryStats {
            hot_entries: store.count(StorageTier::Hot),
            warm_entries: store.count(StorageTier::Warm),
            total_bytes,
            configured_limit_bytes: limit_bytes,
            reduction_ratio,
        }
    }
}
