//! Demotion and promotion policy for the legend cache
//!
//! Implements the Hot → Warm → Cold lifecycle driven by reference gaps,
//! enforces the Hot ceiling and the overall memory budget, and performs the
//! Cold/Warm → Hot promotions requested by lookups.

use std::cmp::Reverse;

use serde::Serialize;

use crate::cache::access::AccessTracker;
use crate::cache::metrics::MetricsCollector;
use crate::cache::tiers::{CacheEntry, TierStore};
use crate::config::{CompressionConfig, Config, TierConfig};
use crate::legend::{self, CharacterId, ColdRecord, Legend, StorageTier};

/// Outcome of one access-pattern sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Unit index the sweep ran for
    pub unit: u64,
    /// Ids compressed from Hot into Warm
    pub demoted_to_warm: Vec<CharacterId>,
    /// Ids evicted from Warm to Cold
    pub evicted: Vec<CharacterId>,
    /// Ids whose access was ignored because it arrived out of order
    pub rejected: Vec<CharacterId>,
}

impl SweepReport {
    /// True when the sweep moved nothing
    pub fn is_quiet(&self) -> bool {
        self.demoted_to_warm.is_empty() && self.evicted.is_empty()
    }
}

/// Decides and performs tier transitions
#[derive(Debug, Clone)]
pub struct EvictionPolicy {
    tiers: TierConfig,
    compression: CompressionConfig,
    limit_bytes: usize,
}

impl EvictionPolicy {
    pub fn new(config: &Config) -> Self {
        Self {
            tiers: config.tiers.clone(),
            compression: config.compression.clone(),
            limit_bytes: config.memory_budget.limit_bytes,
        }
    }

    pub fn compression(&self) -> &CompressionConfig {
        &self.compression
    }

    pub fn limit_bytes(&self) -> usize {
        self.limit_bytes
    }

    /// Sweep resident entries after `unit` has been recorded in the tracker.
    ///
    /// Retention is judged from each entry's `last_access_unit` as it stood
    /// before this unit, so a character referenced again after a long silence
    /// is still demoted for that silence. `accepted` lists the ids whose
    /// access at `unit` was recorded; they get their bookkeeping refreshed
    /// once the sweep is done. `pinned` ids have a registry load in flight
    /// and are left where they are until a later sweep.
    pub fn sweep(
        &self,
        unit: u64,
        accepted: &[CharacterId],
        pinned: &[CharacterId],
        store: &mut TierStore,
        tracker: &AccessTracker,
        metrics: &mut MetricsCollector,
    ) -> SweepReport {
        let mut report = SweepReport {
            unit,
            ..Default::default()
        };
        let shielded: Vec<CharacterId> = accepted.iter().chain(pinned).cloned().collect();

        // Warm first, so an entry moves down at most one tier per sweep
        for id in store.ids(StorageTier::Warm) {
            if pinned.contains(&id) {
                continue;
            }
            let stale = store
                .get(&id)
                .is_some_and(|e| e.gap(unit) > self.tiers.warm_retention_units);
            if stale && self.evict(store, &id, metrics) {
                report.evicted.push(id);
            }
        }

        for id in store.ids(StorageTier::Hot) {
            if pinned.contains(&id) {
                continue;
            }
            let stale = store
                .get(&id)
                .is_some_and(|e| e.gap(unit) > self.tiers.hot_retention_units);
            if stale && self.demote_to_warm(store, &id, metrics) {
                report.demoted_to_warm.push(id);
            }
        }

        while self.hot_over_ceiling(store) {
            let Some(id) = self
                .pick_victim(store, tracker, StorageTier::Hot, unit, &shielded)
                .or_else(|| self.pick_victim(store, tracker, StorageTier::Hot, unit, pinned))
            else {
                break;
            };
            if !self.demote_to_warm(store, &id, metrics) {
                break;
            }
            tracing::debug!(character_id = %id, "Demoted to enforce hot ceiling");
            report.demoted_to_warm.push(id);
        }

        // Characters referenced by this unit are the last to lose fidelity
        while store.total_bytes() > self.limit_bytes {
            if let Some(id) = self.pick_victim(store, tracker, StorageTier::Hot, unit, &shielded) {
                if !self.demote_to_warm(store, &id, metrics) {
                    break;
                }
                tracing::debug!(character_id = %id, "Demoted to enforce memory budget");
                report.demoted_to_warm.push(id);
            } else if let Some(id) = self.pick_victim(store, tracker, StorageTier::Warm, unit, pinned)
            {
                if !self.evict(store, &id, metrics) {
                    break;
                }
                tracing::debug!(character_id = %id, "Evicted to enforce memory budget");
                report.evicted.push(id);
            } else if let Some(id) = self.pick_victim(store, tracker, StorageTier::Hot, unit, pinned) {
                if !self.demote_to_warm(store, &id, metrics) {
                    break;
                }
                tracing::debug!(character_id = %id, "Demoted to enforce memory budget");
                report.demoted_to_warm.push(id);
            } else {
                break;
            }
        }

        for id in accepted {
            if let Some(entry) = store.get_mut(id) {
                entry.last_access_unit = entry.last_access_unit.max(unit);
                entry.access_count_in_window = tracker.frequency(id);
            }
        }

        report
    }

    /// Whether a Warm entry has taken enough hits to move back to Hot unprompted
    pub fn should_promote_warm(&self, entry: &CacheEntry) -> bool {
        entry.tier() == StorageTier::Warm
            && self
                .tiers
                .warm_promotion_hits
                .is_some_and(|threshold| entry.warm_hits >= threshold)
    }

    /// Install a full legend built from `record` into Hot.
    ///
    /// Counts a Hot promotion; the caller accounts the hit or miss.
    pub fn promote_to_hot(
        &self,
        store: &mut TierStore,
        record: &ColdRecord,
        last_access_unit: u64,
        access_count_in_window: usize,
        metrics: &mut MetricsCollector,
    ) -> Legend {
        let full = legend::build_full(record, &self.compression);
        let mut entry = CacheEntry::hot(record.id.clone(), full, last_access_unit);
        entry.access_count_in_window = access_count_in_window;
        let legend = entry.legend().clone();

        let previous = store.put(entry);
        metrics.record_promotion(StorageTier::Hot);
        tracing::debug!(
            character_id = %record.id,
            from = %previous.map_or(StorageTier::Cold, |e| e.tier()),
            "Promoted to hot"
        );
        legend
    }

    /// Install a compressed legend built from `record` into Warm, counting a
    /// Warm promotion.
    ///
    /// Returns false, leaving the store untouched, when the entry would push
    /// resident bytes past the memory budget.
    pub fn admit_warm(
        &self,
        store: &mut TierStore,
        record: &ColdRecord,
        last_access_unit: u64,
        metrics: &mut MetricsCollector,
    ) -> bool {
        let full = legend::build_full(record, &self.compression);
        let full_size = Legend::Full(full.clone()).estimated_size();
        let compressed = legend::compress(&full, &self.compression);
        let entry = CacheEntry::warm(record.id.clone(), compressed, full_size, last_access_unit);

        if store.total_bytes() + entry.size_bytes() > self.limit_bytes {
            return false;
        }

        store.put(entry);
        metrics.record_promotion(StorageTier::Warm);
        tracing::debug!(character_id = %record.id, "Admitted to warm");
        true
    }

    /// Compress a Hot entry into Warm. Returns false if `id` was not Hot.
    fn demote_to_warm(
        &self,
        store: &mut TierStore,
        id: &str,
        metrics: &mut MetricsCollector,
    ) -> bool {
        if store.tier_of(id) != StorageTier::Hot {
            return false;
        }
        let Some(entry) = store.remove(id) else {
            return false;
        };

        let compressed = match entry.legend() {
            Legend::Full(full) => legend::compress(full, &self.compression),
            Legend::Compressed(compressed) => legend::recompress(compressed, &self.compression),
        };
        let mut warm = CacheEntry::warm(
            entry.id.clone(),
            compressed,
            entry.full_size_bytes(),
            entry.last_access_unit,
        );
        warm.access_count_in_window = entry.access_count_in_window;

        tracing::debug!(
            character_id = %id,
            from_bytes = entry.size_bytes(),
            to_bytes = warm.size_bytes(),
            "Demoted hot to warm"
        );
        store.put(warm);
        metrics.record_demotion(StorageTier::Hot);
        true
    }

    /// Drop a Warm entry entirely. Returns false if `id` was not Warm.
    fn evict(&self, store: &mut TierStore, id: &str, metrics: &mut MetricsCollector) -> bool {
        if store.tier_of(id) != StorageTier::Warm {
            return false;
        }
        if store.remove(id).is_none() {
            return false;
        }
        tracing::debug!(character_id = %id, "Evicted warm to cold");
        metrics.record_demotion(StorageTier::Warm);
        true
    }

    fn hot_over_ceiling(&self, store: &TierStore) -> bool {
        let over_entries = self
            .tiers
            .hot_capacity_entries
            .is_some_and(|cap| store.count(StorageTier::Hot) > cap);
        let over_bytes = self
            .tiers
            .hot_capacity_bytes
            .is_some_and(|cap| store.tier_bytes(StorageTier::Hot) > cap);
        over_entries || over_bytes
    }

    /// Entry in `tier` to move down first, skipping `protected`: longest gap,
    /// then lowest frequency, then smallest id.
    fn pick_victim(
        &self,
        store: &TierStore,
        tracker: &AccessTracker,
        tier: StorageTier,
        unit: u64,
        protected: &[CharacterId],
    ) -> Option<CharacterId> {
        store
            .list(tier)
            .into_iter()
            .filter(|entry| !protected.contains(&entry.id))
            .min_by_key(|entry| {
                let gap = tracker
                    .gap_since(&entry.id, unit)
                    .unwrap_or_else(|| entry.gap(unit));
                (Reverse(gap), tracker.frequency(&entry.id), entry.id.clone())
            })
            .map(|entry| entry.id.clone())
    }
}
