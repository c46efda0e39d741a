//! Legend cache manager
//!
//! The public face of the cache. Serves legend lookups from the resident
//! tiers or the registry, feeds unit references to the access tracker, and
//! runs the eviction sweep after every unit.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::cache::access::AccessTracker;
use crate::cache::eviction::{EvictionPolicy, SweepReport};
use crate::cache::metrics::{CacheMetrics, MemoryStats, MetricsCollector};
use crate::cache::tiers::TierStore;
use crate::config::Config;
use crate::error::{LegendCacheError, Result};
use crate::legend::{CharacterId, Legend, StorageTier};
use crate::registry::CharacterRegistry;

/// Tier a caller would like a lookup served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierHint {
    /// Always return a full legend, promoting from Warm if needed
    Hot,
    /// Accept a compressed legend if one is resident
    Warm,
}

/// Mutable cache state, guarded as one unit
#[derive(Debug)]
struct CacheState {
    store: TierStore,
    tracker: AccessTracker,
    metrics: MetricsCollector,
}

/// What a lookup has to do after inspecting the resident tiers
enum Resolution {
    Resident(Legend),
    Reload,
}

/// Tiered cache of character legends over a [`CharacterRegistry`]
///
/// Each instance owns its own tiers, tracker and metrics. Lookups for the
/// same id are serialized so a character is fetched from the registry at
/// most once per miss; lookups for different ids proceed independently.
pub struct LegendCacheManager {
    registry: Arc<dyn CharacterRegistry>,
    config: Config,
    policy: EvictionPolicy,
    state: Mutex<CacheState>,
    loads: DashMap<CharacterId, Arc<tokio::sync::Mutex<()>>>,
}

impl LegendCacheManager {
    /// Create a cache over `registry`, rejecting an invalid configuration
    pub fn new(registry: Arc<dyn CharacterRegistry>, config: Config) -> Result<Self> {
        config.validate()?;

        let state = CacheState {
            store: TierStore::new(),
            tracker: AccessTracker::new(config.access_window.size),
            metrics: MetricsCollector::new(),
        };

        Ok(Self {
            registry,
            policy: EvictionPolicy::new(&config),
            config,
            state: Mutex::new(state),
            loads: DashMap::new(),
        })
    }

    /// Create a cache with the default configuration
    pub fn with_defaults(registry: Arc<dyn CharacterRegistry>) -> Result<Self> {
        Self::new(registry, Config::default())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the legend for a character.
    ///
    /// Hot entries are returned as-is. Warm entries are returned compressed
    /// unless `hint` asks for Hot or the entry has earned re-promotion, in
    /// which case the full record is reloaded. Anything else is fetched from
    /// the registry and installed in Hot.
    ///
    /// # Errors
    /// * `NotFound` if the registry has no record for `id`
    /// * any registry error, unchanged
    pub async fn get_character_data(&self, id: &str, hint: Option<TierHint>) -> Result<Legend> {
        let lock = self
            .loads
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .value()
            .clone();

        let result = {
            let _guard = lock.lock().await;
            self.lookup(id, hint).await
        };

        drop(lock);
        self.loads.remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    async fn lookup(&self, id: &str, hint: Option<TierHint>) -> Result<Legend> {
        match self.resolve_resident(id, hint) {
            Resolution::Resident(legend) => return Ok(legend),
            Resolution::Reload => {}
        }

        let record = self
            .registry
            .find_character_by_id(id)
            .await?
            .ok_or_else(|| LegendCacheError::NotFound(id.to_string()))?;

        let mut state = self.state();
        let CacheState {
            store,
            tracker,
            metrics,
        } = &mut *state;

        let current = tracker.current_unit().unwrap_or(0);
        let last_access_unit = store
            .get(id)
            .map_or(current, |entry| entry.last_access_unit.max(current));
        let legend = self.policy.promote_to_hot(
            store,
            &record,
            last_access_unit,
            tracker.frequency(id),
            metrics,
        );
        Ok(legend)
    }

    /// Serve from a resident tier if possible, accounting the hit or miss
    fn resolve_resident(&self, id: &str, hint: Option<TierHint>) -> Resolution {
        let mut state = self.state();
        let CacheState { store, metrics, .. } = &mut *state;

        let Some(entry) = store.get_mut(id) else {
            metrics.record_miss(StorageTier::Hot);
            tracing::debug!(character_id = %id, "Cache miss");
            return Resolution::Reload;
        };

        match entry.tier() {
            StorageTier::Warm => {
                metrics.record_hit(StorageTier::Warm);
                entry.warm_hits = entry.warm_hits.saturating_add(1);

                if hint == Some(TierHint::Hot) || self.policy.should_promote_warm(entry) {
                    tracing::debug!(
                        character_id = %id,
                        warm_hits = entry.warm_hits,
                        "Reloading warm entry into hot"
                    );
                    Resolution::Reload
                } else {
                    Resolution::Resident(entry.legend().clone())
                }
            }
            _ => {
                metrics.record_hit(StorageTier::Hot);
                Resolution::Resident(entry.legend().clone())
            }
        }
    }

    /// Record that `unit` referenced `character_ids`, then sweep the tiers.
    ///
    /// References older than a character's last recorded unit are ignored
    /// with a warning and listed in the report; the rest of the batch is
    /// still applied. Characters with a registry load in flight keep their
    /// tier until a later sweep.
    pub async fn update_access_pattern<I, S>(&self, unit: u64, character_ids: I) -> SweepReport
    where
        I: IntoIterator<Item = S>,
        S: Into<CharacterId>,
    {
        let mut seen = HashSet::new();
        let ids: Vec<CharacterId> = character_ids
            .into_iter()
            .map(Into::into)
            .filter(|id: &CharacterId| seen.insert(id.clone()))
            .collect();
        let pinned = self.loading_ids();

        let mut state = self.state();
        let CacheState {
            store,
            tracker,
            metrics,
        } = &mut *state;

        let rejected = tracker.record_access(unit, &ids);
        let accepted: Vec<CharacterId> = ids
            .into_iter()
            .filter(|id| !rejected.contains(id))
            .collect();

        let mut report = self
            .policy
            .sweep(unit, &accepted, &pinned, store, tracker, metrics);
        report.rejected = rejected;

        let forgotten = tracker.forget_idle(unit, self.config.tiers.warm_retention_units, |id| {
            store.tier_of(id) != StorageTier::Cold || pinned.iter().any(|p| p == id)
        });
        if forgotten > 0 {
            tracing::debug!(unit, forgotten, "Dropped access history of idle characters");
        }

        if !report.is_quiet() {
            tracing::info!(
                unit,
                demoted = report.demoted_to_warm.len(),
                evicted = report.evicted.len(),
                "Sweep moved entries"
            );
        }
        report
    }

    /// Warm the cache with up to `limit` active characters from the registry.
    ///
    /// Characters are taken by descending importance, then id, and installed
    /// compressed in Warm. Resident characters are left alone and admission
    /// stops at the memory budget. Returns the number admitted.
    pub async fn preload_active(&self, limit: usize) -> Result<usize> {
        let mut records = self.registry.get_active_characters().await?;
        records.sort_by(|a, b| {
            b.importance
                .total_cmp(&a.importance)
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut state = self.state();
        let CacheState {
            store,
            tracker,
            metrics,
        } = &mut *state;
        let unit = tracker.current_unit().unwrap_or(0);

        let mut admitted = 0;
        for record in &records {
            if admitted == limit {
                break;
            }
            if store.tier_of(&record.id) != StorageTier::Cold {
                continue;
            }
            if !self.policy.admit_warm(store, record, unit, metrics) {
                tracing::debug!(character_id = %record.id, "Preload stopped at memory budget");
                break;
            }
            admitted += 1;
        }

        tracing::info!(admitted, available = records.len(), "Preloaded active characters");
        Ok(admitted)
    }

    pub fn get_memory_stats(&self) -> MemoryStats {
        let state = self.state();
        state
            .metrics
            .memory_stats(&state.store, self.policy.limit_bytes())
    }

    pub fn get_cache_metrics(&self) -> CacheMetrics {
        self.state().metrics.snapshot()
    }

    /// Cumulative hits / (hits + misses); 0 before any lookup
    pub fn get_cache_hit_rate(&self) -> f64 {
        self.state().metrics.hit_rate()
    }

    /// Tier a character currently occupies; anything not resident is Cold
    pub fn tier_of(&self, id: &str) -> StorageTier {
        self.state().store.tier_of(id)
    }

    /// Ids resident in `tier`, ordered
    pub fn resident_ids(&self, tier: StorageTier) -> Vec<CharacterId> {
        self.state().store.ids(tier)
    }

    /// Ids whose per-character lock is held by a lookup right now
    fn loading_ids(&self) -> Vec<CharacterId> {
        self.loads
            .iter()
            .filter(|load| load.value().try_lock().is_err())
            .map(|load| load.key().clone())
            .collect()
    }

    // The state is consistent between statements, so a panic elsewhere
    // leaves nothing half-written worth refusing.
    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for LegendCacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegendCacheManager")
            .field("config", &self.config)
            .field("pending_loads", &self.loads.len())
            .finish_non_exhaustive()
    }
}
