//! Tiered cache for character legends
//!
//! Tracks per-character access patterns, keeps legends in the Hot and Warm
//! tiers according to those patterns, and falls back to the registry for
//! anything Cold.

pub mod access;
pub mod eviction;
pub mod manager;
pub mod metrics;
pub mod tiers;

pub use access::{AccessTracker, AccessWindow, DEFAULT_WINDOW_SIZE};
pub use eviction::{EvictionPolicy, SweepReport};
pub use manager::{LegendCacheManager, TierHint};
pub use metrics::{CacheMetrics, MemoryStats, MetricsCollector, TierCounters};
pub use tiers::{CacheEntry, TierStore};
