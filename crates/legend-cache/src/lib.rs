//! Legend Cache - tiered memory for character legend profiles
//!
//! This crate keeps the character profiles referenced while a long document is
//! processed unit by unit. Recently referenced characters stay Hot at full
//! fidelity, quieter ones are compressed into the Warm tier, and dormant ones
//! fall back to Cold, where the authoritative registry remains the source of
//! truth.

pub mod cache;
pub mod config;
pub mod error;
pub mod legend;
pub mod registry;
pub mod testing;

pub use cache::{CacheMetrics, LegendCacheManager, MemoryStats, SweepReport, TierHint};
pub use error::LegendCacheError;
pub use legend::{CharacterId, ColdRecord, Legend, LegendKind, StorageTier};
pub use registry::{CharacterRegistry, InMemoryRegistry};
