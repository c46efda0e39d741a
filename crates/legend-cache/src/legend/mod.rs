//! Legend types and transforms
//!
//! Defines the character records read from the registry, the full and
//! compressed legends held by the cache, and the compression transform
//! between them.

pub mod compression;
pub mod types;

pub use compression::{build_full, compress, recompress};
pub use types::{
    CharacterId, CharacterStatus, ColdRecord, CompressedLegend, FullLegend, Legend, LegendKind,
    Relationship, StorageTier,
};
