//! Character registry abstraction
//!
//! Defines the CharacterRegistry trait that abstracts the authoritative store
//! of character records. The cache only ever reads through it.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::legend::ColdRecord;

pub use memory::InMemoryRegistry;

/// Read-only access to authoritative character records
///
/// Implementations must keep "not found" (`Ok(None)`) distinct from I/O
/// failures (`Err(LegendCacheError::Registry(_))`). Reads are expected to be
/// idempotent and side-effect free.
#[async_trait]
pub trait CharacterRegistry: Send + Sync {
    /// Look up a single character by id
    async fn find_character_by_id(&self, id: &str) -> Result<Option<ColdRecord>>;

    /// All characters currently marked active, used for bulk warm-up
    async fn get_active_characters(&self) -> Result<Vec<ColdRecord>>;
}
