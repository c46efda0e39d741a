//! In-memory character registry
//!
//! A snapshot of character records held in a map. Used by the CLI to replay
//! traces from a JSON file of records, and by tests.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use crate::error::{LegendCacheError, Result};
use crate::legend::{CharacterId, ColdRecord};
use crate::registry::CharacterRegistry;

/// Registry backed by an in-memory snapshot of records
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    records: HashMap<CharacterId, ColdRecord>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of records; later duplicates replace earlier ones
    pub fn from_records(records: impl IntoIterator<Item = ColdRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    /// Load a JSON array of records from `path`
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let records: Vec<ColdRecord> = serde_json::from_str(&content).map_err(|e| {
            LegendCacheError::Serialization(format!(
                "Failed to parse registry file {}: {}",
                path.display(),
                e
            ))
        })?;
        tracing::debug!("Loaded {} records from {}", records.len(), path.display());
        Ok(Self::from_records(records))
    }

    /// Add or replace a record
    pub fn insert(&mut self, record: ColdRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl CharacterRegistry for InMemoryRegistry {
    async fn find_character_by_id(&self, id: &str) -> Result<Option<ColdRecord>> {
        Ok(self.records.get(id).cloned())
    }

    async fn get_active_characters(&self) -> Result<Vec<ColdRecord>> {
        let mut active: Vec<ColdRecord> = self
            .records
            .values()
            .filter(|r| r.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(active)
    }
}
