//! Test utilities for legend-cache - record fixtures and registry mocks
//!
//! This module provides:
//! - A realistic character record fixture with long profile fields
//! - A registry that counts fetches and can delay them
//! - A registry that always fails

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{LegendCacheError, Result};
use crate::legend::{ColdRecord, Relationship};
use crate::registry::{CharacterRegistry, InMemoryRegistry};

/// A record with enough profile text for compression to make a difference
pub fn sample_record(id: &str) -> ColdRecord {
    let mut record = ColdRecord::new(id, format!("Character {id}"));
    record.aliases = vec![format!("{id} the Elder"), format!("Old {id}")];
    record.voice_style =
        "Speaks slowly and deliberately, weighing each word, with a dry humor that ".repeat(3);
    record.summary =
        "Grew up in the river quarter, apprenticed to a cartographer, and later ".repeat(6);
    record.relationships = vec![
        Relationship::new("char_900", "mentor", 0.9),
        Relationship::new("char_901", "sibling", 0.7),
        Relationship::new("char_902", "rival", 0.4),
        Relationship::new("char_903", "acquaintance", 0.1),
        Relationship::new("char_904", "creditor", 0.2),
    ];
    record
}

/// Registry wrapper that counts `find_character_by_id` calls.
///
/// An optional delay makes concurrent lookups overlap.
#[derive(Debug, Clone, Default)]
pub struct CountingRegistry {
    inner: InMemoryRegistry,
    fetches: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl CountingRegistry {
    pub fn new(inner: InMemoryRegistry) -> Self {
        Self {
            inner,
            fetches: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    /// Sleep for `delay` inside every fetch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches performed so far
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CharacterRegistry for CountingRegistry {
    async fn find_character_by_id(&self, id: &str) -> Result<Option<ColdRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.find_character_by_id(id).await
    }

    async fn get_active_characters(&self) -> Result<Vec<ColdRecord>> {
        self.inner.get_active_characters().await
    }
}

/// Registry whose every call fails, for exercising error propagation
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingRegistry;

#[async_trait]
impl CharacterRegistry for FailingRegistry {
    async fn find_character_by_id(&self, id: &str) -> Result<Option<ColdRecord>> {
        Err(LegendCacheError::Registry(format!(
            "registry unavailable while fetching {id}"
        )))
    }

    async fn get_active_characters(&self) -> Result<Vec<ColdRecord>> {
        Err(LegendCacheError::Registry("registry unavailable".to_string()))
    }
}
