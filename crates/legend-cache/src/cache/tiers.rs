//! Tier storage for the legend cache
//!
//! Keyed storage for the two resident tiers (Hot, Warm) with per-entry byte
//! bookkeeping. Holds no transition logic; the eviction policy decides what
//! moves where.

use std::collections::HashMap;

use crate::legend::{CharacterId, CompressedLegend, FullLegend, Legend, StorageTier};

/// A resident character legend and its bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Character this entry belongs to
    pub id: CharacterId,
    /// Full legend when Hot, compressed legend when Warm
    legend: Legend,
    /// Estimated footprint of `legend`
    size_bytes: usize,
    /// Estimated footprint the entry would have as a full legend
    full_size_bytes: usize,
    /// Unit index of the most recent reference seen by the cache
    pub last_access_unit: u64,
    /// References recorded in the character's access window
    pub access_count_in_window: usize,
    /// Hits served while this entry was Warm
    pub warm_hits: u32,
}

impl CacheEntry {
    /// Create a Hot entry holding a full legend
    pub fn hot(id: impl Into<CharacterId>, legend: FullLegend, last_access_unit: u64) -> Self {
        let legend = Legend::Full(legend);
        let size_bytes = legend.estimated_size();
        Self {
            id: id.into(),
            legend,
            size_bytes,
            full_size_bytes: size_bytes,
            last_access_unit,
            access_count_in_window: 0,
            warm_hits: 0,
        }
    }

    /// Create a Warm entry holding a compressed legend.
    ///
    /// `full_size_bytes` is the size of the full legend it was derived from.
    pub fn warm(
        id: impl Into<CharacterId>,
        legend: CompressedLegend,
        full_size_bytes: usize,
        last_access_unit: u64,
    ) -> Self {
        let legend = Legend::Compressed(legend);
        let size_bytes = legend.estimated_size();
        Self {
            id: id.into(),
            legend,
            size_bytes,
            full_size_bytes: full_size_bytes.max(size_bytes),
            last_access_unit,
            access_count_in_window: 0,
            warm_hits: 0,
        }
    }

    /// Tier implied by the payload: Hot for full legends, Warm for compressed
    pub fn tier(&self) -> StorageTier {
        self.legend.tier()
    }

    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn full_size_bytes(&self) -> usize {
        self.full_size_bytes
    }

    /// Units elapsed between the last reference and `current_unit`
    pub fn gap(&self, current_unit: u64) -> u64 {
        current_unit.saturating_sub(self.last_access_unit)
    }
}

/// Keyed storage for Hot and Warm entries
///
/// An id lives in at most one tier; `put` moves it if it was resident elsewhere.
#[derive(Debug, Default)]
pub struct TierStore {
    hot: HashMap<CharacterId, CacheEntry>,
    warm: HashMap<CharacterId, CacheEntry>,
}

impl TierStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&CacheEntry> {
        self.hot.get(id).or_else(|| self.warm.get(id))
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut CacheEntry> {
        match self.hot.get_mut(id) {
            Some(entry) => Some(entry),
            None => self.warm.get_mut(id),
        }
    }

    /// Store an entry in the tier matching its payload.
    ///
    /// Returns the entry previously resident for the id, from either tier.
    pub fn put(&mut self, entry: CacheEntry) -> Option<CacheEntry> {
        let previous = self.remove(&entry.id);
        let id = entry.id.clone();
        match entry.tier() {
            StorageTier::Hot => self.hot.insert(id, entry),
            _ => self.warm.insert(id, entry),
        };
        previous
    }

    pub fn remove(&mut self, id: &str) -> Option<CacheEntry> {
        self.hot.remove(id).or_else(|| self.warm.remove(id))
    }

    /// Entries resident in `tier`, ordered by id. Cold has no resident entries.
    pub fn list(&self, tier: StorageTier) -> Vec<&CacheEntry> {
        let mut entries: Vec<&CacheEntry> = match tier {
            StorageTier::Hot => self.hot.values().collect(),
            StorageTier::Warm => self.warm.values().collect(),
            StorageTier::Cold => Vec::new(),
        };
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    /// Ids resident in `tier`, ordered
    pub fn ids(&self, tier: StorageTier) -> Vec<CharacterId> {
        self.list(tier).into_iter().map(|e| e.id.clone()).collect()
    }

    /// Byte estimate for a resident id
    pub fn size_bytes(&self, id: &str) -> Option<usize> {
        self.get(id).map(CacheEntry::size_bytes)
    }

    /// Where an id currently lives; absent ids are Cold
    pub fn tier_of(&self, id: &str) -> StorageTier {
        if self.hot.contains_key(id) {
            StorageTier::Hot
        } else if self.warm.contains_key(id) {
            StorageTier::Warm
        } else {
            StorageTier::Cold
        }
    }

    pub fn count(&self, tier: StorageTier) -> usize {
        match tier {
            StorageTier::Hot => self.hot.len(),
            StorageTier::Warm => self.warm.len(),
            StorageTier::Cold => 0,
        }
    }

    pub fn tier_bytes(&self, tier: StorageTier) -> usize {
        match tier {
            StorageTier::Hot => self.hot.values().map(CacheEntry::size_bytes).sum(),
            StorageTier::Warm => self.warm.values().map(CacheEntry::size_bytes).sum(),
            StorageTier::Cold => 0,
        }
    }

    /// Bytes held by all resident entries
    pub fn total_bytes(&self) -> usize {
        self.tier_bytes(StorageTier::Hot) + self.tier_bytes(StorageTier::Warm)
    }

    /// Bytes all resident entries would hold if every one were a full legend
    pub fn full_equivalent_bytes(&self) -> usize {
        self.hot
            .values()
            .chain(self.warm.values())
            .map(CacheEntry::full_size_bytes)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.hot.is_empty() && self.warm.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legend::Relationship;

    fn full(name: &str) -> FullLegend {
        FullLegend {
            name: name.to_string(),
            voice: "steady".to_string(),
            summary: format!("{name} keeps the lighthouse lit through every storm."),
            relationships: vec![Relationship::new("char_999", "keeper", 0.5)],
            aliases: vec![format!("{name} of the Light")],
        }
    }

    fn compressed(name: &str) -> CompressedLegend {
        CompressedLegend {
            name: name.to_string(),
            voice: "steady".to_string(),
            summary: format!("{name}..."),
            relationships: Vec::new(),
        }
    }

    mod cache_entry {
        use super::*;

        #[test]
        fn test_hot_entry_sizes_match() {
            let entry = CacheEntry::hot("char_001", full("Aria"), 3);
            assert_eq!(entry.tier(), StorageTier::Hot);
            assert_eq!(entry.size_bytes(), entry.full_size_bytes());
            assert_eq!(entry.size_bytes(), entry.legend().estimated_size());
        }

        #[test]
        fn test_warm_entry_keeps_full_size() {
            let full_size = Legend::Full(full("Aria")).estimated_size();
            let entry = CacheEntry::warm("char_001", compressed("Aria"), full_size, 3);
            assert_eq!(entry.tier(), StorageTier::Warm);
            assert!(entry.size_bytes() < entry.full_size_bytes());
            assert_eq!(entry.full_size_bytes(), full_size);
        }

        #[test]
        fn test_warm_full_size_never_below_actual() {
            let entry = CacheEntry::warm("char_001", compressed("Aria"), 1, 0);
            assert_eq!(entry.full_size_bytes(), entry.size_bytes());
        }

        #[test]
        fn test_gap() {
            let entry = CacheEntry::hot("char_001", full("Aria"), 10);
            assert_eq!(entry.gap(25), 15);
            assert_eq!(entry.gap(10), 0);
            assert_eq!(entry.gap(5), 0);
        }
    }

    mod tier_store {
        use super::*;

        #[test]
        fn test_put_and_get() {
            let mut store = TierStore::new();
            assert!(store.is_empty());

            store.put(CacheEntry::hot("char_001", full("Aria"), 0));
            store.put(CacheEntry::warm("char_002", compressed("Bram"), 500, 0));

            assert_eq!(store.tier_of("char_001"), StorageTier::Hot);
            assert_eq!(store.tier_of("char_002"), StorageTier::Warm);
            assert_eq!(store.tier_of("char_003"), StorageTier::Cold);
            assert_eq!(store.count(StorageTier::Hot), 1);
            assert_eq!(store.count(StorageTier::Warm), 1);
            assert!(store.get("char_003").is_none());
        }

        #[test]
        fn test_put_moves_between_tiers() {
            let mut store = TierStore::new();
            store.put(CacheEntry::hot("char_001", full("Aria"), 0));

            let previous = store.put(CacheEntry::warm("char_001", compressed("Aria"), 500, 0));
            assert_eq!(previous.map(|e| e.tier()), Some(StorageTier::Hot));
            assert_eq!(store.count(StorageTier::Hot), 0);
            assert_eq!(store.count(StorageTier::Warm), 1);
            assert_eq!(store.tier_of("char_001"), StorageTier::Warm);
        }

        #[test]
        fn test_remove() {
            let mut store = TierStore::new();
            store.put(CacheEntry::warm("char_001", compressed("Aria"), 500, 0));

            let removed = store.remove("char_001");
            assert!(removed.is_some());
            assert!(store.remove("char_001").is_none());
            assert_eq!(store.tier_of("char_001"), StorageTier::Cold);
        }

        #[test]
        fn test_list_is_ordered_by_id() {
            let mut store = TierStore::new();
            store.put(CacheEntry::hot("char_003", full("Cora"), 0));
            store.put(CacheEntry::hot("char_001", full("Aria"), 0));
            store.put(CacheEntry::hot("char_002", full("Bram"), 0));

            assert_eq!(
                store.ids(StorageTier::Hot),
                vec!["char_001", "char_002", "char_003"]
            );
            assert!(store.list(StorageTier::Cold).is_empty());
        }

        #[test]
        fn test_byte_accounting() {
            let mut store = TierStore::new();
            let hot = CacheEntry::hot("char_001", full("Aria"), 0);
            let warm = CacheEntry::warm("char_002", compressed("Bram"), 900, 0);
            let hot_size = hot.size_bytes();
            let warm_size = warm.size_bytes();

            store.put(hot);
            store.put(warm);

            assert_eq!(store.size_bytes("char_001"), Some(hot_size));
            assert_eq!(store.size_bytes("char_404"), None);
            assert_eq!(store.tier_bytes(StorageTier::Hot), hot_size);
            assert_eq!(store.tier_bytes(StorageTier::Warm), warm_size);
            assert_eq!(store.total_bytes(), hot_size + warm_size);
            assert_eq!(store.full_equivalent_bytes(), hot_size + 900);
        }

        #[test]
        fn test_get_mut_updates_entry() {
            let mut store = TierStore::new();
            store.put(CacheEntry::warm("char_001", compressed("Aria"), 500, 0));

            if let Some(entry) = store.get_mut("char_001") {
                entry.warm_hits += 1;
                entry.last_access_unit = 7;
            }

            let entry = store.get("char_001").unwrap();
            assert_eq!(entry.warm_hits, 1);
            assert_eq!(entry.last_access_unit, 7);
        }
    }
}
