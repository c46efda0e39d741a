//! Access pattern tracking for the legend cache
//!
//! Records which characters each processing unit references. Every character
//! gets a bounded window of its most recent unit indices, from which the gap
//! since its last reference and its in-window frequency are derived.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::legend::CharacterId;

/// Default number of unit indices remembered per character
pub const DEFAULT_WINDOW_SIZE: usize = 16;

/// Bounded recency record for a single character
#[derive(Debug, Clone, PartialEq)]
pub struct AccessWindow {
    units: VecDeque<u64>,
    capacity: usize,
}

impl AccessWindow {
    fn new(capacity: usize) -> Self {
        Self {
            units: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, unit: u64) {
        if self.units.len() == self.capacity {
            self.units.pop_front();
        }
        self.units.push_back(unit);
    }

    /// Most recent unit index recorded
    pub fn last(&self) -> Option<u64> {
        self.units.back().copied()
    }

    /// Number of references currently held in the window
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Recorded unit indices, oldest first
    pub fn units(&self) -> impl Iterator<Item = u64> + '_ {
        self.units.iter().copied()
    }
}

/// Tracks per-character reference recency and frequency
#[derive(Debug)]
pub struct AccessTracker {
    window_size: usize,
    windows: HashMap<CharacterId, AccessWindow>,
    current_unit: Option<u64>,
}

impl AccessTracker {
    /// Creates a tracker remembering `window_size` references per character
    ///
    /// A size of 0 falls back to [`DEFAULT_WINDOW_SIZE`].
    pub fn new(window_size: usize) -> Self {
        let window_size = if window_size == 0 {
            DEFAULT_WINDOW_SIZE
        } else {
            window_size
        };
        Self {
            window_size,
            windows: HashMap::new(),
            current_unit: None,
        }
    }

    /// Record that `unit` referenced each of `ids`.
    ///
    /// An id named more than once counts as one reference. An id whose last
    /// recorded unit is greater than `unit` is skipped with a warning and its
    /// window is left untouched. Returns the skipped ids.
    pub fn record_access(&mut self, unit: u64, ids: &[CharacterId]) -> Vec<CharacterId> {
        let window_size = self.window_size;
        let mut seen = HashSet::new();
        let mut rejected = Vec::new();

        for id in ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            let window = self
                .windows
                .entry(id.clone())
                .or_insert_with(|| AccessWindow::new(window_size));

            match window.last() {
                Some(last) if unit < last => {
                    tracing::warn!(
                        character_id = %id,
                        unit,
                        last_unit = last,
                        "Out-of-order access ignored"
                    );
                    rejected.push(id.clone());
                }
                _ => window.push(unit),
            }
        }

        self.current_unit = Some(self.current_unit.map_or(unit, |current| current.max(unit)));
        rejected
    }

    /// Drop the history of characters not referenced for more than `max_gap`
    /// units before `unit`, unless `keep` holds for them. Returns how many
    /// were dropped.
    pub fn forget_idle(&mut self, unit: u64, max_gap: u64, keep: impl Fn(&str) -> bool) -> usize {
        let before = self.windows.len();
        self.windows.retain(|id, window| {
            keep(id)
                || window
                    .last()
                    .is_some_and(|last| unit.saturating_sub(last) <= max_gap)
        });
        before - self.windows.len()
    }

    /// Units since the character was last referenced, or `None` if never seen
    pub fn gap_since(&self, id: &str, current_unit: u64) -> Option<u64> {
        self.last_access(id)
            .map(|last| current_unit.saturating_sub(last))
    }

    /// References recorded in the character's window
    pub fn frequency(&self, id: &str) -> usize {
        self.windows.get(id).map_or(0, AccessWindow::len)
    }

    /// Last unit index recorded for the character
    pub fn last_access(&self, id: &str) -> Option<u64> {
        self.windows.get(id).and_then(AccessWindow::last)
    }

    /// Highest unit index recorded so far
    pub fn current_unit(&self) -> Option<u64> {
        self.current_unit
    }

    pub fn window(&self, id: &str) -> Option<&AccessWindow> {
        self.windows.get(id)
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Number of characters with recorded history
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

impl Default for AccessTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<CharacterId> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_new_tracker_is_empty() {
        let tracker = AccessTracker::new(4);
        assert_eq!(tracker.tracked(), 0);
        assert_eq!(tracker.window_size(), 4);
        assert_eq!(tracker.current_unit(), None);
        assert_eq!(tracker.frequency("char_001"), 0);
        assert_eq!(tracker.gap_since("char_001", 10), None);
    }

    #[test]
    fn test_zero_size_uses_default() {
        let tracker = AccessTracker::new(0);
        assert_eq!(tracker.window_size(), DEFAULT_WINDOW_SIZE);
    }

    #[test]
    fn test_record_and_gap() {
        let mut tracker = AccessTracker::new(4);
        tracker.record_access(0, &ids(&["char_001", "char_002"]));
        tracker.record_access(3, &ids(&["char_001"]));

        assert_eq!(tracker.last_access("char_001"), Some(3));
        assert_eq!(tracker.gap_since("char_001", 10), Some(7));
        assert_eq!(tracker.gap_since("char_002", 10), Some(10));
        assert_eq!(tracker.frequency("char_001"), 2);
        assert_eq!(tracker.frequency("char_002"), 1);
        assert_eq!(tracker.current_unit(), Some(3));
    }

    #[test]
    fn test_window_is_bounded() {
        let mut tracker = AccessTracker::new(3);
        for unit in 0..10 {
            tracker.record_access(unit, &ids(&["char_001"]));
        }

        let window = tracker.window("char_001").unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window.units().collect::<Vec<_>>(), vec![7, 8, 9]);
        assert_eq!(tracker.frequency("char_001"), 3);
    }

    #[test]
    fn test_same_unit_is_accepted() {
        let mut tracker = AccessTracker::new(4);
        tracker.record_access(5, &ids(&["char_001"]));
        let rejected = tracker.record_access(5, &ids(&["char_001"]));

        assert!(rejected.is_empty());
        assert_eq!(tracker.frequency("char_001"), 2);
    }

    #[test]
    fn test_out_of_order_is_skipped_per_id() {
        let mut tracker = AccessTracker::new(4);
        tracker.record_access(10, &ids(&["char_001"]));
        tracker.record_access(2, &ids(&["char_002"]));

        let rejected = tracker.record_access(5, &ids(&["char_001", "char_002"]));

        assert_eq!(rejected, ids(&["char_001"]));
        assert_eq!(tracker.last_access("char_001"), Some(10));
        assert_eq!(tracker.frequency("char_001"), 1);
        assert_eq!(tracker.last_access("char_002"), Some(5));
    }

    #[test]
    fn test_repeated_id_counts_once() {
        let mut tracker = AccessTracker::new(4);
        tracker.record_access(3, &ids(&["char_001", "char_001", "char_002"]));

        assert_eq!(tracker.frequency("char_001"), 1);
        assert_eq!(tracker.frequency("char_002"), 1);

        let rejected = tracker.record_access(1, &ids(&["char_001", "char_001"]));
        assert_eq!(rejected, ids(&["char_001"]));
    }

    #[test]
    fn test_forget_idle_drops_old_history() {
        let mut tracker = AccessTracker::new(4);
        tracker.record_access(0, &ids(&["char_001", "char_002", "char_003"]));
        tracker.record_access(50, &ids(&["char_003"]));

        let dropped = tracker.forget_idle(100, 80, |id| id == "char_002");

        assert_eq!(dropped, 1);
        assert_eq!(tracker.last_access("char_001"), None);
        assert_eq!(tracker.last_access("char_002"), Some(0));
        assert_eq!(tracker.last_access("char_003"), Some(50));
        assert_eq!(tracker.current_unit(), Some(50));
    }

    #[test]
    fn test_current_unit_never_decreases() {
        let mut tracker = AccessTracker::new(4);
        tracker.record_access(10, &ids(&["char_001"]));
        tracker.record_access(4, &ids(&["char_002"]));
        assert_eq!(tracker.current_unit(), Some(10));
    }

    #[test]
    fn test_empty_batch_advances_current_unit() {
        let mut tracker = AccessTracker::default();
        tracker.record_access(7, &[]);
        assert_eq!(tracker.current_unit(), Some(7));
        assert_eq!(tracker.tracked(), 0);
    }
}
