//! Fixed-length captured windows keyed by snapshot-set id.

use std::collections::BTreeMap;

use crate::core::constants::SNAPSHOT_SIZE;
use crate::core::SnapshotSetId;

/// Snapshots of one log, newest entry first, `SNAPSHOT_SIZE` long.
#[derive(Debug, Clone)]
pub struct SnapshotStore<T> {
    sets: BTreeMap<SnapshotSetId, Vec<T>>,
}

impl<T> Default for SnapshotStore<T> {
    fn default() -> Self {
        Self {
            sets: BTreeMap::new(),
        }
    }
}

impl<T: Copy> SnapshotStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the newest entries of `source`, each repeated `pastes` times.
    ///
    /// A source cycling `pastes` times slower than the clock fills the window at clock
    /// resolution. An id that already holds a snapshot keeps it.
    pub fn capture<I>(&mut self, id: SnapshotSetId, source: I, pastes: usize)
    where
        I: IntoIterator<Item = T>,
    {
        let pastes = pastes.max(1);
        let window: Vec<T> = source
            .into_iter()
            .flat_map(|v| std::iter::repeat(v).take(pastes))
            .take(SNAPSHOT_SIZE)
            .collect();
        self.sets.entry(id).or_insert(window);
    }

    pub fn destroy(&mut self, id: SnapshotSetId) -> bool {
        self.sets.remove(&id).is_some()
    }

    pub fn contains(&self, id: SnapshotSetId) -> bool {
        self.sets.contains_key(&id)
    }

    /// Newest first, as captured.
    pub fn get(&self, id: SnapshotSetId) -> Option<&[T]> {
        self.sets.get(&id).map(|v| v.as_slice())
    }

    /// Oldest first, for display. Empty when the id holds nothing.
    pub fn oldest_first(&self, id: SnapshotSetId) -> Vec<T> {
        self.sets
            .get(&id)
            .map(|v| v.iter().rev().copied().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_takes_window() {
        let mut store = SnapshotStore::new();
        let id = SnapshotSetId::new(4);
        store.capture(id, 0..40u32, 1);
        let snap = store.get(id).unwrap();
        assert_eq!(snap.len(), SNAPSHOT_SIZE);
        assert_eq!(snap[0], 0);
        assert_eq!(snap[14], 14);
    }

    #[test]
    fn test_capture_pastes_slow_source() {
        let mut store = SnapshotStore::new();
        let id = SnapshotSetId::new(1);
        store.capture(id, 0..40u32, 2);
        let snap = store.get(id).unwrap();
        assert_eq!(&snap[..5], &[0, 0, 1, 1, 2]);
        assert_eq!(snap[14], 7);
    }

    #[test]
    fn test_destroy_and_oldest_first() {
        let mut store = SnapshotStore::new();
        let id = SnapshotSetId::new(2);
        store.capture(id, 0..15u8, 1);
        assert_eq!(store.oldest_first(id)[0], 14);
        assert!(store.destroy(id));
        assert!(!store.destroy(id));
        assert!(store.oldest_first(id).is_empty());
    }
}
