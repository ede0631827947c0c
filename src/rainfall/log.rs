//! Bounded newest-first log shared by every rainfall kind.

use std::collections::VecDeque;

/// Log with the most recent entry at the front and the oldest at the back.
///
/// Its length only ever grows.
#[derive(Debug, Clone)]
pub struct BindexLog<T> {
    entries: VecDeque<T>,
}

impl<T: Copy> BindexLog<T> {
    pub fn filled(len: usize, value: T) -> Self {
        let mut entries = VecDeque::with_capacity(len);
        entries.resize(len, value);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Push to the front, pop from the back. Returns the entry dropped.
    pub fn push(&mut self, value: T) -> Option<T> {
        let dropped = self.entries.pop_back();
        self.entries.push_front(value);
        dropped
    }

    /// Overwrite every entry.
    pub fn fill(&mut self, value: T) {
        for e in self.entries.iter_mut() {
            *e = value;
        }
    }

    /// Lengthen at the old end with `backfill`. Never shortens.
    pub fn grow_to(&mut self, len: usize, backfill: T) {
        while self.entries.len() < len {
            self.entries.push_back(backfill);
        }
    }

    /// Entry `depth` cycles back; 0 is the newest.
    pub fn at(&self, depth: usize) -> Option<T> {
        self.entries.get(depth).copied()
    }

    pub fn newest(&self) -> Option<T> {
        self.entries.front().copied()
    }

    pub fn oldest(&self) -> Option<T> {
        self.entries.back().copied()
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.entries.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_newest_first() {
        let mut log = BindexLog::filled(3, 0u8);
        assert_eq!(log.push(1), Some(0));
        log.push(2);
        assert_eq!(log.iter().collect::<Vec<_>>(), vec![2, 1, 0]);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_grow_backfills_old_end() {
        let mut log = BindexLog::filled(2, 5u8);
        log.push(9);
        log.grow_to(4, 7);
        assert_eq!(log.iter().collect::<Vec<_>>(), vec![9, 5, 7, 7]);
        log.grow_to(1, 0);
        assert_eq!(log.len(), 4);
    }
}
