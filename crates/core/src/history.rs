use std::collections::VecDeque;

/// Default number of snapshots retained by [`History`].
/// 預設的歷史紀錄容量。
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Bounded linear undo/redo log of whole snapshots.
/// 線性的復原/重做紀錄，保存完整快照。
///
/// A new commit made after undoing discards the redo branch. Once the log is
/// full the oldest entry is evicted.
#[derive(Debug, Clone)]
pub struct History<S> {
    capacity: usize,
    entries: VecDeque<S>,
    cursor: Option<usize>,
}

impl<S> Default for History<S> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl<S> History<S> {
    /// Creates a log with the given capacity (at least 1).
    /// 建立指定容量的紀錄（最少 1）。
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::new(),
            cursor: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the current entry, `None` while empty.
    /// 目前所在位置。
    pub fn position(&self) -> Option<usize> {
        self.cursor
    }

    /// Snapshot at the current position.
    /// 目前位置的快照。
    pub fn current(&self) -> Option<&S> {
        self.cursor.and_then(|index| self.entries.get(index))
    }

    /// Commits a snapshot, discarding any redo branch.
    /// 提交新快照並捨棄重做分支。
    pub fn commit(&mut self, snapshot: S) {
        if let Some(index) = self.cursor {
            self.entries.truncate(index + 1);
        }
        self.entries.push_back(snapshot);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = Some(self.entries.len() - 1);
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(index) if index > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(index) if index + 1 < self.entries.len())
    }

    /// Steps back one snapshot; no-op at the oldest entry.
    /// 回到前一個快照；位於開頭時不做任何事。
    pub fn undo(&mut self) -> Option<&S> {
        if !self.can_undo() {
            return None;
        }
        let index = self.cursor? - 1;
        self.cursor = Some(index);
        self.entries.get(index)
    }

    /// Steps forward one snapshot; no-op at the newest entry.
    /// 前進到下一個快照；位於結尾時不做任何事。
    pub fn redo(&mut self) -> Option<&S> {
        if !self.can_redo() {
            return None;
        }
        let index = self.cursor? + 1;
        self.cursor = Some(index);
        self.entries.get(index)
    }

    /// Drops every entry.
    /// 清除所有紀錄。
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_is_inert() {
        let mut history: History<u32> = History::new(3);
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(history.position(), None);
        assert!(history.current().is_none());
    }

    #[test]
    fn undo_and_redo_walk_the_log() {
        let mut history = History::new(10);
        for value in 1..=3 {
            history.commit(value);
        }
        assert_eq!(history.undo(), Some(&2));
        assert_eq!(history.undo(), Some(&1));
        assert_eq!(history.undo(), None);
        assert_eq!(history.redo(), Some(&2));
        assert_eq!(history.redo(), Some(&3));
        assert_eq!(history.redo(), None);
        assert_eq!(history.current(), Some(&3));
    }

    #[test]
    fn new_commit_discards_redo_branch() {
        let mut history = History::new(10);
        history.commit("a");
        history.commit("b");
        history.commit("c");
        history.undo();
        history.undo();
        history.commit("d");

        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(history.redo(), None);
        assert_eq!(history.undo(), Some(&"a"));
        assert_eq!(history.redo(), Some(&"d"));
    }

    #[test]
    fn capacity_evicts_oldest_entries() {
        let capacity = 5;
        let mut history = History::new(capacity);
        for value in 0..capacity + 5 {
            history.commit(value);
        }
        assert_eq!(history.len(), capacity);
        assert_eq!(history.position(), Some(capacity - 1));

        let mut last = None;
        for _ in 0..capacity - 1 {
            last = history.undo().copied();
        }
        assert_eq!(last, Some(5), "oldest five entries were evicted");
        assert_eq!(history.undo(), None);
        assert_eq!(history.current(), Some(&5));
    }

    #[test]
    fn commit_at_capacity_after_undo_keeps_recent_state() {
        let mut history = History::new(3);
        for value in [1, 2, 3] {
            history.commit(value);
        }
        history.undo();
        history.commit(4);
        assert_eq!(history.len(), 3);
        assert_eq!(history.current(), Some(&4));
        assert_eq!(history.undo(), Some(&2));
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut history = History::new(0);
        history.commit('x');
        history.commit('y');
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.current(), Some(&'y'));
    }

    #[test]
    fn unbounded_capacity_does_not_preallocate() {
        let mut history: History<u8> = History::new(usize::MAX);
        assert_eq!(history.capacity(), usize::MAX);
        history.commit(1);
        history.commit(2);
        assert_eq!(history.len(), 2);
        assert_eq!(history.undo(), Some(&1));
    }
}
