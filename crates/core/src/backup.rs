use std::collections::VecDeque;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use thiserror::Error;
use tracing::{debug, info};

use crate::snapshot::{SnapshotEnvelope, SnapshotError};
use crate::tree::OutlineTree;
use crate::util::write_atomic;

/// Default number of backups kept by [`BackupRing`].
/// 預設保留的備份數量。
pub const DEFAULT_MAX_BACKUPS: usize = 10;

/// Timestamp label used for automatic backups.
/// 自動備份的時間戳前綴。
pub const AUTO_BACKUP_LABEL: &str = "Auto backup";

/// Bounded list of timestamped backups; the oldest is evicted first.
/// 固定容量的備份清單，最舊的先被移除。
#[derive(Debug, Clone)]
pub struct BackupRing {
    capacity: usize,
    entries: VecDeque<SnapshotEnvelope>,
}

impl Default for BackupRing {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BACKUPS)
    }
}

impl BackupRing {
    /// Creates a ring with the given capacity (at least 1).
    /// 建立指定容量的清單。
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::new(),
        }
    }

    /// Restores persisted entries, keeping only the newest ones.
    /// 依序列化資料還原清單，只保留最新的項目。
    pub fn with_entries(capacity: usize, entries: Vec<SnapshotEnvelope>) -> Self {
        let mut ring = Self::new(capacity);
        ring.entries = entries.into_iter().collect();
        ring.trim();
        ring
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Adjusts capacity and drops the oldest excess entries.
    /// 調整容量並修剪超出的備份。
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.trim();
    }

    /// Records a manual backup of the tree.
    /// 建立手動備份。
    pub fn create(&mut self, tree: &OutlineTree) -> &SnapshotEnvelope {
        self.push(SnapshotEnvelope::new(tree.to_record()))
    }

    /// Records an automatic backup; skipped for an empty outline.
    /// 建立自動備份；空白大綱不備份。
    pub fn create_auto(&mut self, tree: &OutlineTree) -> Option<&SnapshotEnvelope> {
        if tree.is_empty() {
            debug!("auto backup skipped: outline is empty");
            return None;
        }
        Some(self.push(SnapshotEnvelope::labelled(
            tree.to_record(),
            AUTO_BACKUP_LABEL,
        )))
    }

    /// Appends an existing envelope.
    /// 加入既有封套。
    pub fn push(&mut self, envelope: SnapshotEnvelope) -> &SnapshotEnvelope {
        self.entries.push_back(envelope);
        self.trim();
        &self.entries[self.entries.len() - 1]
    }

    /// Whether `interval` has elapsed since the newest backup; an unreadable timestamp counts as due.
    /// 距離最新備份是否已超過間隔；無法解析時間時視為到期。
    pub fn is_due(&self, now: NaiveDateTime, interval: Duration) -> bool {
        match self.entries.back().and_then(SnapshotEnvelope::recorded_at) {
            Some(last) => now - last >= interval,
            None => true,
        }
    }

    pub fn get(&self, index: usize) -> Option<&SnapshotEnvelope> {
        self.entries.get(index)
    }

    /// Rebuilds the tree stored in the backup at `index`.
    /// 由指定備份重建大綱樹。
    pub fn restore(&self, index: usize) -> Option<Result<OutlineTree, SnapshotError>> {
        let envelope = self.entries.get(index)?;
        Some(OutlineTree::from_record(envelope.data.clone()))
    }

    /// Iterates backups from oldest to newest.
    /// 由舊到新走訪備份。
    pub fn iter(&self) -> impl Iterator<Item = &SnapshotEnvelope> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn trim(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }
}

/// Persists a [`BackupRing`] as a JSON array of envelopes.
/// 以 JSON 陣列儲存備份清單。
#[derive(Debug)]
pub struct BackupStore {
    path: PathBuf,
}

impl BackupStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads backups, yielding an empty ring when the file is absent.
    /// 載入備份；檔案不存在時回傳空清單。
    pub fn load(&self, capacity: usize) -> Result<BackupRing, BackupStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let entries: Vec<SnapshotEnvelope> = serde_json::from_str(&contents)?;
                Ok(BackupRing::with_entries(capacity, entries))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BackupRing::new(capacity)),
            Err(err) => Err(BackupStoreError::Io(err)),
        }
    }

    pub fn save(&self, ring: &BackupRing) -> Result<(), BackupStoreError> {
        let entries: Vec<&SnapshotEnvelope> = ring.iter().collect();
        let payload = serde_json::to_vec_pretty(&entries)?;
        write_atomic(&self.path, &payload)?;
        info!(path = %self.path.display(), backups = ring.len(), "backups saved");
        Ok(())
    }
}

/// Errors emitted by [`BackupStore`].
/// [`BackupStore`] 可能拋出的錯誤。
#[derive(Debug, Error)]
pub enum BackupStoreError {
    #[error("backup IO error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid backup payload: {0}")]
    Invalid(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tree_with(title: &str) -> OutlineTree {
        let mut tree = OutlineTree::new();
        tree.create_node_titled(None, None, title).unwrap();
        tree
    }

    #[test]
    fn ring_evicts_oldest() {
        let mut ring = BackupRing::new(2);
        ring.create(&tree_with("one"));
        ring.create(&tree_with("two"));
        ring.create(&tree_with("three"));

        assert_eq!(ring.len(), 2);
        let titles: Vec<String> = ring
            .iter()
            .map(|entry| entry.data.items[0].title.clone())
            .collect();
        assert_eq!(titles, vec!["two", "three"]);
    }

    #[test]
    fn unbounded_ring_keeps_every_entry() {
        let mut ring = BackupRing::new(usize::MAX);
        ring.create(&tree_with("one"));
        ring.create(&tree_with("two"));
        assert_eq!(ring.capacity(), usize::MAX);
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn auto_backup_skips_empty_outline() {
        let mut ring = BackupRing::default();
        assert!(ring.create_auto(&OutlineTree::new()).is_none());
        let entry = ring.create_auto(&tree_with("draft")).unwrap();
        assert!(entry.timestamp.starts_with(AUTO_BACKUP_LABEL));
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn due_after_interval() {
        let interval = Duration::minutes(5);
        let mut ring = BackupRing::default();
        let now = NaiveDateTime::parse_from_str("2024-05-01 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert!(ring.is_due(now, interval));

        let mut envelope = SnapshotEnvelope::new(tree_with("x").to_record());
        envelope.timestamp = "Auto backup - 2024-05-01 11:57:00".to_string();
        ring.push(envelope);
        assert!(!ring.is_due(now, interval));
        assert!(ring.is_due(now + Duration::minutes(2), interval));
    }

    #[test]
    fn restore_rebuilds_tree() {
        let mut ring = BackupRing::default();
        let original = tree_with("kept");
        ring.create(&original);
        let restored = ring.restore(0).unwrap().unwrap();
        assert_eq!(restored, original);
        assert!(ring.restore(5).is_none());
    }

    #[test]
    fn store_roundtrip_and_capacity() {
        let dir = tempdir().unwrap();
        let store = BackupStore::new(dir.path().join("outline.backups.json"));
        assert!(store.load(3).unwrap().is_empty());

        let mut ring = BackupRing::new(3);
        for title in ["a", "b", "c"] {
            ring.create(&tree_with(title));
        }
        store.save(&ring).unwrap();

        let reloaded = store.load(2).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get(0).unwrap().data.items[0].title, "b");
    }
}
