use std::fs;
use std::io;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::snapshot::{export_snapshot, import_snapshot, SnapshotError};
use crate::tree::OutlineTree;
use crate::util::write_atomic;

/// Persists outline snapshots to disk using JSON + atomic writes.
/// 以 JSON 搭配原子寫入方式儲存大綱快照。
#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Constructs a store bound to the provided path.
    /// 建立綁定至指定路徑的儲存器。
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads an outline from disk, returning `Ok(None)` when the file is absent.
    /// 從磁碟載入大綱；若檔案不存在則回傳 `Ok(None)`。
    pub fn load(&self) -> Result<Option<OutlineTree>, SnapshotStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let tree = import_snapshot(&contents)?;
                info!(path = %self.path.display(), nodes = tree.len(), "outline loaded");
                Ok(Some(tree))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SnapshotStoreError::Io(err)),
        }
    }

    /// Saves the outline atomically as an enveloped snapshot.
    /// 將大綱以封套快照形式原子寫入磁碟。
    pub fn save(&self, tree: &OutlineTree) -> Result<(), SnapshotStoreError> {
        let payload = export_snapshot(tree)?;
        write_atomic(&self.path, payload.as_bytes())?;
        info!(path = %self.path.display(), nodes = tree.len(), "outline saved");
        Ok(())
    }
}

/// Errors emitted by [`SnapshotStore`].
/// [`SnapshotStore`] 可能拋出的錯誤。
#[derive(Debug, Error)]
pub enum SnapshotStoreError {
    #[error("snapshot IO error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid snapshot payload: {0}")]
    Invalid(#[from] SnapshotError),
}
