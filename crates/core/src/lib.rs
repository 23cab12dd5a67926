//! Outline document engine: node arena, structural editing, undo history and
//! snapshot persistence for OutlineWriter.
//! OutlineWriter 的大綱文件引擎。

pub mod backup;
pub mod editor;
pub mod history;
pub mod node;
pub mod snapshot;
pub mod store;
pub mod tree;
mod util;

pub use backup::{BackupRing, BackupStore, BackupStoreError, AUTO_BACKUP_LABEL, DEFAULT_MAX_BACKUPS};
pub use editor::{EditorOptions, OutlineEditor};
pub use history::{History, DEFAULT_HISTORY_CAPACITY};
pub use node::{Node, NodeEdit, NodeId, DEFAULT_NEW_TITLE, UNTITLED};
pub use snapshot::{
    export_snapshot, import_snapshot, parse_snapshot, ItemRecord, OutlineRecord,
    SnapshotEnvelope, SnapshotError, SNAPSHOT_FORMAT_VERSION,
};
pub use store::{SnapshotStore, SnapshotStoreError};
pub use tree::{DocumentOrder, IntegrityError, NodeDraft, OutlineTree, TreeBuilder};
