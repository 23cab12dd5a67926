//! Persisted snapshot format shared with storage and sync collaborators.
//! 與儲存及同步協作者共用的快照格式。

use std::collections::HashMap;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::node::{normalize_title, Node, NodeId};
use crate::tree::{IntegrityError, OutlineTree};

/// Format version written into snapshot envelopes.
/// 快照封套的格式版本。
pub const SNAPSHOT_FORMAT_VERSION: &str = "1.0";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Bare snapshot record: the root sequence plus the id counter.
/// 裸快照紀錄：根序列與下一個識別碼。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineRecord {
    pub items: Vec<ItemRecord>,
    #[serde(default)]
    pub next_id: u64,
}

/// Serialized form of a single node.
/// 序列化後的單一節點。
///
/// `parentId`, `hierarchyPath` and `level` are written for readers that want
/// them but are recomputed from containment on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_heading: bool,
    #[serde(default)]
    pub children: Vec<ItemRecord>,
    #[serde(default = "default_expanded")]
    pub expanded: bool,
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub hierarchy_path: String,
    #[serde(default)]
    pub level: usize,
}

fn default_expanded() -> bool {
    true
}

/// Snapshot envelope carrying a human-readable timestamp and version tag.
/// 附帶時間戳與版本的快照封套。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEnvelope {
    pub timestamp: String,
    #[serde(default)]
    pub version: String,
    pub data: OutlineRecord,
}

impl SnapshotEnvelope {
    /// Wraps a record stamped with the current local time.
    /// 以目前時間包裝紀錄。
    pub fn new(data: OutlineRecord) -> Self {
        Self::labelled(data, "")
    }

    /// Wraps a record with a labelled timestamp such as `Auto backup - ...`.
    /// 以前綴標籤加上目前時間包裝紀錄。
    pub fn labelled(data: OutlineRecord, label: &str) -> Self {
        let now = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let timestamp = if label.is_empty() {
            now
        } else {
            format!("{label} - {now}")
        };
        Self {
            timestamp,
            version: SNAPSHOT_FORMAT_VERSION.to_string(),
            data,
        }
    }

    /// Parses the timestamp, ignoring any label prefix.
    /// 解析時間戳（忽略標籤前綴）。
    pub fn recorded_at(&self) -> Option<NaiveDateTime> {
        let stamp = self
            .timestamp
            .rsplit_once(" - ")
            .map_or(self.timestamp.as_str(), |(_, stamp)| stamp);
        NaiveDateTime::parse_from_str(stamp.trim(), TIMESTAMP_FORMAT).ok()
    }
}

/// Reasons a structured snapshot is rejected.
/// 快照匯入失敗的原因。
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot must be a JSON object")]
    NotAnObject,
    #[error("snapshot has neither an `items` nor a `data` field")]
    MissingItems,
    #[error("snapshot has an invalid shape: {0}")]
    InvalidShape(String),
    #[error("snapshot uses reserved node id 0")]
    ZeroId,
    #[error("snapshot contains node id {0} more than once")]
    DuplicateId(u64),
    #[error("snapshot node id {0} leaves no room for further ids")]
    IdOverflow(u64),
    #[error("snapshot failed integrity check: {0}")]
    Integrity(#[from] IntegrityError),
}

/// Parses either a bare record or an enveloped snapshot.
/// 解析裸紀錄或封套形式的快照。
///
/// Detection follows the payload shape: a nested `data` field marks an
/// envelope, a direct `items` field marks a bare record.
pub fn parse_snapshot(text: &str) -> Result<OutlineRecord, SnapshotError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(mut map) = value else {
        return Err(SnapshotError::NotAnObject);
    };
    let record = if let Some(data) = map.remove("data") {
        debug!("snapshot payload is enveloped");
        data
    } else if map.contains_key("items") {
        Value::Object(map)
    } else {
        return Err(SnapshotError::MissingItems);
    };
    serde_json::from_value(record).map_err(|err| SnapshotError::InvalidShape(err.to_string()))
}

/// Parses a snapshot and rebuilds the outline tree from it.
/// 解析快照並重建大綱樹。
pub fn import_snapshot(text: &str) -> Result<OutlineTree, SnapshotError> {
    let record = parse_snapshot(text)?;
    OutlineTree::from_record(record)
}

/// Serializes the tree as an enveloped, pretty-printed snapshot.
/// 以封套形式輸出快照 JSON。
pub fn export_snapshot(tree: &OutlineTree) -> Result<String, SnapshotError> {
    let envelope = SnapshotEnvelope::new(tree.to_record());
    Ok(serde_json::to_string_pretty(&envelope)?)
}

impl OutlineTree {
    /// Converts the tree into its serializable record.
    /// 轉成可序列化的紀錄（深層複製）。
    pub fn to_record(&self) -> OutlineRecord {
        OutlineRecord {
            items: self
                .roots
                .iter()
                .filter_map(|id| self.item_record(*id))
                .collect(),
            next_id: self.next_id,
        }
    }

    fn item_record(&self, id: NodeId) -> Option<ItemRecord> {
        let node = self.nodes.get(&id)?;
        Some(ItemRecord {
            id: node.id.as_u64(),
            title: node.title.clone(),
            content: node.content.clone(),
            is_heading: node.is_heading,
            children: node
                .children
                .iter()
                .filter_map(|child| self.item_record(*child))
                .collect(),
            expanded: node.expanded,
            parent_id: node.parent.map(|parent| parent.as_u64()),
            hierarchy_path: node.hierarchy_path.clone(),
            level: node.level,
        })
    }

    /// Rebuilds a tree from a record, rejecting duplicate ids.
    /// 由紀錄重建大綱樹；識別碼重複時拒絕。
    ///
    /// Derived fields are recomputed from containment and the id counter is
    /// moved past the highest id present.
    pub fn from_record(record: OutlineRecord) -> Result<Self, SnapshotError> {
        let mut nodes = HashMap::new();
        let mut roots = Vec::with_capacity(record.items.len());
        let mut max_id = 0;
        for item in record.items {
            roots.push(insert_record(item, &mut nodes, &mut max_id)?);
        }

        let after_max = max_id
            .checked_add(1)
            .ok_or(SnapshotError::IdOverflow(max_id))?;
        let mut tree = OutlineTree {
            nodes,
            roots,
            next_id: record.next_id.max(after_max),
        };
        tree.recompute_hierarchy();
        tree.verify()?;
        debug!(nodes = tree.len(), next_id = tree.next_id, "snapshot restored");
        Ok(tree)
    }
}

fn insert_record(
    item: ItemRecord,
    nodes: &mut HashMap<NodeId, Node>,
    max_id: &mut u64,
) -> Result<NodeId, SnapshotError> {
    if item.id == 0 {
        return Err(SnapshotError::ZeroId);
    }
    let id = NodeId::new(item.id);
    if nodes.contains_key(&id) {
        return Err(SnapshotError::DuplicateId(item.id));
    }
    *max_id = (*max_id).max(item.id);

    let mut node = Node::new(id, normalize_title(item.title));
    node.content = item.content;
    node.is_heading = item.is_heading;
    node.expanded = item.expanded;
    nodes.insert(id, node);

    let mut children = Vec::with_capacity(item.children.len());
    for child in item.children {
        children.push(insert_record(child, nodes, max_id)?);
    }
    if let Some(node) = nodes.get_mut(&id) {
        node.children = children;
    }
    Ok(id)
}
