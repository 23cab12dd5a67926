use std::fmt;

use serde::{Deserialize, Serialize};

/// Title given to freshly created items.
/// 新增項目時使用的預設標題。
pub const DEFAULT_NEW_TITLE: &str = "New Item";

/// Placeholder used whenever a title is left blank.
/// 標題為空白時的替代文字。
pub const UNTITLED: &str = "Untitled";

/// Unique identifier of an outline node; never reused.
/// 大綱節點的唯一識別碼，永不重複使用。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// A single outline entry stored in the tree arena.
/// 大綱樹中的單一項目。
///
/// Structural fields (`parent`, `children`, `hierarchy_path`, `level`) are owned
/// by [`crate::OutlineTree`] and only exposed for reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) is_heading: bool,
    pub(crate) expanded: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) hierarchy_path: String,
    pub(crate) level: usize,
}

impl Node {
    pub(crate) fn new(id: NodeId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: normalize_title(title.into()),
            content: String::new(),
            is_heading: false,
            expanded: true,
            parent: None,
            children: Vec::new(),
            hierarchy_path: String::new(),
            level: 0,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_heading(&self) -> bool {
        self.is_heading
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Parent identifier, `None` for top-level nodes.
    /// 父節點識別碼；頂層節點為 `None`。
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child identifiers in document order.
    /// 依文件順序排列的子節點識別碼。
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Dotted 1-based position path such as `2.1.3`.
    /// 以點分隔、從 1 起算的位置路徑（例如 `2.1.3`）。
    pub fn hierarchy_path(&self) -> &str {
        &self.hierarchy_path
    }

    /// Zero-based depth.
    /// 從 0 起算的深度。
    pub fn level(&self) -> usize {
        self.level
    }
}

/// Edit applied to a node's text fields; `None` keeps the current value.
/// 對單一節點內容的修改；`None` 代表保留原值。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeEdit {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_heading: Option<bool>,
}

impl NodeEdit {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn heading(mut self, is_heading: bool) -> Self {
        self.is_heading = Some(is_heading);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.is_heading.is_none()
    }
}

pub(crate) fn normalize_title(title: String) -> String {
    if title.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}
