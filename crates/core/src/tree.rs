use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, warn};

use crate::node::{normalize_title, Node, NodeEdit, NodeId, DEFAULT_NEW_TITLE};

/// Outline forest stored as an arena keyed by node id.
/// 以識別碼為索引的大綱樹（arena）。
///
/// Containment and ordering both live in the child-id lists (`roots` for the
/// top level). Every structural mutation finishes with
/// [`OutlineTree::recompute_hierarchy`], which also rewrites parent ids, so the
/// derived fields never go stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineTree {
    pub(crate) nodes: HashMap<NodeId, Node>,
    pub(crate) roots: Vec<NodeId>,
    pub(crate) next_id: u64,
}

impl Default for OutlineTree {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlineTree {
    /// Creates an empty outline whose first id will be 1.
    /// 建立空白大綱。
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            roots: Vec::new(),
            next_id: 1,
        }
    }

    /// The identifier the next created node will receive.
    /// 下一個將被配置的識別碼。
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level node ids in document order.
    /// 頂層節點（文件順序）。
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Looks up a node by identifier.
    /// 依識別碼尋找節點。
    pub fn find_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Returns the containing node; `None` for top-level or unknown ids.
    /// 取得包含該節點的父節點；頂層或未知節點回傳 `None`。
    pub fn find_parent(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(&id)
            .and_then(|node| node.parent)
            .and_then(|parent| self.nodes.get(&parent))
    }

    /// Returns the ids held by a sequence (`None` is the root sequence).
    /// 取得某個序列（`None` 為根序列）內的節點。
    pub fn children_of(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            None => &self.roots,
            Some(id) => self
                .nodes
                .get(&id)
                .map(|node| node.children.as_slice())
                .unwrap_or(&[]),
        }
    }

    /// Inserts a new node under `parent` (root when `None`); no-op for an unknown parent.
    /// 新增節點於指定父節點下；父節點不存在時不做任何事。
    ///
    /// `position` is clamped to the sequence length; `None` appends.
    pub fn create_node(
        &mut self,
        parent: Option<NodeId>,
        position: Option<usize>,
    ) -> Option<NodeId> {
        self.create_node_titled(parent, position, DEFAULT_NEW_TITLE)
    }

    /// Same as [`Self::create_node`] with an explicit title.
    /// 與 [`Self::create_node`] 相同，但可指定標題。
    pub fn create_node_titled(
        &mut self,
        parent: Option<NodeId>,
        position: Option<usize>,
        title: &str,
    ) -> Option<NodeId> {
        if let Some(parent_id) = parent {
            if !self.nodes.contains_key(&parent_id) {
                debug!(parent = %parent_id, "create skipped: unknown parent");
                return None;
            }
        }
        let id = self.allocate(title)?;
        let sequence = self.sequence_mut(parent)?;
        let index = position.unwrap_or(sequence.len()).min(sequence.len());
        sequence.insert(index, id);
        self.recompute_hierarchy();
        debug!(id = %id, index, "node created");
        Some(id)
    }

    /// Inserts a node right after `sibling`; appends at the root when the sibling is absent or unknown.
    /// 在指定兄弟節點之後新增節點；未知兄弟節點時附加至根序列。
    ///
    /// Returns `None` only once the id space is exhausted.
    pub fn create_node_after(&mut self, sibling: Option<NodeId>) -> Option<NodeId> {
        self.create_node_after_titled(sibling, DEFAULT_NEW_TITLE)
    }

    pub fn create_node_after_titled(
        &mut self,
        sibling: Option<NodeId>,
        title: &str,
    ) -> Option<NodeId> {
        let anchor = sibling
            .and_then(|id| self.nodes.get(&id))
            .map(|node| (node.id, node.parent));
        let (parent, index) = match anchor {
            Some((sibling_id, parent)) => {
                let sequence = self.children_of(parent);
                let index = sequence
                    .iter()
                    .position(|candidate| *candidate == sibling_id)
                    .map(|found| found + 1)
                    .unwrap_or(sequence.len());
                (parent, index)
            }
            None => (None, self.roots.len()),
        };

        let id = self.allocate(title)?;
        if let Some(sequence) = self.sequence_mut(parent) {
            let index = index.min(sequence.len());
            sequence.insert(index, id);
        }
        self.recompute_hierarchy();
        debug!(id = %id, "node created after sibling");
        Some(id)
    }

    /// Removes a node together with its whole subtree.
    /// 刪除節點及其整個子樹。
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes.get(&id).map(|node| node.parent) else {
            return false;
        };
        if let Some(sequence) = self.sequence_mut(parent) {
            sequence.retain(|candidate| *candidate != id);
        }

        let mut pending = vec![id];
        let mut removed = 0usize;
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                removed += 1;
                pending.extend(node.children);
            }
        }
        self.recompute_hierarchy();
        debug!(id = %id, removed, "subtree deleted");
        true
    }

    /// Makes the node the last child of its preceding sibling.
    /// 將節點移為前一個兄弟節點的最後一個子節點。
    pub fn indent(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes.get(&id).map(|node| node.parent) else {
            return false;
        };
        let siblings = self.children_of(parent);
        let Some(index) = siblings.iter().position(|candidate| *candidate == id) else {
            return false;
        };
        if index == 0 {
            return false;
        }
        let new_parent = siblings[index - 1];

        if let Some(sequence) = self.sequence_mut(parent) {
            sequence.remove(index);
        }
        if let Some(target) = self.nodes.get_mut(&new_parent) {
            target.children.push(id);
            target.expanded = true;
        }
        self.recompute_hierarchy();
        debug!(id = %id, parent = %new_parent, "node indented");
        true
    }

    /// Moves the node out of its parent, right after the former parent.
    /// 將節點移出父節點，放在原父節點之後。
    pub fn outdent(&mut self, id: NodeId) -> bool {
        let Some(parent_id) = self.nodes.get(&id).and_then(|node| node.parent) else {
            return false;
        };
        let grandparent = self.nodes.get(&parent_id).and_then(|node| node.parent);
        let Some(parent_index) = self
            .children_of(grandparent)
            .iter()
            .position(|candidate| *candidate == parent_id)
        else {
            return false;
        };

        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.retain(|candidate| *candidate != id);
        }
        if let Some(sequence) = self.sequence_mut(grandparent) {
            sequence.insert(parent_index + 1, id);
        }
        self.recompute_hierarchy();
        debug!(id = %id, "node outdented");
        true
    }

    /// Reassigns hierarchy paths, levels and parent ids in document order.
    /// 依文件順序重新計算路徑與深度。
    pub fn recompute_hierarchy(&mut self) {
        let roots = self.roots.clone();
        self.assign_paths(roots, None, "", 0);
    }

    fn assign_paths(
        &mut self,
        sequence: Vec<NodeId>,
        parent: Option<NodeId>,
        prefix: &str,
        level: usize,
    ) {
        for (index, id) in sequence.into_iter().enumerate() {
            let path = if prefix.is_empty() {
                (index + 1).to_string()
            } else {
                format!("{prefix}.{}", index + 1)
            };
            let children = match self.nodes.get_mut(&id) {
                Some(node) => {
                    node.parent = parent;
                    node.level = level;
                    node.hierarchy_path.clone_from(&path);
                    node.children.clone()
                }
                None => continue,
            };
            self.assign_paths(children, Some(id), &path, level + 1);
        }
    }

    /// Applies a text edit, returning whether anything changed.
    /// 更新標題、內容或標題旗標；回傳是否有變更。
    pub fn update_node(&mut self, id: NodeId, edit: &NodeEdit) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        let mut changed = false;
        if let Some(title) = &edit.title {
            let title = normalize_title(title.clone());
            if node.title != title {
                node.title = title;
                changed = true;
            }
        }
        if let Some(content) = &edit.content {
            if node.content != *content {
                node.content.clone_from(content);
                changed = true;
            }
        }
        if let Some(is_heading) = edit.is_heading {
            if node.is_heading != is_heading {
                node.is_heading = is_heading;
                changed = true;
            }
        }
        changed
    }

    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.expanded = expanded;
                true
            }
            None => false,
        }
    }

    /// Flips the expand flag, returning the new value.
    /// 切換展開狀態並回傳新狀態。
    pub fn toggle_expanded(&mut self, id: NodeId) -> Option<bool> {
        let node = self.nodes.get_mut(&id)?;
        node.expanded = !node.expanded;
        Some(node.expanded)
    }

    pub fn set_all_expanded(&mut self, expanded: bool) {
        for node in self.nodes.values_mut() {
            node.expanded = expanded;
        }
    }

    /// Sum of content lengths (in characters) over every node.
    /// 所有節點內容的字元總數。
    pub fn total_content_length(&self) -> usize {
        self.iter().map(|node| node.content.chars().count()).sum()
    }

    /// Chain from the top-level ancestor down to the node itself.
    /// 從頂層祖先到節點本身的鏈（麵包屑）。
    pub fn ancestors(&self, id: NodeId) -> Vec<&Node> {
        let mut chain = Vec::new();
        let mut current = self.nodes.get(&id);
        while let Some(node) = current {
            chain.push(node);
            current = node.parent.and_then(|parent| self.nodes.get(&parent));
        }
        chain.reverse();
        chain
    }

    /// Pre-order traversal in document order.
    /// 以前序（文件順序）走訪所有節點。
    pub fn iter(&self) -> DocumentOrder<'_> {
        DocumentOrder {
            tree: self,
            pending: self.roots.iter().rev().copied().collect(),
        }
    }

    /// Checks the forest invariants and derived fields.
    /// 驗證樹狀結構的不變量。
    pub fn verify(&self) -> Result<(), IntegrityError> {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        let mut pending: Vec<(NodeId, Option<NodeId>, String, usize)> = self
            .roots
            .iter()
            .enumerate()
            .rev()
            .map(|(index, id)| (*id, None, (index + 1).to_string(), 0))
            .collect();

        while let Some((id, parent, path, level)) = pending.pop() {
            if !seen.insert(id) {
                return Err(IntegrityError::DuplicateReference(id));
            }
            let node = self.nodes.get(&id).ok_or(IntegrityError::MissingNode(id))?;
            if node.id != id {
                return Err(IntegrityError::MissingNode(id));
            }
            if id.as_u64() == 0 || id.as_u64() >= self.next_id {
                return Err(IntegrityError::IdOutOfRange {
                    id,
                    next_id: self.next_id,
                });
            }
            if node.parent != parent {
                return Err(IntegrityError::ParentMismatch {
                    id,
                    expected: parent,
                    found: node.parent,
                });
            }
            if node.hierarchy_path != path || node.level != level {
                return Err(IntegrityError::StalePath {
                    id,
                    expected: path,
                    found: node.hierarchy_path.clone(),
                });
            }
            for (index, child) in node.children.iter().enumerate().rev() {
                pending.push((*child, Some(id), format!("{path}.{}", index + 1), level + 1));
            }
        }

        if seen.len() != self.nodes.len() {
            let orphan = self
                .nodes
                .keys()
                .filter(|id| !seen.contains(id))
                .min()
                .copied();
            if let Some(orphan) = orphan {
                return Err(IntegrityError::Unreachable(orphan));
            }
        }
        Ok(())
    }

    fn allocate(&mut self, title: &str) -> Option<NodeId> {
        let Some(next) = self.next_id.checked_add(1) else {
            warn!(next_id = self.next_id, "node ids exhausted; create skipped");
            return None;
        };
        let id = NodeId::new(self.next_id);
        self.next_id = next;
        self.nodes.insert(id, Node::new(id, title));
        Some(id)
    }

    fn sequence_mut(&mut self, parent: Option<NodeId>) -> Option<&mut Vec<NodeId>> {
        match parent {
            None => Some(&mut self.roots),
            Some(id) => self.nodes.get_mut(&id).map(|node| &mut node.children),
        }
    }
}

/// Pre-order iterator over an [`OutlineTree`].
/// 前序走訪迭代器。
pub struct DocumentOrder<'a> {
    tree: &'a OutlineTree,
    pending: Vec<NodeId>,
}

impl<'a> Iterator for DocumentOrder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.pending.pop() {
            if let Some(node) = self.tree.nodes.get(&id) {
                self.pending.extend(node.children.iter().rev().copied());
                return Some(node);
            }
        }
        None
    }
}

/// Draft describing a node to be appended through [`TreeBuilder`].
/// 描述新節點內容的草稿。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeDraft {
    pub title: String,
    pub content: String,
    pub is_heading: bool,
}

impl NodeDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: String::new(),
            is_heading: false,
        }
    }

    pub fn heading(title: impl Into<String>) -> Self {
        Self {
            is_heading: true,
            ..Self::new(title)
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// Builds a replacement tree node by node; paths are computed once in [`TreeBuilder::finish`].
/// 逐一附加節點以建立整棵新樹，完成時才計算路徑。
#[derive(Debug, Default)]
pub struct TreeBuilder {
    tree: OutlineTree,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node; an unknown parent falls back to the top level.
    /// 附加節點；未知父節點時改掛在頂層。
    pub fn push(&mut self, parent: Option<NodeId>, draft: NodeDraft) -> Option<NodeId> {
        let id = self.tree.allocate(&draft.title)?;
        if let Some(node) = self.tree.nodes.get_mut(&id) {
            node.content = draft.content;
            node.is_heading = draft.is_heading;
        }
        let parent = parent.filter(|candidate| self.tree.nodes.contains_key(candidate));
        if let Some(sequence) = self.tree.sequence_mut(parent) {
            sequence.push(id);
        }
        Some(id)
    }

    /// Appends text to a node's content, joined by `separator` when content already exists.
    /// 將文字附加到節點內容，已有內容時以 `separator` 連接。
    pub fn append_content(&mut self, id: NodeId, separator: &str, text: &str) -> bool {
        let Some(node) = self.tree.nodes.get_mut(&id) else {
            return false;
        };
        if !node.content.is_empty() {
            node.content.push_str(separator);
        }
        node.content.push_str(text);
        true
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn finish(mut self) -> OutlineTree {
        self.tree.recompute_hierarchy();
        self.tree
    }
}

/// Violations reported by [`OutlineTree::verify`].
/// 結構不變量遭破壞時的錯誤。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("node {0} is referenced but missing from the arena")]
    MissingNode(NodeId),
    #[error("node {0} appears more than once in the containment structure")]
    DuplicateReference(NodeId),
    #[error("node {0} is stored but not reachable from the roots")]
    Unreachable(NodeId),
    #[error("node {id} records parent {found:?} but is contained by {expected:?}")]
    ParentMismatch {
        id: NodeId,
        expected: Option<NodeId>,
        found: Option<NodeId>,
    },
    #[error("node {id} has hierarchy path {found:?}, expected {expected:?}")]
    StalePath {
        id: NodeId,
        expected: String,
        found: String,
    },
    #[error("node {id} is outside the allocated id range (next id {next_id})")]
    IdOutOfRange { id: NodeId, next_id: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(tree: &OutlineTree, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|id| tree.find_node(*id).unwrap().title().to_string())
            .collect()
    }

    fn titled(tree: &mut OutlineTree, parent: Option<NodeId>, title: &str) -> NodeId {
        tree.create_node_titled(parent, None, title).unwrap()
    }

    #[test]
    fn paths_follow_document_order() {
        let mut tree = OutlineTree::new();
        let a = titled(&mut tree, None, "A");
        let b = titled(&mut tree, None, "B");
        let c = titled(&mut tree, Some(a), "C");

        assert_eq!(tree.find_node(a).unwrap().hierarchy_path(), "1");
        assert_eq!(tree.find_node(b).unwrap().hierarchy_path(), "2");
        let c_node = tree.find_node(c).unwrap();
        assert_eq!(c_node.hierarchy_path(), "1.1");
        assert_eq!(c_node.level(), 1);
        assert_eq!(c_node.parent(), Some(a));

        let before = tree.clone();
        tree.recompute_hierarchy();
        assert_eq!(tree, before);
        tree.verify().unwrap();
    }

    #[test]
    fn create_with_unknown_parent_is_noop() {
        let mut tree = OutlineTree::new();
        assert_eq!(tree.create_node(Some(NodeId::new(42)), None), None);
        assert!(tree.is_empty());
        assert_eq!(tree.next_id(), 1);
    }

    #[test]
    fn create_at_position_clamps() {
        let mut tree = OutlineTree::new();
        let a = titled(&mut tree, None, "A");
        let b = tree.create_node_titled(None, Some(0), "B").unwrap();
        let c = tree.create_node_titled(None, Some(99), "C").unwrap();
        assert_eq!(tree.roots(), &[b, a, c]);
        assert_eq!(tree.find_node(b).unwrap().title(), "B");
    }

    #[test]
    fn create_after_inserts_next_to_sibling() {
        let mut tree = OutlineTree::new();
        let a = titled(&mut tree, None, "A");
        let child_one = titled(&mut tree, Some(a), "one");
        let child_two = titled(&mut tree, Some(a), "two");

        let inserted = tree.create_node_after(Some(child_one)).unwrap();
        let parent = tree.find_node(a).unwrap();
        assert_eq!(parent.children(), &[child_one, inserted, child_two]);
        assert_eq!(tree.find_node(inserted).unwrap().title(), DEFAULT_NEW_TITLE);
        assert_eq!(tree.find_node(inserted).unwrap().hierarchy_path(), "1.2");

        let orphan = tree.create_node_after(Some(NodeId::new(999))).unwrap();
        assert_eq!(tree.roots().last(), Some(&orphan));
        let appended = tree.create_node_after(None).unwrap();
        assert_eq!(tree.roots().last(), Some(&appended));
        tree.verify().unwrap();
    }

    #[test]
    fn delete_removes_entire_subtree() {
        let mut tree = OutlineTree::new();
        let a = titled(&mut tree, None, "A");
        let b = titled(&mut tree, Some(a), "B");
        let c = titled(&mut tree, Some(b), "C");
        let d = titled(&mut tree, None, "D");

        assert!(tree.delete_node(a));
        assert!(tree.find_node(b).is_none());
        assert!(tree.find_node(c).is_none());
        assert_eq!(tree.roots(), &[d]);
        assert_eq!(tree.find_node(d).unwrap().hierarchy_path(), "1");
        assert!(!tree.delete_node(a));

        let e = tree.create_node(None, None).unwrap();
        assert!(e.as_u64() > c.as_u64(), "ids are never reused");
        tree.verify().unwrap();
    }

    #[test]
    fn indent_moves_under_previous_sibling() {
        let mut tree = OutlineTree::new();
        let a = titled(&mut tree, None, "A");
        let b = titled(&mut tree, None, "B");
        titled(&mut tree, Some(a), "A1");
        tree.set_expanded(a, false);

        assert!(!tree.indent(a), "first node cannot be indented");
        assert!(tree.indent(b));
        let parent = tree.find_node(a).unwrap();
        assert!(parent.is_expanded());
        assert_eq!(titles(&tree, parent.children()), vec!["A1", "B"]);
        assert_eq!(tree.find_node(b).unwrap().hierarchy_path(), "1.2");
        assert_eq!(tree.find_parent(b).map(Node::id), Some(a));
        tree.verify().unwrap();
    }

    #[test]
    fn outdent_places_after_former_parent() {
        let mut tree = OutlineTree::new();
        let a = titled(&mut tree, None, "A");
        let a1 = titled(&mut tree, Some(a), "A1");
        let a2 = titled(&mut tree, Some(a), "A2");
        let b = titled(&mut tree, None, "B");

        assert!(!tree.outdent(a));
        assert!(tree.outdent(a1));
        assert_eq!(tree.roots(), &[a, a1, b]);
        assert_eq!(tree.find_node(a).unwrap().children(), &[a2]);
        assert_eq!(tree.find_node(a1).unwrap().parent(), None);
        assert_eq!(tree.find_node(a1).unwrap().level(), 0);
        tree.verify().unwrap();
    }

    #[test]
    fn indent_then_outdent_restores_parent() {
        let mut tree = OutlineTree::new();
        let root = titled(&mut tree, None, "root");
        let first = titled(&mut tree, Some(root), "first");
        let second = titled(&mut tree, Some(root), "second");
        let third = titled(&mut tree, Some(root), "third");

        assert!(tree.indent(second));
        assert_eq!(tree.find_node(second).unwrap().parent(), Some(first));
        assert!(tree.outdent(second));
        assert_eq!(tree.find_node(second).unwrap().parent(), Some(root));
        assert_eq!(tree.find_node(root).unwrap().children(), &[first, second, third]);
    }

    #[test]
    fn expand_flags_do_not_touch_structure() {
        let mut tree = OutlineTree::new();
        let a = titled(&mut tree, None, "A");
        let b = titled(&mut tree, Some(a), "B");
        let before: Vec<String> = tree.iter().map(|n| n.hierarchy_path().to_string()).collect();

        tree.set_all_expanded(false);
        assert!(tree.iter().all(|node| !node.is_expanded()));
        assert_eq!(tree.toggle_expanded(b), Some(true));
        assert_eq!(tree.toggle_expanded(NodeId::new(77)), None);
        assert!(!tree.set_expanded(NodeId::new(77), true));

        let after: Vec<String> = tree.iter().map(|n| n.hierarchy_path().to_string()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn content_length_counts_characters() {
        let mut tree = OutlineTree::new();
        let a = titled(&mut tree, None, "A");
        let b = titled(&mut tree, Some(a), "B");
        tree.update_node(a, &NodeEdit::default().content("hello"));
        tree.update_node(b, &NodeEdit::default().content("你好"));
        assert_eq!(tree.total_content_length(), 7);
    }

    #[test]
    fn update_node_reports_changes() {
        let mut tree = OutlineTree::new();
        let a = titled(&mut tree, None, "A");
        assert!(tree.update_node(a, &NodeEdit::default().title("  ")));
        assert_eq!(tree.find_node(a).unwrap().title(), crate::UNTITLED);
        assert!(!tree.update_node(a, &NodeEdit::default().title("Untitled")));
        assert!(tree.update_node(a, &NodeEdit::default().heading(true)));
        assert!(!tree.update_node(NodeId::new(9), &NodeEdit::default().title("x")));
    }

    #[test]
    fn ancestors_run_top_down() {
        let mut tree = OutlineTree::new();
        let a = titled(&mut tree, None, "A");
        let b = titled(&mut tree, Some(a), "B");
        let c = titled(&mut tree, Some(b), "C");
        let chain: Vec<&str> = tree.ancestors(c).into_iter().map(Node::title).collect();
        assert_eq!(chain, vec!["A", "B", "C"]);
        assert!(tree.ancestors(NodeId::new(50)).is_empty());
    }

    #[test]
    fn iter_is_pre_order() {
        let mut tree = OutlineTree::new();
        let a = titled(&mut tree, None, "A");
        titled(&mut tree, Some(a), "A1");
        let b = titled(&mut tree, None, "B");
        titled(&mut tree, Some(b), "B1");
        let order: Vec<&str> = tree.iter().map(Node::title).collect();
        assert_eq!(order, vec!["A", "A1", "B", "B1"]);
    }

    #[test]
    fn verify_detects_stale_parent() {
        let mut tree = OutlineTree::new();
        let a = titled(&mut tree, None, "A");
        let b = titled(&mut tree, Some(a), "B");
        tree.nodes.get_mut(&b).unwrap().parent = None;
        assert_eq!(
            tree.verify(),
            Err(IntegrityError::ParentMismatch {
                id: b,
                expected: Some(a),
                found: None,
            })
        );
    }

    #[test]
    fn builder_falls_back_to_top_level() {
        let mut builder = TreeBuilder::new();
        let heading = builder.push(None, NodeDraft::heading("Intro")).unwrap();
        let child = builder
            .push(Some(heading), NodeDraft::new("child").with_content("a"))
            .unwrap();
        builder.append_content(child, "\n", "b");
        let stray = builder
            .push(Some(NodeId::new(404)), NodeDraft::new("stray"))
            .unwrap();
        let tree = builder.finish();

        assert_eq!(tree.roots(), &[heading, stray]);
        assert_eq!(tree.find_node(child).unwrap().content(), "a\nb");
        assert_eq!(tree.find_node(child).unwrap().hierarchy_path(), "1.1");
        assert_eq!(tree.next_id(), 4);
        tree.verify().unwrap();
    }
}
