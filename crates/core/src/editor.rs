use tracing::debug;

use crate::history::{History, DEFAULT_HISTORY_CAPACITY};
use crate::node::{NodeEdit, NodeId, DEFAULT_NEW_TITLE};
use crate::snapshot::{parse_snapshot, SnapshotError};
use crate::tree::OutlineTree;

/// Options for an [`OutlineEditor`] session.
/// 編輯工作階段的設定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorOptions {
    pub history_capacity: usize,
    pub new_item_title: String,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            new_item_title: DEFAULT_NEW_TITLE.to_string(),
        }
    }
}

/// Outline editing engine owning the live tree and its undo history.
/// 大綱編輯引擎：擁有樹與復原紀錄。
///
/// Every operation that changes the tree commits one deep snapshot. Expand and
/// collapse are view state and are not committed.
#[derive(Debug, Clone)]
pub struct OutlineEditor {
    tree: OutlineTree,
    history: History<OutlineTree>,
    new_item_title: String,
}

impl Default for OutlineEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlineEditor {
    pub fn new() -> Self {
        Self::with_options(EditorOptions::default())
    }

    pub fn with_options(options: EditorOptions) -> Self {
        Self::from_tree(OutlineTree::new(), options)
    }

    /// Starts a session from an existing tree, committing it as the first snapshot.
    /// 以既有的樹開始工作階段，並記錄為第一個快照。
    pub fn from_tree(tree: OutlineTree, options: EditorOptions) -> Self {
        let mut editor = Self {
            tree,
            history: History::new(options.history_capacity),
            new_item_title: options.new_item_title,
        };
        editor.commit();
        editor
    }

    /// Read-only view of the live outline.
    /// 目前大綱的唯讀檢視。
    pub fn tree(&self) -> &OutlineTree {
        &self.tree
    }

    pub fn history(&self) -> &History<OutlineTree> {
        &self.history
    }

    pub fn into_tree(self) -> OutlineTree {
        self.tree
    }

    pub fn add_item(&mut self, parent: Option<NodeId>, position: Option<usize>) -> Option<NodeId> {
        let id = self
            .tree
            .create_node_titled(parent, position, &self.new_item_title)?;
        self.commit();
        Some(id)
    }

    /// Adds an item after `sibling`, or at the end when there is none.
    /// 在指定項目之後新增；沒有目前項目時附加到最後。
    pub fn add_item_after(&mut self, sibling: Option<NodeId>) -> Option<NodeId> {
        let id = self
            .tree
            .create_node_after_titled(sibling, &self.new_item_title)?;
        self.commit();
        Some(id)
    }

    /// Deletes an item and its subtree; confirmation is the caller's job.
    /// 刪除項目；確認流程由呼叫端負責。
    pub fn delete_item(&mut self, id: NodeId) -> bool {
        self.commit_if(|tree| tree.delete_node(id))
    }

    pub fn indent(&mut self, id: NodeId) -> bool {
        self.commit_if(|tree| tree.indent(id))
    }

    pub fn outdent(&mut self, id: NodeId) -> bool {
        self.commit_if(|tree| tree.outdent(id))
    }

    pub fn update_item(&mut self, id: NodeId, edit: &NodeEdit) -> bool {
        self.commit_if(|tree| tree.update_node(id, edit))
    }

    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) -> bool {
        self.tree.set_expanded(id, expanded)
    }

    pub fn toggle_expanded(&mut self, id: NodeId) -> Option<bool> {
        self.tree.toggle_expanded(id)
    }

    pub fn set_all_expanded(&mut self, expanded: bool) {
        self.tree.set_all_expanded(expanded);
    }

    /// Replaces the whole outline, e.g. after an import or backup restore.
    /// 以新的樹取代目前內容（匯入、備份還原）。
    pub fn replace_tree(&mut self, tree: OutlineTree) {
        self.tree = tree;
        self.commit();
    }

    /// Imports a structured snapshot, leaving the outline untouched on failure.
    /// 匯入結構化快照；失敗時保持目前內容不變。
    pub fn import_snapshot(&mut self, text: &str) -> Result<(), SnapshotError> {
        let tree = OutlineTree::from_record(parse_snapshot(text)?)?;
        self.replace_tree(tree);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restores the previous snapshot; `false` when nothing to undo.
    /// 復原到前一個快照。
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.tree = snapshot.clone();
                debug!(position = ?self.history.position(), "undo");
                true
            }
            None => false,
        }
    }

    /// Restores the next snapshot; `false` when nothing to redo.
    /// 重做下一個快照。
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.tree = snapshot.clone();
                debug!(position = ?self.history.position(), "redo");
                true
            }
            None => false,
        }
    }

    fn commit_if<F>(&mut self, op: F) -> bool
    where
        F: FnOnce(&mut OutlineTree) -> bool,
    {
        let changed = op(&mut self.tree);
        if changed {
            self.commit();
        }
        changed
    }

    fn commit(&mut self) {
        self.history.commit(self.tree.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_committed() {
        let editor = OutlineEditor::new();
        assert_eq!(editor.history().len(), 1);
        assert!(!editor.can_undo());
        assert!(!editor.can_redo());
    }

    #[test]
    fn undo_restores_previous_structure() {
        let mut editor = OutlineEditor::new();
        let a = editor.add_item(None, None).unwrap();
        let b = editor.add_item_after(Some(a)).unwrap();
        assert!(editor.indent(b));
        assert_eq!(editor.tree().find_node(b).unwrap().parent(), Some(a));

        assert!(editor.undo());
        assert_eq!(editor.tree().find_node(b).unwrap().parent(), None);
        assert!(editor.redo());
        assert_eq!(editor.tree().find_node(b).unwrap().parent(), Some(a));
    }

    #[test]
    fn noop_operations_do_not_commit() {
        let mut editor = OutlineEditor::new();
        let a = editor.add_item(None, None).unwrap();
        let len = editor.history().len();

        assert!(!editor.indent(a));
        assert!(!editor.outdent(a));
        assert!(!editor.delete_item(NodeId::new(99)));
        assert_eq!(editor.add_item(Some(NodeId::new(99)), None), None);
        assert!(!editor.update_item(a, &NodeEdit::default()));
        editor.set_all_expanded(false);
        assert_eq!(editor.history().len(), len);
    }

    #[test]
    fn new_edit_after_undo_drops_redo() {
        let mut editor = OutlineEditor::new();
        let a = editor.add_item(None, None).unwrap();
        editor.update_item(a, &NodeEdit::default().title("first"));
        assert!(editor.undo());
        editor.update_item(a, &NodeEdit::default().title("second"));
        assert!(!editor.redo());
        assert_eq!(editor.tree().find_node(a).unwrap().title(), "second");
    }

    #[test]
    fn snapshots_are_independent_of_live_tree() {
        let mut editor = OutlineEditor::new();
        let a = editor.add_item(None, None).unwrap();
        editor.update_item(a, &NodeEdit::default().content("kept"));
        editor.update_item(a, &NodeEdit::default().content("changed"));
        assert!(editor.undo());
        assert_eq!(editor.tree().find_node(a).unwrap().content(), "kept");
    }

    #[test]
    fn custom_title_and_capacity() {
        let mut editor = OutlineEditor::with_options(EditorOptions {
            history_capacity: 2,
            new_item_title: "Idea".to_string(),
        });
        let a = editor.add_item(None, None).unwrap();
        editor.add_item(None, None);
        assert_eq!(editor.tree().find_node(a).unwrap().title(), "Idea");
        assert_eq!(editor.history().len(), 2);
        assert!(editor.undo());
        assert!(!editor.undo());
    }

    #[test]
    fn unbounded_history_capacity() {
        let mut editor = OutlineEditor::with_options(EditorOptions {
            history_capacity: usize::MAX,
            ..EditorOptions::default()
        });
        editor.add_item(None, None);
        assert_eq!(editor.history().capacity(), usize::MAX);
        assert!(editor.undo());
    }

    #[test]
    fn failed_import_keeps_current_outline() {
        let mut editor = OutlineEditor::new();
        editor.add_item(None, None);
        let before = editor.tree().clone();
        assert!(editor.import_snapshot(r#"{"nope": true}"#).is_err());
        assert_eq!(editor.tree(), &before);

        editor
            .import_snapshot(r#"{"items": [{"id": 7, "title": "Loaded"}], "nextId": 8}"#)
            .unwrap();
        assert_eq!(editor.tree().len(), 1);
        assert!(editor.undo());
        assert_eq!(editor.tree(), &before);
    }
}
