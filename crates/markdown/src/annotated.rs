use std::collections::{BTreeMap, HashMap};

use outlinewriter_core::{NodeDraft, NodeId, OutlineTree, TreeBuilder};
use tracing::{debug, warn};

use crate::grammar::{classify, Line};

struct PendingNode {
    path: Vec<u64>,
    level: usize,
    title: Option<(String, bool)>,
    content: Vec<String>,
}

impl PendingNode {
    fn into_draft(self) -> Option<(Vec<u64>, NodeDraft)> {
        let Some((title, is_heading)) = self.title else {
            warn!(path = ?self.path, "annotation without a title line dropped");
            return None;
        };
        if self.level.checked_add(1) != Some(self.path.len()) {
            debug!(path = ?self.path, level = self.level, "annotation level disagrees with path");
        }
        let draft = NodeDraft {
            title,
            content: self.content.join("\n"),
            is_heading,
        };
        Some((self.path, draft))
    }
}

/// Rebuilds a tree from the annotated dialect.
///
/// Nodes are keyed by their hierarchy path. Sorting the keys segment-wise puts
/// every parent before its children and siblings in numeric order; a node whose
/// parent path is missing is attached at the top level.
pub(crate) fn parse(text: &str) -> OutlineTree {
    let mut entries: BTreeMap<Vec<u64>, NodeDraft> = BTreeMap::new();
    let mut current: Option<PendingNode> = None;

    for line in text.lines() {
        match classify(line) {
            Line::Annotation { path, level } => {
                finish(current.take(), &mut entries);
                match path {
                    Some(path) => {
                        current = Some(PendingNode {
                            path,
                            level,
                            title: None,
                            content: Vec::new(),
                        });
                    }
                    None => warn!(line = %line, "annotation with an invalid path skipped"),
                }
            }
            Line::Blank => {}
            Line::Heading { title, .. } => set_title(&mut current, title, true),
            Line::Bullet { title, .. } => set_title(&mut current, title, false),
            Line::Text(text) => match current.as_mut() {
                Some(pending) if pending.title.is_some() => {
                    pending.content.push(text.to_string());
                }
                Some(pending) => {
                    warn!(path = ?pending.path, "annotation not followed by a heading or bullet");
                    current = None;
                }
                None => debug!(line = text, "text outside any annotated node ignored"),
            },
        }
    }
    finish(current.take(), &mut entries);

    let mut builder = TreeBuilder::new();
    let mut ids: HashMap<Vec<u64>, NodeId> = HashMap::with_capacity(entries.len());
    for (path, draft) in entries {
        let parent = match path.split_last() {
            Some((_, prefix)) if !prefix.is_empty() => {
                let parent = ids.get(prefix).copied();
                if parent.is_none() {
                    debug!(path = ?path, "parent path missing; attaching at top level");
                }
                parent
            }
            _ => None,
        };
        if let Some(id) = builder.push(parent, draft) {
            ids.insert(path, id);
        }
    }
    builder.finish()
}

fn finish(pending: Option<PendingNode>, entries: &mut BTreeMap<Vec<u64>, NodeDraft>) {
    if let Some((path, draft)) = pending.and_then(PendingNode::into_draft) {
        if entries.insert(path.clone(), draft).is_some() {
            warn!(path = ?path, "duplicate hierarchy path; keeping the later node");
        }
    }
}

fn set_title(current: &mut Option<PendingNode>, title: &str, is_heading: bool) {
    match current.as_mut() {
        Some(pending) if pending.title.is_none() => {
            pending.title = Some((title.to_string(), is_heading));
        }
        Some(pending) => {
            debug!(path = ?pending.path, title = %title, "extra marker line inside node ignored");
        }
        None => debug!(title = %title, "marker line outside any annotated node ignored"),
    }
}
