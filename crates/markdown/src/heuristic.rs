use outlinewriter_core::{NodeDraft, NodeId, OutlineTree, TreeBuilder, UNTITLED};
use tracing::debug;

use crate::grammar::{classify, Line};

#[derive(Debug, Clone, Copy)]
enum Frame {
    Heading { id: NodeId, depth: usize },
    Bullet { id: NodeId, indent: usize },
}

impl Frame {
    fn id(&self) -> NodeId {
        match *self {
            Frame::Heading { id, .. } | Frame::Bullet { id, .. } => id,
        }
    }
}

/// Infers structure from Markdown heading levels and bullet indentation.
///
/// Bullets close every open bullet whose indent is greater than or equal to
/// their own; headings are only closed by a heading of equal or shallower
/// depth. Plain lines become content of the innermost open node, with separate
/// blocks of lines joined by a blank line.
pub(crate) fn parse(text: &str) -> OutlineTree {
    let mut builder = TreeBuilder::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut open_block: Option<NodeId> = None;

    for line in text.lines() {
        match classify(line) {
            Line::Blank => open_block = None,
            Line::Heading { depth, title } => {
                while matches!(stack.last(), Some(Frame::Bullet { .. }))
                    || matches!(stack.last(), Some(Frame::Heading { depth: open, .. }) if *open >= depth)
                {
                    stack.pop();
                }
                let parent = stack.last().map(Frame::id);
                let Some(id) = builder.push(parent, NodeDraft::heading(title)) else {
                    continue;
                };
                stack.push(Frame::Heading { id, depth });
                open_block = None;
            }
            Line::Bullet { indent, title } => {
                while matches!(stack.last(), Some(Frame::Bullet { indent: open, .. }) if *open >= indent)
                {
                    stack.pop();
                }
                let parent = stack.last().map(Frame::id);
                let Some(id) = builder.push(parent, NodeDraft::new(title)) else {
                    continue;
                };
                stack.push(Frame::Bullet { id, indent });
                open_block = None;
            }
            Line::Text(text) => {
                let target = match stack.last() {
                    Some(frame) => frame.id(),
                    None => {
                        debug!("content before the first item; holding it in a placeholder");
                        let Some(id) = builder.push(None, NodeDraft::new(UNTITLED)) else {
                            continue;
                        };
                        stack.push(Frame::Bullet { id, indent: 0 });
                        id
                    }
                };
                let separator = if open_block == Some(target) { "\n" } else { "\n\n" };
                builder.append_content(target, separator, text);
                open_block = Some(target);
            }
            Line::Annotation { .. } => {
                debug!(line = %line, "annotation line in heuristic input ignored");
            }
        }
    }
    builder.finish()
}
