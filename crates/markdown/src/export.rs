use outlinewriter_core::{NodeId, OutlineTree};

use crate::grammar::annotation;

const MAX_HEADING_DEPTH: usize = 6;

/// Exports the outline in the annotated dialect.
///
/// Every node is preceded by its hierarchy annotation so the structure can be
/// rebuilt exactly by [`crate::import_markdown`]. Blank content lines are
/// dropped.
pub fn export_markdown(tree: &OutlineTree) -> String {
    let mut out = String::new();
    write_markdown(tree, tree.roots(), 0, &mut out);
    out
}

fn write_markdown(tree: &OutlineTree, ids: &[NodeId], level: usize, out: &mut String) {
    for id in ids {
        let Some(node) = tree.find_node(*id) else {
            continue;
        };
        out.push_str(&annotation(node.hierarchy_path(), node.level()));
        out.push('\n');

        let has_content = !node.content().trim().is_empty();
        if node.is_heading() {
            let hashes = "#".repeat((level + 1).min(MAX_HEADING_DEPTH));
            out.push_str(&format!("{hashes} {}\n\n", node.title()));
            if has_content {
                for line in content_lines(node.content()) {
                    out.push_str(line);
                    out.push('\n');
                }
                out.push('\n');
            }
        } else {
            let indent = "  ".repeat(level);
            out.push_str(&format!("{indent}- {}\n", node.title()));
            if has_content {
                for line in content_lines(node.content()) {
                    out.push_str(&format!("{indent}  {line}\n"));
                }
            }
        }

        write_markdown(tree, node.children(), level + 1, out);
    }
}

/// Exports the outline as indented plain text (`■` headings, `・` items).
pub fn export_plain_text(tree: &OutlineTree) -> String {
    let mut out = String::new();
    write_plain(tree, tree.roots(), 0, &mut out);
    out
}

fn write_plain(tree: &OutlineTree, ids: &[NodeId], level: usize, out: &mut String) {
    for id in ids {
        let Some(node) = tree.find_node(*id) else {
            continue;
        };
        let indent = "  ".repeat(level);
        let prefix = if node.is_heading() { "■ " } else { "・ " };
        out.push_str(&format!("{indent}{prefix}{}\n", node.title()));
        for line in content_lines(node.content()) {
            out.push_str(&format!("{indent}  {line}\n"));
        }
        write_plain(tree, node.children(), level + 1, out);
    }
}

fn content_lines(content: &str) -> impl Iterator<Item = &str> {
    content.split('\n').filter(|line| !line.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use outlinewriter_core::NodeEdit;

    fn sample() -> OutlineTree {
        let mut tree = OutlineTree::new();
        let chapter = tree.create_node_titled(None, None, "Chapter").unwrap();
        tree.update_node(
            chapter,
            &NodeEdit::default().heading(true).content("Opening\n\n  line two"),
        );
        let scene = tree.create_node_titled(Some(chapter), None, "Scene").unwrap();
        tree.update_node(scene, &NodeEdit::default().content("beat one\n\nbeat two"));
        tree.create_node_titled(None, None, "Loose").unwrap();
        tree
    }

    #[test]
    fn markdown_export_layout() {
        let expected = "\
<!-- hierarchy: 1 level: 0 -->
# Chapter

Opening
  line two

<!-- hierarchy: 1.1 level: 1 -->
  - Scene
    beat one
    beat two
<!-- hierarchy: 2 level: 0 -->
- Loose
";
        assert_eq!(export_markdown(&sample()), expected);
    }

    #[test]
    fn heading_depth_is_capped() {
        let mut tree = OutlineTree::new();
        let mut parent = None;
        for depth in 0..8 {
            let id = tree
                .create_node_titled(parent, None, &format!("H{depth}"))
                .unwrap();
            tree.update_node(id, &NodeEdit::default().heading(true));
            parent = Some(id);
        }
        let text = export_markdown(&tree);
        assert!(text.contains("\n###### H5\n"));
        assert!(text.contains("\n###### H7\n"));
        assert!(!text.contains("#######"));
    }

    #[test]
    fn plain_text_export_layout() {
        let expected = "\
■ Chapter
  Opening
    line two
  ・ Scene
    beat one
    beat two
・ Loose
";
        assert_eq!(export_plain_text(&sample()), expected);
    }

    #[test]
    fn empty_tree_exports_nothing() {
        assert_eq!(export_markdown(&OutlineTree::new()), "");
        assert_eq!(export_plain_text(&OutlineTree::new()), "");
    }
}
