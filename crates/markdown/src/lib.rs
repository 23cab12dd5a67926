//! Text codec for OutlineWriter outlines.
//!
//! Export always writes the annotated dialect, where every node is preceded by
//! a `<!-- hierarchy: PATH level: LEVEL -->` comment. Import first classifies
//! the input once, then either rebuilds the tree from those annotations or
//! infers it from heading depth and bullet indentation for plain Markdown.

mod annotated;
mod export;
mod grammar;
mod heuristic;

use std::fmt;

use outlinewriter_core::OutlineTree;
use thiserror::Error;
use tracing::debug;

pub use export::{export_markdown, export_plain_text};

/// Input dialect picked before parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    /// Every node carries a hierarchy annotation written by [`export_markdown`].
    Annotated,
    /// Ordinary Markdown; structure comes from `#` depth and bullet indentation.
    Heuristic,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Annotated => "annotated",
            Dialect::Heuristic => "heuristic",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the importers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkdownError {
    #[error("no outline items found in {dialect} markdown")]
    Empty { dialect: Dialect },
}

/// Result of a successful import.
#[derive(Debug, Clone)]
pub struct MarkdownImport {
    pub dialect: Dialect,
    pub tree: OutlineTree,
}

/// Returns [`Dialect::Annotated`] when any line is a hierarchy annotation.
pub fn detect_dialect(text: &str) -> Dialect {
    if text.lines().any(grammar::is_annotation) {
        Dialect::Annotated
    } else {
        Dialect::Heuristic
    }
}

/// Parses a Markdown document into a fresh tree.
///
/// Parsing is permissive: malformed lines are skipped. Only an input that
/// yields no nodes at all is reported as an error.
pub fn import_markdown(text: &str) -> Result<MarkdownImport, MarkdownError> {
    let dialect = detect_dialect(text);
    let tree = match dialect {
        Dialect::Annotated => annotated::parse(text),
        Dialect::Heuristic => heuristic::parse(text),
    };
    debug!(%dialect, nodes = tree.len(), "markdown imported");
    if tree.is_empty() {
        return Err(MarkdownError::Empty { dialect });
    }
    Ok(MarkdownImport { dialect, tree })
}
