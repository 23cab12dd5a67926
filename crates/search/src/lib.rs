//! Outline search used by the OutlineWriter CLI and editor front ends.
//!
//! A query is a plain substring matched case-insensitively against every
//! node's title and content. Results are returned fully materialized, in
//! document (pre-order) order, so callers can render or count them directly.

use outlinewriter_core::{Node, OutlineTree};
use regex::{Regex, RegexBuilder};
use thiserror::Error;
use tracing::debug;

/// Error conditions raised when compiling a query.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("search query cannot be empty")]
    EmptyQuery,
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

/// Which fields of a node matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchHit<'a> {
    pub node: &'a Node,
    pub in_title: bool,
    pub in_content: bool,
}

/// Compiled, case-insensitive substring query.
#[derive(Clone, Debug)]
pub struct SearchQuery {
    raw: String,
    regex: Regex,
}

impl SearchQuery {
    /// Compiles `query`; whitespace-only input is rejected.
    ///
    /// The query itself is not trimmed, so `" a"` only matches text containing
    /// a space followed by `a`.
    pub fn new(query: impl Into<String>) -> Result<Self, SearchError> {
        let raw = query.into();
        if raw.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let regex = RegexBuilder::new(&regex::escape(&raw))
            .case_insensitive(true)
            .build()
            .map_err(|err| SearchError::InvalidQuery(err.to_string()))?;
        Ok(Self { raw, regex })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Returns a hit when the title or content of `node` contains the query.
    pub fn matches<'a>(&self, node: &'a Node) -> Option<SearchHit<'a>> {
        let in_title = self.is_match(node.title());
        let in_content = self.is_match(node.content());
        (in_title || in_content).then_some(SearchHit {
            node,
            in_title,
            in_content,
        })
    }

    /// All hits in document order.
    pub fn find_all<'a>(&self, tree: &'a OutlineTree) -> Vec<SearchHit<'a>> {
        let hits: Vec<SearchHit<'a>> = tree.iter().filter_map(|node| self.matches(node)).collect();
        debug!(query = %self.raw, hits = hits.len(), "outline searched");
        hits
    }
}

/// Nodes whose title or content contains `query`, ignoring case, in document
/// order. An empty or whitespace-only query yields no results.
pub fn search<'a>(tree: &'a OutlineTree, query: &str) -> Vec<&'a Node> {
    search_hits(tree, query)
        .into_iter()
        .map(|hit| hit.node)
        .collect()
}

/// Like [`search`], keeping track of which fields matched.
pub fn search_hits<'a>(tree: &'a OutlineTree, query: &str) -> Vec<SearchHit<'a>> {
    match SearchQuery::new(query) {
        Ok(query) => query.find_all(tree),
        Err(err) => {
            debug!(%err, "search skipped");
            Vec::new()
        }
    }
}
