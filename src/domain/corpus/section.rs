//! Retrievable document section entity

use serde::{Deserialize, Serialize};

/// A titled, paged excerpt of a source document - the unit of retrieval.
///
/// Sections are owned by the corpus store for their filename and are
/// immutable after parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Source document filename (the section's namespace)
    pub filename: String,
    /// Section title; sub-entries carry `"<parent> > <entry>"` titles
    pub title: String,
    /// Page the section starts on (1-based)
    pub page: u32,
    /// Aggregated section text, whitespace-trimmed
    pub content: String,
    /// Identifier unique within the filename, assigned in parse order
    pub node_id: String,
}

impl Section {
    /// Create a new section
    pub fn new(
        filename: impl Into<String>,
        title: impl Into<String>,
        page: u32,
        content: impl Into<String>,
        node_id: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            title: title.into(),
            page: page.max(1),
            content: content.into(),
            node_id: node_id.into(),
        }
    }

    /// Externally visible identifier: `filename:node_id`
    pub fn qualified_id(&self) -> String {
        format!("{}:{}", self.filename, self.node_id)
    }

    /// First `max_chars` characters of the content, for excerpts
    pub fn excerpt(&self, max_chars: usize) -> &str {
        match self.content.char_indices().nth(max_chars) {
            Some((idx, _)) => &self.content[..idx],
            None => &self.content,
        }
    }
}
