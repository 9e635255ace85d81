//! In-memory parsed corpus for one plug

use tracing::debug;

use crate::domain::corpus::{Section, StructuralParser};
use crate::domain::retrieval::{RankedSection, Retriever};

/// Parsed sections of every document loaded for one plug.
///
/// Documents keep their load order so retrieval ties resolve the same way
/// on every run. Loading a filename twice replaces its sections.
#[derive(Debug, Default)]
pub struct CorpusStore {
    parser: StructuralParser,
    retriever: Retriever,
    documents: Vec<(String, Vec<Section>)>,
}

impl CorpusStore {
    /// Create an empty store with default parsing and retrieval behavior
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with a custom retriever
    pub fn with_retriever(retriever: Retriever) -> Self {
        Self {
            parser: StructuralParser::new(),
            retriever,
            documents: Vec::new(),
        }
    }

    /// Parse `text` and store its sections under `filename`
    pub fn load_document(&mut self, filename: &str, text: &str) -> usize {
        let sections = self.parser.parse(filename, text);
        let count = sections.len();
        debug!(filename, sections = count, "parsed corpus document");

        if let Some(existing) = self
            .documents
            .iter_mut()
            .find(|(name, _)| name == filename)
        {
            existing.1 = sections;
        } else {
            self.documents.push((filename.to_string(), sections));
        }
        count
    }

    /// Load several documents; returns the total section count
    pub fn load_corpus<'a, I>(&mut self, documents: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        documents
            .into_iter()
            .map(|(filename, text)| self.load_document(filename, text))
            .sum()
    }

    /// All sections across all documents, in document load order
    pub fn all_sections(&self) -> Vec<Section> {
        self.documents
            .iter()
            .flat_map(|(_, sections)| sections.iter().cloned())
            .collect()
    }

    /// Sections of one document, if loaded
    pub fn document_sections(&self, filename: &str) -> Option<&[Section]> {
        self.documents
            .iter()
            .find(|(name, _)| name == filename)
            .map(|(_, sections)| sections.as_slice())
    }

    /// Filenames in load order
    pub fn filenames(&self) -> Vec<&str> {
        self.documents.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Total number of stored sections
    pub fn section_count(&self) -> usize {
        self.documents.iter().map(|(_, sections)| sections.len()).sum()
    }

    /// Rank all stored sections against `query`
    pub fn retrieve(&self, query: &str, top_k: usize) -> Vec<RankedSection> {
        self.retriever.retrieve(query, &self.all_sections(), top_k)
    }
}
