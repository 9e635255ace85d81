//! Domain policy ("plug") configuration
//!
//! A plug scopes the engine to one subject-matter domain: which corpus
//! files it answers from and which guardrail knobs apply. Plugs are plain
//! JSON documents on disk in the deployed system.

use serde::{Deserialize, Serialize};

/// Per-domain policy driving retrieval scope and guardrail behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlugPolicy {
    /// Stable identifier, doubles as the corpus namespace
    pub plug_id: String,
    /// Human-readable name
    pub name: String,
    /// One-line description of the domain
    #[serde(default)]
    pub description: String,
    /// Corpus filenames this plug answers from
    #[serde(default)]
    pub corpus_files: Vec<String>,
    /// Topics the plug is scoped to; empty disables the topic check
    #[serde(default)]
    pub allowed_topics: Vec<String>,
    /// Terms that block a query or flag a response when present
    #[serde(default)]
    pub blocked_terms: Vec<String>,
    /// Whether responses must carry a disclaimer
    #[serde(default)]
    pub require_disclaimer: bool,
    /// Optional replacement for the generated system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

impl PlugPolicy {
    /// Create a minimal policy with the given id and name
    pub fn new(plug_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            plug_id: plug_id.into(),
            name: name.into(),
            description: String::new(),
            corpus_files: Vec::new(),
            allowed_topics: Vec::new(),
            blocked_terms: Vec::new(),
            require_disclaimer: false,
            system_prompt_override: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the corpus files
    pub fn with_corpus_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.corpus_files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Set the allowed topics
    pub fn with_allowed_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_topics = topics.into_iter().map(Into::into).collect();
        self
    }

    /// Set the blocked terms
    pub fn with_blocked_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocked_terms = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Require a disclaimer in responses
    pub fn with_required_disclaimer(mut self) -> Self {
        self.require_disclaimer = true;
        self
    }

    /// Override the system prompt
    pub fn with_system_prompt_override(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt_override = Some(prompt.into());
        self
    }

    /// Blocked terms found in `text`, case-insensitively
    pub fn blocked_terms_in(&self, text: &str) -> Vec<&str> {
        let text_lower = text.to_lowercase();
        self.blocked_terms
            .iter()
            .filter(|term| text_lower.contains(&term.to_lowercase()))
            .map(String::as_str)
            .collect()
    }
}
