//! Retrieval configuration types

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Coarse confidence bucket assigned to a retrieval score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// The query (or a strong phrase signal) was found verbatim
    Exact,
    /// Several overlapping signals without a verbatim phrase hit
    Fuzzy,
    /// Weak keyword-level overlap only
    Keyword,
}

/// Configuration for the lexical/structural retriever.
///
/// The weights and thresholds are empirical values carried over from the
/// system this engine replaces; they have no derivation and are exposed
/// here so deployments can tune them rather than trusting a "correct"
/// value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Bonus for the full query appearing verbatim in section content
    #[serde(default = "default_exact_phrase_weight")]
    pub exact_phrase_weight: f32,
    /// Bonus per title-cased query word (candidate proper noun) found in content
    #[serde(default = "default_proper_noun_weight")]
    pub proper_noun_weight: f32,
    /// Bonus per query term shared with the section title
    #[serde(default = "default_title_term_weight")]
    pub title_term_weight: f32,
    /// Bonus per non-stopword query term shared with the section content
    #[serde(default = "default_content_term_weight")]
    pub content_term_weight: f32,
    /// Bonus per query term found in the high-value domain term list
    #[serde(default = "default_high_value_term_weight")]
    pub high_value_term_weight: f32,
    /// Scores at or above this classify as `MatchType::Exact`
    #[serde(default = "default_exact_threshold")]
    pub exact_threshold: f32,
    /// Scores at or above this classify as `MatchType::Fuzzy`
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f32,
    /// Terms excluded from content-overlap scoring
    #[serde(default = "default_stopwords")]
    pub stopwords: HashSet<String>,
    /// Domain terms that boost a section when shared with the query
    #[serde(default = "default_high_value_terms")]
    pub high_value_terms: HashSet<String>,
}

fn default_exact_phrase_weight() -> f32 {
    10.0
}

fn default_proper_noun_weight() -> f32 {
    8.0
}

fn default_title_term_weight() -> f32 {
    3.0
}

fn default_content_term_weight() -> f32 {
    1.0
}

fn default_high_value_term_weight() -> f32 {
    2.0
}

fn default_exact_threshold() -> f32 {
    10.0
}

fn default_fuzzy_threshold() -> f32 {
    5.0
}

fn default_stopwords() -> HashSet<String> {
    [
        "is", "on", "the", "a", "an", "for", "in", "of", "to", "and", "or", "what", "are", "this",
        "that", "with",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_high_value_terms() -> HashSet<String> {
    [
        "ofac",
        "sdn",
        "sanctions",
        "screened",
        "screening",
        "aml",
        "compliance",
        "kyc",
        "pep",
        "designation",
        "blocked",
        "penalty",
        "penalties",
        "prohibited",
        "transaction",
        "mutual fund",
        "sip",
        "nav",
        "investment",
        "risk",
        "returns",
        "portfolio",
        "equity",
        "debt",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            exact_phrase_weight: default_exact_phrase_weight(),
            proper_noun_weight: default_proper_noun_weight(),
            title_term_weight: default_title_term_weight(),
            content_term_weight: default_content_term_weight(),
            high_value_term_weight: default_high_value_term_weight(),
            exact_threshold: default_exact_threshold(),
            fuzzy_threshold: default_fuzzy_threshold(),
            stopwords: default_stopwords(),
            high_value_terms: default_high_value_terms(),
        }
    }
}

impl RetrievalConfig {
    /// Create a configuration with the default weights
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the exact-phrase weight
    pub fn with_exact_phrase_weight(mut self, weight: f32) -> Self {
        self.exact_phrase_weight = weight;
        self
    }

    /// Set the proper-noun weight
    pub fn with_proper_noun_weight(mut self, weight: f32) -> Self {
        self.proper_noun_weight = weight;
        self
    }

    /// Set the title-term weight
    pub fn with_title_term_weight(mut self, weight: f32) -> Self {
        self.title_term_weight = weight;
        self
    }

    /// Set the content-term weight
    pub fn with_content_term_weight(mut self, weight: f32) -> Self {
        self.content_term_weight = weight;
        self
    }

    /// Set the high-value-term weight
    pub fn with_high_value_term_weight(mut self, weight: f32) -> Self {
        self.high_value_term_weight = weight;
        self
    }

    /// Replace the high-value domain term list
    pub fn with_high_value_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.high_value_terms = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Classify a score into its match-type bucket
    pub fn classify(&self, score: f32) -> MatchType {
        if score >= self.exact_threshold {
            MatchType::Exact
        } else if score >= self.fuzzy_threshold {
            MatchType::Fuzzy
        } else {
            MatchType::Keyword
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let config = RetrievalConfig::default();

        assert_eq!(config.exact_phrase_weight, 10.0);
        assert_eq!(config.proper_noun_weight, 8.0);
        assert_eq!(config.title_term_weight, 3.0);
        assert_eq!(config.content_term_weight, 1.0);
        assert_eq!(config.high_value_term_weight, 2.0);
    }

    #[test]
    fn test_classification_thresholds() {
        let config = RetrievalConfig::default();

        assert_eq!(config.classify(12.0), MatchType::Exact);
        assert_eq!(config.classify(10.0), MatchType::Exact);
        assert_eq!(config.classify(9.9), MatchType::Fuzzy);
        assert_eq!(config.classify(5.0), MatchType::Fuzzy);
        assert_eq!(config.classify(4.9), MatchType::Keyword);
        assert_eq!(config.classify(0.5), MatchType::Keyword);
    }

    #[test]
    fn test_stopwords_contain_common_fillers() {
        let config = RetrievalConfig::default();
        assert!(config.stopwords.contains("the"));
        assert!(config.stopwords.contains("what"));
        assert!(!config.stopwords.contains("load"));
    }

    #[test]
    fn test_builder_pattern() {
        let config = RetrievalConfig::new()
            .with_exact_phrase_weight(20.0)
            .with_high_value_terms(["kpa", "girder"]);

        assert_eq!(config.exact_phrase_weight, 20.0);
        assert!(config.high_value_terms.contains("girder"));
        assert!(!config.high_value_terms.contains("ofac"));
    }

    #[test]
    fn test_deserialization_fills_defaults() {
        let config: RetrievalConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.exact_threshold, 10.0);
        assert!(!config.stopwords.is_empty());
    }
}
