//! Deterministic lexical/structural retrieval over parsed sections

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::config::{MatchType, RetrievalConfig};
use crate::domain::corpus::Section;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid word regex"));

static TITLE_CASED_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+\b").expect("valid title-cased word regex"));

/// A section returned from retrieval with its relevance score.
///
/// Produced fresh per retrieval call; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedSection {
    /// The retrieved section
    pub section: Section,
    /// Accumulated lexical relevance score
    pub score: f32,
    /// Confidence bucket derived from the score
    pub match_type: MatchType,
}

impl RankedSection {
    /// Create a new ranked section
    pub fn new(section: Section, score: f32, match_type: MatchType) -> Self {
        Self {
            section,
            score,
            match_type,
        }
    }
}

/// Lexical retriever that ranks sections against a query using exact-phrase,
/// proper-noun, title-overlap, keyword-overlap and domain-term signals.
///
/// Scoring is deterministic and additive: a query term literally present in
/// a section's content can only raise or hold that section's score.
#[derive(Debug, Clone, Default)]
pub struct Retriever {
    config: RetrievalConfig,
}

impl Retriever {
    /// Create a retriever with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a retriever with a custom configuration
    pub fn with_config(config: RetrievalConfig) -> Self {
        Self { config }
    }

    /// Get the retrieval configuration
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Rank `sections` against `query` and return at most `top_k` results.
    ///
    /// Zero-score sections are excluded. Results are sorted by descending
    /// score with a stable sort, so equal scores keep their parse order.
    pub fn retrieve(&self, query: &str, sections: &[Section], top_k: usize) -> Vec<RankedSection> {
        let query_lower = query.to_lowercase();
        let query_terms = tokenize(&query_lower);
        let query_title_cased = title_case(&query_lower);

        let mut results: Vec<RankedSection> = sections
            .iter()
            .filter_map(|section| {
                let score =
                    self.score_section(section, &query_lower, &query_title_cased, &query_terms);
                if score > 0.0 {
                    Some(RankedSection::new(
                        section.clone(),
                        score,
                        self.config.classify(score),
                    ))
                } else {
                    None
                }
            })
            .collect();

        // Stable sort keeps original parse order for equal scores.
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);
        results
    }

    fn score_section(
        &self,
        section: &Section,
        query_lower: &str,
        query_title_cased: &str,
        query_terms: &HashSet<String>,
    ) -> f32 {
        let content_lower = section.content.to_lowercase();
        let title_lower = section.title.to_lowercase();
        let mut score = 0.0;

        // Exact phrase match is the strongest signal.
        if !query_lower.is_empty() && content_lower.contains(query_lower) {
            score += self.config.exact_phrase_weight;
        }

        // The query is title-cased first, so every word is a candidate
        // proper noun and a lowercase-typed name still earns the boost.
        for word in TITLE_CASED_WORD.find_iter(query_title_cased) {
            if content_lower.contains(&word.as_str().to_lowercase()) {
                score += self.config.proper_noun_weight;
            }
        }

        let title_terms = tokenize(&title_lower);
        let title_overlap = query_terms.intersection(&title_terms).count();
        score += title_overlap as f32 * self.config.title_term_weight;

        let content_terms = tokenize(&content_lower);
        let keyword_overlap = query_terms
            .intersection(&content_terms)
            .filter(|term| !self.config.stopwords.contains(*term))
            .count();
        score += keyword_overlap as f32 * self.config.content_term_weight;

        let high_value_overlap = query_terms
            .iter()
            .filter(|term| self.config.high_value_terms.contains(*term))
            .count();
        score += high_value_overlap as f32 * self.config.high_value_term_weight;

        score
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}
