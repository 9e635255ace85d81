//! Citation verification against retrieved sections

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::entity::{Citation, CitationStatus};
use super::extractor::{CitationExtractor, RawCitation};
use crate::domain::corpus::Section;

static CLAIM_TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-Z]{4,}\b").expect("valid claim term regex"));

/// Configuration for citation matching.
///
/// The weights and status thresholds are empirical carry-overs with no
/// stated derivation; they are configuration, not constants to "fix".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Score for a filename containment match (either direction)
    #[serde(default = "default_filename_weight")]
    pub filename_weight: f32,
    /// Score for a partial (token-level) filename match
    #[serde(default = "default_filename_partial_weight")]
    pub filename_partial_weight: f32,
    /// Score for an exact page match
    #[serde(default = "default_page_weight")]
    pub page_weight: f32,
    /// Score for a section label containment match
    #[serde(default = "default_section_weight")]
    pub section_weight: f32,
    /// Maximum score contributed by claim-term grounding
    #[serde(default = "default_claim_grounding_weight")]
    pub claim_grounding_weight: f32,
    /// Scores at or above this are `Verified`
    #[serde(default = "default_verified_threshold")]
    pub verified_threshold: f32,
    /// Scores at or above this are `Partial`
    #[serde(default = "default_partial_threshold")]
    pub partial_threshold: f32,
    /// Characters of matched content carried as `source_text`
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
    /// Claim terms excluded from grounding
    #[serde(default = "default_claim_stopwords")]
    pub claim_stopwords: HashSet<String>,
}

fn default_filename_weight() -> f32 {
    0.3
}

fn default_filename_partial_weight() -> f32 {
    0.15
}

fn default_page_weight() -> f32 {
    0.3
}

fn default_section_weight() -> f32 {
    0.2
}

fn default_claim_grounding_weight() -> f32 {
    0.2
}

fn default_verified_threshold() -> f32 {
    0.7
}

fn default_partial_threshold() -> f32 {
    0.4
}

fn default_excerpt_chars() -> usize {
    200
}

fn default_claim_stopwords() -> HashSet<String> {
    [
        "this", "that", "with", "from", "have", "been", "will", "they", "their", "what", "which",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            filename_weight: default_filename_weight(),
            filename_partial_weight: default_filename_partial_weight(),
            page_weight: default_page_weight(),
            section_weight: default_section_weight(),
            claim_grounding_weight: default_claim_grounding_weight(),
            verified_threshold: default_verified_threshold(),
            partial_threshold: default_partial_threshold(),
            excerpt_chars: default_excerpt_chars(),
            claim_stopwords: default_claim_stopwords(),
        }
    }
}

impl VerifierConfig {
    /// Create a configuration with the default weights
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the status thresholds
    pub fn with_thresholds(mut self, verified: f32, partial: f32) -> Self {
        self.verified_threshold = verified.clamp(0.0, 1.0);
        self.partial_threshold = partial.clamp(0.0, 1.0);
        self
    }

    /// Classify a match score into a citation status
    pub fn classify(&self, score: f32) -> CitationStatus {
        if score >= self.verified_threshold {
            CitationStatus::Verified
        } else if score >= self.partial_threshold {
            CitationStatus::Partial
        } else {
            CitationStatus::Unverified
        }
    }
}

/// Extracts citation markers from generated text and matches each against
/// the sections retrieved for the same turn.
#[derive(Debug)]
pub struct CitationVerifier {
    config: VerifierConfig,
    extractor: CitationExtractor,
}

impl Default for CitationVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CitationVerifier {
    /// Create a verifier with default configuration and splitter
    pub fn new() -> Self {
        Self {
            config: VerifierConfig::default(),
            extractor: CitationExtractor::new(),
        }
    }

    /// Create a verifier with a custom configuration
    pub fn with_config(config: VerifierConfig) -> Self {
        Self {
            config,
            extractor: CitationExtractor::new(),
        }
    }

    /// Replace the marker extractor (e.g. to swap the sentence splitter)
    pub fn with_extractor(mut self, extractor: CitationExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Get the verifier configuration
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify every citation marker in `response` against `candidates`.
    ///
    /// Emits one `Citation` per marker occurrence. A marker with no
    /// plausible candidate still yields an `Unverified` citation with null
    /// page/section/node/source_text.
    pub fn verify(&self, response: &str, candidates: &[Section]) -> Vec<Citation> {
        self.extractor
            .extract(response)
            .into_iter()
            .map(|raw| self.verify_single(raw, candidates))
            .collect()
    }

    fn verify_single(&self, raw: RawCitation, candidates: &[Section]) -> Citation {
        let mut best_match: Option<&Section> = None;
        let mut best_score = 0.0_f32;

        for section in candidates {
            let score = self.match_score(&raw, section);
            if score > best_score {
                best_score = score;
                best_match = Some(section);
            }
        }

        let status = if best_match.is_some() {
            self.config.classify(best_score)
        } else {
            CitationStatus::Unverified
        };

        Citation {
            claim: raw.claim,
            source_file: raw.source_file,
            page: raw.page.or(best_match.map(|s| s.page)),
            section: raw.section.or_else(|| best_match.map(|s| s.title.clone())),
            node_id: best_match.map(|s| s.node_id.clone()),
            status,
            confidence: best_score.clamp(0.0, 1.0),
            source_text: best_match.map(|s| s.excerpt(self.config.excerpt_chars).to_string()),
        }
    }

    /// Score how plausibly `section` backs the raw citation.
    fn match_score(&self, raw: &RawCitation, section: &Section) -> f32 {
        let mut score = 0.0;

        let raw_file = raw.source_file.to_lowercase().replace(' ', "_");
        let section_file = section.filename.to_lowercase();
        if section_file.contains(&raw_file) || raw_file.contains(&section_file) {
            score += self.config.filename_weight;
        } else if raw_file
            .split('_')
            .any(|part| part.len() > 3 && section_file.contains(part))
        {
            score += self.config.filename_partial_weight;
        }

        if raw.page == Some(section.page) {
            score += self.config.page_weight;
        }

        if let Some(label) = &raw.section {
            let label_lower = label.to_lowercase();
            let title_lower = section.title.to_lowercase();
            if title_lower.contains(&label_lower) || label_lower.contains(&title_lower) {
                score += self.config.section_weight;
            }
        }

        if !raw.claim.is_empty() {
            let content_lower = section.content.to_lowercase();
            let claim_terms: HashSet<String> = CLAIM_TERM
                .find_iter(&raw.claim.to_lowercase())
                .map(|m| m.as_str().to_string())
                .filter(|term| !self.config.claim_stopwords.contains(term))
                .collect();

            if !claim_terms.is_empty() {
                let found = claim_terms
                    .iter()
                    .filter(|term| content_lower.contains(*term))
                    .count();
                score += self.config.claim_grounding_weight
                    * (found as f32 / claim_terms.len() as f32);
            }
        }

        score.min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loads_section() -> Section {
        Section::new(
            "LOADS.txt",
            "LOADS",
            2,
            "Live load is 2.4 kPa for offices.",
            "N0001",
        )
    }

    #[test]
    fn test_single_marker_yields_one_citation() {
        let verifier = CitationVerifier::new();
        let candidates = vec![Section::new("doc.txt", "T", 3, "Loads are heavy today.", "N0001")];

        let citations = verifier.verify("Loads are heavy. [Source: doc.txt, Page 3]", &candidates);

        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].source_file, "doc.txt");
        assert_eq!(citations[0].page, Some(3));
        assert!(citations[0].claim.contains("Loads are heavy"));
    }

    #[test]
    fn test_verified_scenario() {
        let verifier = CitationVerifier::new();
        let candidates = vec![loads_section()];

        let citations = verifier.verify(
            "Offices require 2.4 kPa. [Source: LOADS.txt, Page 2]",
            &candidates,
        );

        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].status, CitationStatus::Verified);
        assert!(citations[0].confidence >= 0.7);
        assert_eq!(citations[0].node_id.as_deref(), Some("N0001"));
    }

    #[test]
    fn test_wrong_page_degrades_to_partial() {
        let verifier = CitationVerifier::new();
        let candidates = vec![loads_section()];

        let citations = verifier.verify(
            "Offices require 2.4 kPa. [Source: LOADS.txt, Page 9]",
            &candidates,
        );

        assert_eq!(citations[0].status, CitationStatus::Partial);
    }

    #[test]
    fn test_no_candidates_yields_unverified_with_null_fields() {
        let verifier = CitationVerifier::new();

        let citations = verifier.verify("Claim text. [Source: ghost.txt]", &[]);

        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].status, CitationStatus::Unverified);
        assert_eq!(citations[0].confidence, 0.0);
        assert_eq!(citations[0].page, None);
        assert_eq!(citations[0].section, None);
        assert_eq!(citations[0].node_id, None);
        assert_eq!(citations[0].source_text, None);
    }

    #[test]
    fn test_unrelated_candidate_yields_unverified() {
        let verifier = CitationVerifier::new();
        let candidates = vec![Section::new(
            "other.txt",
            "OTHER",
            5,
            "Entirely different subject matter.",
            "N0001",
        )];

        let citations = verifier.verify("Claim text. [Source: ghost.txt, Page 1]", &candidates);

        assert_eq!(citations[0].status, CitationStatus::Unverified);
    }

    #[test]
    fn test_page_falls_back_to_best_match() {
        let verifier = CitationVerifier::new();
        let candidates = vec![loads_section()];

        let citations = verifier.verify(
            "Offices require 2.4 kPa live load capacity. [Source: LOADS.txt]",
            &candidates,
        );

        assert_eq!(citations[0].page, Some(2));
        assert_eq!(citations[0].section.as_deref(), Some("LOADS"));
    }

    #[test]
    fn test_section_label_match_adds_score() {
        let verifier = CitationVerifier::new();
        let candidates = vec![loads_section()];

        let with_label = verifier.verify(
            "Offices require 2.4 kPa. [Source: LOADS.txt, Page 2, Section LOADS]",
            &candidates,
        );
        let without_label = verifier.verify(
            "Offices require 2.4 kPa. [Source: LOADS.txt, Page 2]",
            &candidates,
        );

        assert!(with_label[0].confidence > without_label[0].confidence);
    }

    #[test]
    fn test_confidence_is_clamped_to_one() {
        let verifier = CitationVerifier::new();
        let candidates = vec![Section::new(
            "loads.txt",
            "LOADS",
            2,
            "Live load office requirements are specified here.",
            "N0001",
        )];

        let citations = verifier.verify(
            "Live load office requirements specified. [Source: loads.txt, Page 2, Section LOADS]",
            &candidates,
        );

        assert!(citations[0].confidence <= 1.0);
    }

    #[test]
    fn test_repeated_markers_are_not_deduplicated() {
        let verifier = CitationVerifier::new();
        let candidates = vec![loads_section()];

        let citations = verifier.verify(
            "One. [Source: LOADS.txt, Page 2] Two. [Source: LOADS.txt, Page 2]",
            &candidates,
        );

        assert_eq!(citations.len(), 2);
    }

    #[test]
    fn test_best_candidate_wins() {
        let verifier = CitationVerifier::new();
        let candidates = vec![
            Section::new("LOADS.txt", "LOADS", 9, "Wrong page content.", "N0009"),
            loads_section(),
        ];

        let citations = verifier.verify(
            "Offices require 2.4 kPa. [Source: LOADS.txt, Page 2]",
            &candidates,
        );

        assert_eq!(citations[0].node_id.as_deref(), Some("N0001"));
        assert_eq!(citations[0].page, Some(2));
    }
}
